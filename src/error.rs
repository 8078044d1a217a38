//! Typed failure kinds raised by the normalization engine.
//!
//! Only [`PipelineError::MalformedInput`] is recoverable: the loader records it
//! against the offending row and keeps going. Identity and reference errors
//! signal an internal consistency bug and abort the run. Validation failures
//! are raised once, after every check has been evaluated.

use thiserror::Error;

/// Entity kinds owned by the [`crate::registry::EntityRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Team,
    Player,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Team => f.write_str("team"),
            EntityKind::Player => f.write_str("player"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed input in {source_name} row {row}: field '{field}' {reason}")]
    MalformedInput {
        source_name: String,
        row: usize,
        field: String,
        reason: String,
    },

    #[error("{kind} '{name}' would be assigned more than one id ({detail})")]
    DuplicateIdentity {
        kind: EntityKind,
        name: String,
        detail: String,
    },

    #[error("{kind} '{name}' is referenced by {referenced_by} but missing from the registry")]
    UnresolvedReference {
        kind: EntityKind,
        name: String,
        referenced_by: String,
    },

    #[error("{kind} identities are already registered for this run")]
    RegistryAlreadyPopulated { kind: EntityKind },

    #[error("persisted {kind} table is inconsistent: {detail}")]
    InconsistentRegistry { kind: EntityKind, detail: String },

    #[error("validation failed: {failed} of {total} check(s) did not pass")]
    ValidationFailure { failed: usize, total: usize },
}

impl PipelineError {
    pub fn malformed(
        source_name: &str,
        row: usize,
        field: &str,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::MalformedInput {
            source_name: source_name.to_string(),
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_names_source_row_and_field() {
        let malformed = PipelineError::malformed("E0.csv", 4, "Date", "is not a date");
        assert_eq!(
            malformed.to_string(),
            "malformed input in E0.csv row 4: field 'Date' is not a date"
        );
    }

    #[test]
    fn messages_name_the_offending_entity() {
        let err = PipelineError::DuplicateIdentity {
            kind: EntityKind::Player,
            name: "Rodri".into(),
            detail: "listed for Spain and Manchester City".into(),
        };
        let message = err.to_string();
        assert!(message.contains("player 'Rodri'"));
        assert!(message.contains("Spain"));
    }
}
