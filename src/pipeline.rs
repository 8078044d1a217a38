//! Orchestrator: sequences load, register, normalize, split, derive and
//! validate, persisting each step's output so any step can be rerun on its
//! own from the artifacts of the step before it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;

use crate::{
    artifacts::{
        self, CLEAN_MATCHES_FILE, CLEAN_PLAYERS_FILE, CLEAN_STANDINGS_FILE, LOAD_REPORT_FILE,
        MATCHES_ADVANCED_FILE, MATCHES_BASE_FILE, Manifest, ManifestStatus,
        NORMALIZED_MATCHES_FILE, NORMALIZED_PLAYER_STATS_FILE, NORMALIZED_STANDINGS_FILE,
        PLAYER_STATS_FILE, PLAYERS_FILE, REPORT_FILE, SPLIT_MATCHES_ADVANCED_FILE,
        SPLIT_MATCHES_BASE_FILE, STANDINGS_FILE, TEAMS_FILE,
    },
    derive,
    loader::{self, LoadOptions, LoadReport, SourceLayout, SourceTally},
    model::{CleanSources, Dataset, MatchAdvanced, MatchBase, NormalizedFacts},
    normalize, registry,
    registry::EntityRegistry,
    split, table,
    validate::{self, ValidationConfig, ValidationReport},
};

pub const STEP_NAMES: [&str; 6] = ["load", "register", "normalize", "split", "derive", "validate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Step(usize),
    Validated,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Pending => f.write_str("PENDING"),
            PipelineState::Step(step) => write!(f, "STEP_{step}"),
            PipelineState::Validated => f.write_str("VALIDATED"),
            PipelineState::Failed => f.write_str("FAILED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub raw_dir: PathBuf,
    pub out_dir: PathBuf,
    pub load: LoadOptions,
    pub validation: ValidationConfig,
}

impl PipelineOptions {
    fn intermediate(&self, file: &str) -> PathBuf {
        artifacts::intermediate_dir(&self.out_dir).join(file)
    }

    fn output(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub step: &'static str,
    pub rows: usize,
    pub detail: String,
}

pub fn render_summary(summaries: &[StepSummary], state: PipelineState) -> String {
    let headers = ["step", "rows", "detail"].map(str::to_string).to_vec();
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.step.to_string(),
                summary.rows.to_string(),
                summary.detail.clone(),
            ]
        })
        .collect::<Vec<_>>();
    format!("{}status: {state}\n", table::render_table(&headers, &rows))
}

#[derive(Serialize)]
struct LoadReportFile<'a> {
    sources: &'a [SourceTally],
    excluded_rows: usize,
    duplicate_rows: usize,
    exclusions: Vec<String>,
}

fn persist_load(options: &PipelineOptions, sources: &CleanSources, report: &LoadReport) -> Result<()> {
    artifacts::write_table(&options.intermediate(CLEAN_MATCHES_FILE), &sources.matches)?;
    artifacts::write_table(&options.intermediate(CLEAN_STANDINGS_FILE), &sources.standings)?;
    artifacts::write_table(&options.intermediate(CLEAN_PLAYERS_FILE), &sources.players)?;
    let file = LoadReportFile {
        sources: &report.tallies,
        excluded_rows: report.total_excluded(),
        duplicate_rows: report.total_duplicates(),
        exclusions: report.exclusions.iter().map(ToString::to_string).collect(),
    };
    artifacts::write_json(&options.intermediate(LOAD_REPORT_FILE), &file)
}

fn read_clean_sources(options: &PipelineOptions) -> Result<CleanSources> {
    Ok(CleanSources {
        matches: artifacts::read_table(&options.intermediate(CLEAN_MATCHES_FILE))?,
        standings: artifacts::read_table(&options.intermediate(CLEAN_STANDINGS_FILE))?,
        players: artifacts::read_table(&options.intermediate(CLEAN_PLAYERS_FILE))?,
    })
}

fn persist_registry(options: &PipelineOptions, registry: &EntityRegistry) -> Result<()> {
    artifacts::write_table(&options.output(TEAMS_FILE), registry.teams())?;
    artifacts::write_table(&options.output(PLAYERS_FILE), registry.players())?;
    Ok(())
}

fn read_registry(options: &PipelineOptions) -> Result<EntityRegistry> {
    let teams = artifacts::read_table(&options.output(TEAMS_FILE))?;
    let players = artifacts::read_table(&options.output(PLAYERS_FILE))?;
    Ok(EntityRegistry::from_tables(teams, players)?)
}

fn persist_normalized(options: &PipelineOptions, facts: &NormalizedFacts) -> Result<()> {
    artifacts::write_table(&options.intermediate(NORMALIZED_MATCHES_FILE), &facts.matches)?;
    artifacts::write_table(
        &options.intermediate(NORMALIZED_PLAYER_STATS_FILE),
        &facts.player_stats,
    )?;
    artifacts::write_table(&options.intermediate(NORMALIZED_STANDINGS_FILE), &facts.standings)?;
    Ok(())
}

fn persist_split(options: &PipelineOptions, base: &[MatchBase], advanced: &[MatchAdvanced]) -> Result<()> {
    artifacts::write_table(&options.intermediate(SPLIT_MATCHES_BASE_FILE), base)?;
    artifacts::write_table(&options.intermediate(SPLIT_MATCHES_ADVANCED_FILE), advanced)?;
    Ok(())
}

fn persist_dataset(options: &PipelineOptions, dataset: &Dataset) -> Result<()> {
    artifacts::write_table(&options.output(TEAMS_FILE), &dataset.teams)?;
    artifacts::write_table(&options.output(PLAYERS_FILE), &dataset.players)?;
    artifacts::write_table(&options.output(MATCHES_BASE_FILE), &dataset.matches_base)?;
    artifacts::write_table(&options.output(MATCHES_ADVANCED_FILE), &dataset.matches_advanced)?;
    artifacts::write_table(&options.output(PLAYER_STATS_FILE), &dataset.player_stats)?;
    artifacts::write_table(&options.output(STANDINGS_FILE), &dataset.standings)?;
    Manifest::build(&options.out_dir, ManifestStatus::Unvalidated)?.save(&options.out_dir)
}

/// Reads the six final tables back from the output directory.
pub fn read_dataset(out_dir: &Path) -> Result<Dataset> {
    Ok(Dataset {
        teams: artifacts::read_table(&out_dir.join(TEAMS_FILE))?,
        players: artifacts::read_table(&out_dir.join(PLAYERS_FILE))?,
        matches_base: artifacts::read_table(&out_dir.join(MATCHES_BASE_FILE))?,
        matches_advanced: artifacts::read_table(&out_dir.join(MATCHES_ADVANCED_FILE))?,
        player_stats: artifacts::read_table(&out_dir.join(PLAYER_STATS_FILE))?,
        standings: artifacts::read_table(&out_dir.join(STANDINGS_FILE))?,
    })
}

fn persist_validation(options: &PipelineOptions, report: &ValidationReport) -> Result<()> {
    artifacts::write_json(&options.output(REPORT_FILE), report)?;
    let status = if report.passed() {
        ManifestStatus::Validated
    } else {
        ManifestStatus::Unvalidated
    };
    Manifest::build(&options.out_dir, status)?.save(&options.out_dir)
}

fn load_step(options: &PipelineOptions) -> Result<(CleanSources, StepSummary)> {
    let layout = SourceLayout::from_root(&options.raw_dir);
    let (sources, report) = loader::load_sources(&layout, &options.load)?;
    Manifest::revoke(&options.out_dir)?;
    persist_load(options, &sources, &report)?;
    let summary = StepSummary {
        step: STEP_NAMES[0],
        rows: sources.matches.len() + sources.standings.len() + sources.players.len(),
        detail: format!(
            "{} match(es), {} standing(s), {} player(s); {} excluded, {} duplicate(s)",
            sources.matches.len(),
            sources.standings.len(),
            sources.players.len(),
            report.total_excluded(),
            report.total_duplicates()
        ),
    };
    Ok((sources, summary))
}

fn register_step(options: &PipelineOptions, sources: &CleanSources) -> Result<(EntityRegistry, StepSummary)> {
    let mut registry = EntityRegistry::new();
    registry.register_teams(&registry::team_candidates(sources))?;
    registry.register_players(&registry::player_candidates(sources))?;
    Manifest::revoke(&options.out_dir)?;
    persist_registry(options, &registry)?;
    let summary = StepSummary {
        step: STEP_NAMES[1],
        rows: registry.teams().len() + registry.players().len(),
        detail: format!(
            "{} team(s), {} player(s)",
            registry.teams().len(),
            registry.players().len()
        ),
    };
    Ok((registry, summary))
}

fn normalize_step(
    options: &PipelineOptions,
    sources: &CleanSources,
    registry: &EntityRegistry,
) -> Result<(NormalizedFacts, StepSummary)> {
    let facts = normalize::normalize_all(sources, registry)?;
    Manifest::revoke(&options.out_dir)?;
    persist_normalized(options, &facts)?;
    let summary = StepSummary {
        step: STEP_NAMES[2],
        rows: facts.matches.len() + facts.player_stats.len() + facts.standings.len(),
        detail: format!(
            "{} match(es), {} player-season(s), {} standing(s)",
            facts.matches.len(),
            facts.player_stats.len(),
            facts.standings.len()
        ),
    };
    Ok((facts, summary))
}

fn split_step(
    options: &PipelineOptions,
    facts: &NormalizedFacts,
) -> Result<(Vec<MatchBase>, Vec<MatchAdvanced>, StepSummary)> {
    let (base, advanced) = split::split_matches(&facts.matches);
    Manifest::revoke(&options.out_dir)?;
    persist_split(options, &base, &advanced)?;
    let summary = StepSummary {
        step: STEP_NAMES[3],
        rows: base.len(),
        detail: format!("{} base, {} advanced", base.len(), advanced.len()),
    };
    Ok((base, advanced, summary))
}

fn derive_step(options: &PipelineOptions, mut dataset: Dataset) -> Result<(Dataset, StepSummary)> {
    derive::derive_all(&mut dataset);
    Manifest::revoke(&options.out_dir)?;
    persist_dataset(options, &dataset)?;
    let summary = StepSummary {
        step: STEP_NAMES[4],
        rows: dataset.matches_base.len()
            + dataset.matches_advanced.len()
            + dataset.player_stats.len()
            + dataset.standings.len(),
        detail: format!("tables written to {}", options.out_dir.display()),
    };
    Ok((dataset, summary))
}

fn validate_step(options: &PipelineOptions, dataset: &Dataset) -> Result<(ValidationReport, StepSummary)> {
    let report = validate::validate(dataset, &options.validation);
    persist_validation(options, &report)?;
    let summary = StepSummary {
        step: STEP_NAMES[5],
        rows: report.total_checks,
        detail: format!(
            "{} of {} check(s) failed",
            report.failed_checks, report.total_checks
        ),
    };
    Ok((report, summary))
}

/// One pipeline run. The state only moves forward; a failed run is not
/// resumed in place.
#[derive(Debug)]
pub struct Pipeline {
    options: PipelineOptions,
    state: PipelineState,
    summaries: Vec<StepSummary>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            state: PipelineState::Pending,
            summaries: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn enter(&mut self, step: usize) {
        self.state = PipelineState::Step(step);
        info!("Step {step}/{}: {}", STEP_NAMES.len(), STEP_NAMES[step - 1]);
    }

    /// Runs every step in order. Returns the validation report; the caller
    /// decides how to surface a failed report. Fatal errors from earlier
    /// steps are returned as errors with the state set to `Failed`.
    pub fn run_all(&mut self) -> Result<ValidationReport> {
        match self.run_steps() {
            Ok(report) => {
                self.state = if report.passed() {
                    PipelineState::Validated
                } else {
                    PipelineState::Failed
                };
                Ok(report)
            }
            Err(err) => {
                error!("Pipeline stopped in {}", self.state);
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    fn run_steps(&mut self) -> Result<ValidationReport> {
        self.enter(1);
        let (sources, summary) = load_step(&self.options)?;
        self.summaries.push(summary);

        self.enter(2);
        let (registry, summary) = register_step(&self.options, &sources)?;
        self.summaries.push(summary);

        self.enter(3);
        let (facts, summary) = normalize_step(&self.options, &sources, &registry)?;
        self.summaries.push(summary);

        self.enter(4);
        let (matches_base, matches_advanced, summary) = split_step(&self.options, &facts)?;
        self.summaries.push(summary);

        self.enter(5);
        let dataset = Dataset {
            teams: registry.teams().to_vec(),
            players: registry.players().to_vec(),
            matches_base,
            matches_advanced,
            player_stats: facts.player_stats,
            standings: facts.standings,
        };
        let (dataset, summary) = derive_step(&self.options, dataset)?;
        self.summaries.push(summary);

        self.enter(6);
        let (report, summary) = validate_step(&self.options, &dataset)?;
        self.summaries.push(summary);
        Ok(report)
    }

    pub fn render_summary(&self) -> String {
        render_summary(&self.summaries, self.state)
    }
}

/// Step 1 on its own: raw files to intermediate clean tables.
pub fn run_load(options: &PipelineOptions) -> Result<StepSummary> {
    load_step(options).map(|(_, summary)| summary)
}

/// Step 2 on its own: clean tables to the reference tables.
pub fn run_register(options: &PipelineOptions) -> Result<StepSummary> {
    let sources = read_clean_sources(options).context("Loading clean tables for registration")?;
    register_step(options, &sources).map(|(_, summary)| summary)
}

/// Step 3 on its own. The registry is rebuilt from the reference tables.
pub fn run_normalize(options: &PipelineOptions) -> Result<StepSummary> {
    let sources = read_clean_sources(options).context("Loading clean tables for normalization")?;
    let registry = read_registry(options).context("Rebuilding registry from reference tables")?;
    normalize_step(options, &sources, &registry).map(|(_, summary)| summary)
}

pub fn run_split(options: &PipelineOptions) -> Result<StepSummary> {
    let facts = NormalizedFacts {
        matches: artifacts::read_table(&options.intermediate(NORMALIZED_MATCHES_FILE))?,
        ..NormalizedFacts::default()
    };
    split_step(options, &facts).map(|(_, _, summary)| summary)
}

pub fn run_derive(options: &PipelineOptions) -> Result<StepSummary> {
    let registry = read_registry(options).context("Rebuilding registry from reference tables")?;
    let dataset = Dataset {
        teams: registry.teams().to_vec(),
        players: registry.players().to_vec(),
        matches_base: artifacts::read_table(&options.intermediate(SPLIT_MATCHES_BASE_FILE))?,
        matches_advanced: artifacts::read_table(
            &options.intermediate(SPLIT_MATCHES_ADVANCED_FILE),
        )?,
        player_stats: artifacts::read_table(&options.intermediate(NORMALIZED_PLAYER_STATS_FILE))?,
        standings: artifacts::read_table(&options.intermediate(NORMALIZED_STANDINGS_FILE))?,
    };
    derive_step(options, dataset).map(|(_, summary)| summary)
}

/// Step 6 on its own against the final tables already on disk.
pub fn run_validate(options: &PipelineOptions) -> Result<(ValidationReport, StepSummary)> {
    let dataset = read_dataset(&options.out_dir).context("Loading final tables for validation")?;
    validate_step(options, &dataset)
}
