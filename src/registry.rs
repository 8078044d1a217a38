//! Entity registry: the only place team and player ids are assigned.
//!
//! Ids are dense from 1. Teams are ordered league clubs first, then national
//! teams, each group by byte order of the canonical name; players are ordered
//! by byte order of their canonical name. Each kind is registered exactly once
//! per registry, after which the registry is read-only.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::{
    error::{EntityKind, PipelineError},
    loader::TOURNAMENT_COMPETITION,
    model::{CleanSources, CompetitionType, Player, PlayerId, SourceKind, Team, TeamId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TeamCandidate {
    pub name: String,
    pub competition_type: CompetitionType,
    pub competition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCandidate {
    pub name: String,
    pub team: String,
    pub position: Option<String>,
    pub age: Option<f64>,
}

/// Every team mention across the loaded sources, in source order. League
/// match participants are clubs; tournament participants, standings teams and
/// player teams are national teams.
pub fn team_candidates(sources: &CleanSources) -> Vec<TeamCandidate> {
    let mut candidates = Vec::new();
    for game in &sources.matches {
        let competition_type = match game.source_kind {
            SourceKind::League => CompetitionType::League,
            SourceKind::Tournament => CompetitionType::International,
        };
        for name in [&game.home_team, &game.away_team] {
            candidates.push(TeamCandidate {
                name: name.clone(),
                competition_type,
                competition: game.competition_name.clone(),
            });
        }
    }
    let tournament_team = |name: &String| TeamCandidate {
        name: name.clone(),
        competition_type: CompetitionType::International,
        competition: TOURNAMENT_COMPETITION.to_string(),
    };
    candidates.extend(sources.standings.iter().map(|row| tournament_team(&row.team)));
    candidates.extend(sources.players.iter().map(|row| tournament_team(&row.team)));
    candidates
}

pub fn player_candidates(sources: &CleanSources) -> Vec<PlayerCandidate> {
    sources
        .players
        .iter()
        .map(|row| PlayerCandidate {
            name: row.player.clone(),
            team: row.team.clone(),
            position: row.position.clone(),
            age: row.age,
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    teams: Vec<Team>,
    players: Vec<Player>,
    team_ids: BTreeMap<String, TeamId>,
    player_ids: BTreeMap<String, PlayerId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted reference tables, rechecking that
    /// ids are dense, names are unique and every player's team exists.
    pub fn from_tables(teams: Vec<Team>, players: Vec<Player>) -> Result<Self, PipelineError> {
        let mut team_ids = BTreeMap::new();
        for (idx, team) in teams.iter().enumerate() {
            let expected = idx as TeamId + 1;
            if team.team_id != expected {
                return Err(PipelineError::InconsistentRegistry {
                    kind: EntityKind::Team,
                    detail: format!("expected team_id {expected}, found {}", team.team_id),
                });
            }
            if team_ids.insert(team.team_name.clone(), team.team_id).is_some() {
                return Err(PipelineError::InconsistentRegistry {
                    kind: EntityKind::Team,
                    detail: format!("team name '{}' appears twice", team.team_name),
                });
            }
        }
        let mut player_ids = BTreeMap::new();
        for (idx, player) in players.iter().enumerate() {
            let expected = idx as PlayerId + 1;
            if player.player_id != expected {
                return Err(PipelineError::InconsistentRegistry {
                    kind: EntityKind::Player,
                    detail: format!("expected player_id {expected}, found {}", player.player_id),
                });
            }
            if player.team_id == 0 || player.team_id as usize > teams.len() {
                return Err(PipelineError::InconsistentRegistry {
                    kind: EntityKind::Player,
                    detail: format!(
                        "player '{}' references unknown team_id {}",
                        player.player_name, player.team_id
                    ),
                });
            }
            if player_ids
                .insert(player.player_name.clone(), player.player_id)
                .is_some()
            {
                return Err(PipelineError::InconsistentRegistry {
                    kind: EntityKind::Player,
                    detail: format!("player name '{}' appears twice", player.player_name),
                });
            }
        }
        Ok(Self {
            teams,
            players,
            team_ids,
            player_ids,
        })
    }

    pub fn register_teams(
        &mut self,
        candidates: &[TeamCandidate],
    ) -> Result<BTreeMap<String, TeamId>, PipelineError> {
        if !self.teams.is_empty() {
            return Err(PipelineError::RegistryAlreadyPopulated {
                kind: EntityKind::Team,
            });
        }
        let mut seen: BTreeMap<&str, &TeamCandidate> = BTreeMap::new();
        for candidate in candidates {
            match seen.get(candidate.name.as_str()) {
                Some(first) if first.competition_type != candidate.competition_type => {
                    return Err(PipelineError::DuplicateIdentity {
                        kind: EntityKind::Team,
                        name: candidate.name.clone(),
                        detail: format!(
                            "seen in {} and in {}",
                            first.competition, candidate.competition
                        ),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(&candidate.name, candidate);
                }
            }
        }

        // BTreeMap iteration is byte order; clubs take the low ids.
        let seen = &seen;
        let ordered = [CompetitionType::League, CompetitionType::International]
            .into_iter()
            .flat_map(|group| {
                seen.values()
                    .filter(move |candidate| candidate.competition_type == group)
            })
            .collect::<Vec<_>>();
        for (idx, candidate) in ordered.into_iter().enumerate() {
            let team_id = idx as TeamId + 1;
            let country = match candidate.competition_type {
                CompetitionType::International => Some(candidate.name.clone()),
                CompetitionType::League => None,
            };
            self.teams.push(Team {
                team_id,
                team_name: candidate.name.clone(),
                competition_type: candidate.competition_type,
                country,
                primary_competition: candidate.competition.clone(),
            });
            self.team_ids.insert(candidate.name.clone(), team_id);
        }
        info!("Registered {} team(s)", self.teams.len());
        Ok(self.team_ids.clone())
    }

    pub fn register_players(
        &mut self,
        candidates: &[PlayerCandidate],
    ) -> Result<BTreeMap<String, PlayerId>, PipelineError> {
        if !self.players.is_empty() {
            return Err(PipelineError::RegistryAlreadyPopulated {
                kind: EntityKind::Player,
            });
        }
        let mut seen: BTreeMap<&str, &PlayerCandidate> = BTreeMap::new();
        for candidate in candidates {
            match seen.get(candidate.name.as_str()) {
                Some(first) if first.team != candidate.team => {
                    return Err(PipelineError::DuplicateIdentity {
                        kind: EntityKind::Player,
                        name: candidate.name.clone(),
                        detail: format!("listed for {} and {}", first.team, candidate.team),
                    });
                }
                Some(_) => debug!("Collapsing repeated player mention '{}'", candidate.name),
                None => {
                    seen.insert(&candidate.name, candidate);
                }
            }
        }

        // Every team must resolve before anything is committed.
        let players = seen
            .values()
            .enumerate()
            .map(|(idx, candidate)| {
                let team_id =
                    self.team_id(&candidate.team, &format!("player '{}'", candidate.name))?;
                Ok(Player {
                    player_id: idx as PlayerId + 1,
                    player_name: candidate.name.clone(),
                    team_id,
                    team_name: candidate.team.clone(),
                    position: candidate.position.clone(),
                    age: candidate.age,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        self.player_ids = players
            .iter()
            .map(|p| (p.player_name.clone(), p.player_id))
            .collect();
        self.players = players;
        info!("Registered {} player(s)", self.players.len());
        Ok(self.player_ids.clone())
    }

    pub fn team_id(&self, name: &str, referenced_by: &str) -> Result<TeamId, PipelineError> {
        self.team_ids
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnresolvedReference {
                kind: EntityKind::Team,
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    pub fn player_id(&self, name: &str, referenced_by: &str) -> Result<PlayerId, PipelineError> {
        self.player_ids
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnresolvedReference {
                kind: EntityKind::Player,
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn club(name: &str) -> TeamCandidate {
        TeamCandidate {
            name: name.into(),
            competition_type: CompetitionType::League,
            competition: "Premier League".into(),
        }
    }

    fn nation(name: &str) -> TeamCandidate {
        TeamCandidate {
            name: name.into(),
            competition_type: CompetitionType::International,
            competition: TOURNAMENT_COMPETITION.into(),
        }
    }

    fn player(name: &str, team: &str) -> PlayerCandidate {
        PlayerCandidate {
            name: name.into(),
            team: team.into(),
            position: None,
            age: None,
        }
    }

    #[test]
    fn clubs_take_low_ids_then_nations() {
        let mut registry = EntityRegistry::new();
        let ids = registry
            .register_teams(&[
                nation("Brazil"),
                club("Wolves"),
                club("Arsenal"),
                nation("Argentina"),
                club("Arsenal"),
            ])
            .unwrap();
        assert_eq!(ids["Arsenal"], 1);
        assert_eq!(ids["Wolves"], 2);
        assert_eq!(ids["Argentina"], 3);
        assert_eq!(ids["Brazil"], 4);
        assert_eq!(registry.teams()[2].country.as_deref(), Some("Argentina"));
        assert_eq!(registry.teams()[0].country, None);
    }

    #[test]
    fn team_seen_as_club_and_nation_is_a_duplicate_identity() {
        let mut registry = EntityRegistry::new();
        let err = registry
            .register_teams(&[club("Wales"), nation("Wales")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateIdentity { kind: EntityKind::Team, .. }));
    }

    #[test]
    fn players_are_ordered_by_name_and_resolve_their_team() {
        let mut registry = EntityRegistry::new();
        registry
            .register_teams(&[nation("France"), nation("Argentina")])
            .unwrap();
        let ids = registry
            .register_players(&[
                player("Lionel Messi", "Argentina"),
                player("Kylian Mbappe", "France"),
                player("Lionel Messi", "Argentina"),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids["Kylian Mbappe"], 1);
        assert_eq!(registry.players()[1].team_id, 1);
        assert_eq!(registry.player_id("Lionel Messi", "test").unwrap(), 2);
    }

    #[test]
    fn player_on_two_teams_is_rejected() {
        let mut registry = EntityRegistry::new();
        registry
            .register_teams(&[nation("Spain"), nation("England")])
            .unwrap();
        let err = registry
            .register_players(&[player("Rodri", "Spain"), player("Rodri", "England")])
            .unwrap_err();
        assert!(err.to_string().contains("Rodri"));
    }

    #[test]
    fn player_with_unknown_team_is_unresolved() {
        let mut registry = EntityRegistry::new();
        registry.register_teams(&[nation("Spain")]).unwrap();
        let err = registry
            .register_players(&[player("Pedri", "Atlantis")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedReference { .. }));
    }

    #[test]
    fn unresolved_player_team_leaves_registry_retryable() {
        let mut registry = EntityRegistry::new();
        registry.register_teams(&[nation("Spain")]).unwrap();
        let err = registry
            .register_players(&[player("Alba", "Spain"), player("Pedri", "Atlantis")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnresolvedReference { .. }));
        assert!(registry.players().is_empty());
        assert!(registry.player_id("Alba", "test").is_err());

        let ids = registry
            .register_players(&[player("Alba", "Spain"), player("Pedri", "Spain")])
            .unwrap();
        assert_eq!(ids.get("Pedri"), Some(&2));
        assert_eq!(registry.players().len(), 2);
    }

    #[test]
    fn registering_twice_is_refused() {
        let mut registry = EntityRegistry::new();
        registry.register_teams(&[club("Arsenal")]).unwrap();
        let err = registry.register_teams(&[club("Chelsea")]).unwrap_err();
        assert!(matches!(err, PipelineError::RegistryAlreadyPopulated { .. }));
    }

    #[test]
    fn from_tables_rejects_gaps() {
        let teams = vec![Team {
            team_id: 2,
            team_name: "Arsenal".into(),
            competition_type: CompetitionType::League,
            country: None,
            primary_competition: "Premier League".into(),
        }];
        let err = EntityRegistry::from_tables(teams, Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InconsistentRegistry { .. }));
    }

    #[test]
    fn from_tables_restores_lookups() {
        let mut original = EntityRegistry::new();
        original
            .register_teams(&[club("Lyon"), nation("Japan")])
            .unwrap();
        original
            .register_players(&[player("Kaoru Mitoma", "Japan")])
            .unwrap();
        let restored =
            EntityRegistry::from_tables(original.teams().to_vec(), original.players().to_vec())
                .unwrap();
        assert_eq!(restored.team_id("Japan", "test").unwrap(), 2);
        assert_eq!(restored.player_id("Kaoru Mitoma", "test").unwrap(), 1);
        assert!(restored.team_id("Brazil", "test").is_err());
    }

    proptest! {
        #[test]
        fn team_ids_are_dense_and_ordered(
            clubs in proptest::collection::btree_set("c[a-z]{1,6}", 0..20),
            nations in proptest::collection::btree_set("n[a-z]{1,6}", 0..20),
            repeats in 1usize..3,
        ) {
            let mut candidates = Vec::new();
            for _ in 0..repeats {
                candidates.extend(nations.iter().rev().map(|name| nation(name)));
                candidates.extend(clubs.iter().rev().map(|name| club(name)));
            }
            let mut registry = EntityRegistry::new();
            registry.register_teams(&candidates).unwrap();
            let teams = registry.teams();
            prop_assert_eq!(teams.len(), clubs.len() + nations.len());
            for (idx, team) in teams.iter().enumerate() {
                prop_assert_eq!(team.team_id as usize, idx + 1);
            }
            let expected = clubs.iter().chain(nations.iter()).cloned().collect::<Vec<_>>();
            let actual = teams.iter().map(|team| team.team_name.clone()).collect::<Vec<_>>();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn player_ids_ignore_input_order(
            names in proptest::collection::btree_set("[A-Z][a-z]{1,8}", 1..30),
        ) {
            let forward = names.iter().map(|name| player(name, "Spain")).collect::<Vec<_>>();
            let backward = forward.iter().rev().cloned().collect::<Vec<_>>();
            let mut first = EntityRegistry::new();
            first.register_teams(&[nation("Spain")]).unwrap();
            let mut second = EntityRegistry::new();
            second.register_teams(&[nation("Spain")]).unwrap();
            let a = first.register_players(&forward).unwrap();
            let b = second.register_players(&backward).unwrap();
            prop_assert_eq!(&a, &b);
            let ids = a.values().copied().collect::<BTreeSet<_>>();
            prop_assert_eq!(ids, (1..=names.len() as u32).collect::<BTreeSet<_>>());
        }
    }
}
