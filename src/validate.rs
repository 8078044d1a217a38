//! Validator for the six final tables.
//!
//! Every check runs, in a fixed order grouped by category, and records the
//! keys of the rows it rejected. The report is all-or-nothing: a single
//! failing check fails the run.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::PipelineError,
    model::{CompetitionType, Dataset, MatchAdvanced, MatchBase, PlayerStat, StandingRow},
    table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl std::fmt::Display for CountRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "exactly {}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Thresholds for the validator, loadable from YAML. Omitted keys keep their
/// defaults, which describe the full five-league plus World Cup dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub teams: CountRange,
    pub players: CountRange,
    pub matches_base: CountRange,
    pub matches_advanced: CountRange,
    pub player_stats: CountRange,
    pub standings: CountRange,
    pub possession_tolerance: f64,
    pub min_age: f64,
    pub max_age: f64,
    pub max_rank: i32,
    /// Offending keys kept per check in the report.
    pub max_offenders: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            teams: CountRange::new(100, 150),
            players: CountRange::new(600, 800),
            matches_base: CountRange::new(1800, 2000),
            matches_advanced: CountRange::new(64, 64),
            player_stats: CountRange::new(600, 800),
            standings: CountRange::new(32, 32),
            possession_tolerance: 2.0,
            min_age: 15.0,
            max_age: 45.0,
            max_rank: 4,
            max_offenders: 10,
        }
    }
}

impl ValidationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Opening validation config {path:?}"))?;
        let config: ValidationConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing validation config {path:?}"))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    ReferentialIntegrity,
    NullPolicy,
    Range,
    CrossColumn,
    Aggregate,
    Cardinality,
}

impl CheckCategory {
    pub fn label(self) -> &'static str {
        match self {
            CheckCategory::ReferentialIntegrity => "referential",
            CheckCategory::NullPolicy => "null-policy",
            CheckCategory::Range => "range",
            CheckCategory::CrossColumn => "cross-column",
            CheckCategory::Aggregate => "aggregate",
            CheckCategory::Cardinality => "cardinality",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub category: CheckCategory,
    pub table: String,
    pub rule: String,
    pub passed: bool,
    pub violations: usize,
    pub offenders: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ReportStatus,
    pub total_checks: usize,
    pub failed_checks: usize,
    pub checks: Vec<CheckOutcome>,
}

impl ValidationReport {
    fn from_checks(checks: Vec<CheckOutcome>) -> Self {
        let failed_checks = checks.iter().filter(|check| !check.passed).count();
        Self {
            status: if failed_checks == 0 {
                ReportStatus::Passed
            } else {
                ReportStatus::Failed
            },
            total_checks: checks.len(),
            failed_checks,
            checks,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ReportStatus::Passed
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|check| !check.passed)
    }

    pub fn to_result(&self) -> Result<(), PipelineError> {
        if self.passed() {
            Ok(())
        } else {
            Err(PipelineError::ValidationFailure {
                failed: self.failed_checks,
                total: self.total_checks,
            })
        }
    }

    /// Table of failed checks with their offending keys.
    pub fn render_failures(&self) -> String {
        let headers = ["category", "table", "rule", "violations", "offenders"]
            .map(str::to_string)
            .to_vec();
        let rows = self
            .failures()
            .map(|check| {
                let mut offenders = check.offenders.join(", ");
                if check.violations > check.offenders.len() {
                    offenders.push_str(&format!(
                        " (+{} more)",
                        check.violations - check.offenders.len()
                    ));
                }
                vec![
                    check.category.label().to_string(),
                    check.table.clone(),
                    check.rule.clone(),
                    check.violations.to_string(),
                    offenders,
                ]
            })
            .collect::<Vec<_>>();
        table::render_table(&headers, &rows)
    }
}

struct Checks<'a> {
    config: &'a ValidationConfig,
    outcomes: Vec<CheckOutcome>,
}

impl Checks<'_> {
    fn record<I>(&mut self, category: CheckCategory, table: &str, rule: impl Into<String>, offenders: I)
    where
        I: IntoIterator<Item = String>,
    {
        let all = offenders.into_iter().collect::<Vec<_>>();
        let violations = all.len();
        let mut kept = all;
        kept.truncate(self.config.max_offenders);
        self.outcomes.push(CheckOutcome {
            category,
            table: table.to_string(),
            rule: rule.into(),
            passed: violations == 0,
            violations,
            offenders: kept,
        });
    }
}

type Field<T> = (&'static str, fn(&T) -> Option<f64>);

fn violating_fields<T>(
    rows: &[T],
    key: fn(&T) -> String,
    fields: &[Field<T>],
    bad: fn(f64) -> bool,
) -> Vec<String> {
    let mut offenders = Vec::new();
    for row in rows {
        for (name, get) in fields {
            if get(row).is_some_and(bad) {
                offenders.push(format!("{} ({name})", key(row)));
            }
        }
    }
    offenders
}

fn match_key(row: &MatchBase) -> String {
    format!("match_id={}", row.match_id)
}

fn advanced_key(row: &MatchAdvanced) -> String {
    format!("match_id={}", row.match_id)
}

fn stat_key(row: &PlayerStat) -> String {
    format!("player_id={}", row.player_id)
}

fn standing_key(row: &StandingRow) -> String {
    format!("{}/{}", row.group, row.team)
}

fn count(value: Option<i32>) -> Option<f64> {
    value.map(f64::from)
}

fn dense_gaps(ids: impl Iterator<Item = u32>) -> Vec<String> {
    ids.enumerate()
        .filter(|(idx, id)| *id as usize != idx + 1)
        .map(|(idx, id)| format!("position {} has id {id}", idx + 1))
        .collect()
}

fn negative(value: f64) -> bool {
    value < 0.0
}

fn percentage_out_of_range(value: f64) -> bool {
    !(0.0..=100.0).contains(&value)
}

const MATCH_COUNTS: &[Field<MatchBase>] = &[
    ("home_goals", |r| Some(f64::from(r.home_goals))),
    ("away_goals", |r| Some(f64::from(r.away_goals))),
    ("home_shots", |r| count(r.home_shots)),
    ("away_shots", |r| count(r.away_shots)),
    ("home_sot", |r| count(r.home_sot)),
    ("away_sot", |r| count(r.away_sot)),
    ("home_fouls", |r| count(r.home_fouls)),
    ("away_fouls", |r| count(r.away_fouls)),
    ("home_corners", |r| count(r.home_corners)),
    ("away_corners", |r| count(r.away_corners)),
    ("home_yellow", |r| count(r.home_yellow)),
    ("away_yellow", |r| count(r.away_yellow)),
    ("home_red", |r| count(r.home_red)),
    ("away_red", |r| count(r.away_red)),
];

const MATCH_PERCENTAGES: &[Field<MatchBase>] = &[
    ("home_shot_accuracy", |r| r.home_shot_accuracy),
    ("away_shot_accuracy", |r| r.away_shot_accuracy),
];

const ADVANCED_NON_NEGATIVE: &[Field<MatchAdvanced>] = &[
    ("home_xg", |r| r.home_xg),
    ("away_xg", |r| r.away_xg),
    ("home_passes_completed", |r| count(r.home_passes_completed)),
    ("home_passes_attempted", |r| count(r.home_passes_attempted)),
    ("away_passes_completed", |r| count(r.away_passes_completed)),
    ("away_passes_attempted", |r| count(r.away_passes_attempted)),
    ("home_tackles", |r| count(r.home_tackles)),
    ("away_tackles", |r| count(r.away_tackles)),
    ("home_interceptions", |r| count(r.home_interceptions)),
    ("away_interceptions", |r| count(r.away_interceptions)),
    ("home_clearances", |r| count(r.home_clearances)),
    ("away_clearances", |r| count(r.away_clearances)),
    ("home_saves", |r| count(r.home_saves)),
    ("away_saves", |r| count(r.away_saves)),
];

const ADVANCED_PERCENTAGES: &[Field<MatchAdvanced>] = &[
    ("home_possession", |r| r.home_possession),
    ("away_possession", |r| r.away_possession),
    ("home_pass_accuracy", |r| r.home_pass_accuracy),
    ("away_pass_accuracy", |r| r.away_pass_accuracy),
];

const STAT_COUNTS: &[Field<PlayerStat>] = &[
    ("minutes", |r| count(r.minutes)),
    ("games", |r| count(r.games)),
    ("goals", |r| count(r.goals)),
    ("assists", |r| count(r.assists)),
    ("shots", |r| count(r.shots)),
    ("shots_on_target", |r| count(r.shots_on_target)),
    ("passes_completed", |r| count(r.passes_completed)),
    ("passes", |r| count(r.passes)),
    ("tackles", |r| count(r.tackles)),
    ("interceptions", |r| count(r.interceptions)),
    ("clearances", |r| count(r.clearances)),
    ("touches", |r| count(r.touches)),
    ("dispossessed", |r| count(r.dispossessed)),
    ("xg", |r| r.xg),
    ("xg_assist", |r| r.xg_assist),
];

const STAT_PERCENTAGES: &[Field<PlayerStat>] = &[
    ("passes_pct", |r| r.passes_pct),
    ("shot_efficiency", |r| r.shot_efficiency),
    ("sot_percentage", |r| r.sot_percentage),
];

const STANDING_COUNTS: &[Field<StandingRow>] = &[
    ("played", |r| Some(f64::from(r.played))),
    ("wins", |r| Some(f64::from(r.wins))),
    ("draws", |r| Some(f64::from(r.draws))),
    ("losses", |r| Some(f64::from(r.losses))),
    ("goals_for", |r| Some(f64::from(r.goals_for))),
    ("goals_against", |r| Some(f64::from(r.goals_against))),
    ("points", |r| Some(f64::from(r.points))),
];

fn referential_checks(checks: &mut Checks<'_>, data: &Dataset) {
    use CheckCategory::ReferentialIntegrity as Cat;
    let team_ids = data.teams.iter().map(|t| t.team_id).collect::<BTreeSet<_>>();
    let player_ids = data.players.iter().map(|p| p.player_id).collect::<BTreeSet<_>>();
    let match_ids = data.matches_base.iter().map(|m| m.match_id).collect::<BTreeSet<_>>();

    checks.record(
        Cat,
        "ref_players",
        "team_id references ref_teams",
        data.players
            .iter()
            .filter(|p| !team_ids.contains(&p.team_id))
            .map(|p| format!("player_id={} (team_id={})", p.player_id, p.team_id)),
    );
    checks.record(
        Cat,
        "db_matches_base",
        "home_team_id and away_team_id reference ref_teams",
        data.matches_base
            .iter()
            .filter(|m| !team_ids.contains(&m.home_team_id) || !team_ids.contains(&m.away_team_id))
            .map(match_key),
    );
    checks.record(
        Cat,
        "db_match_stats_advanced",
        "match_id references db_matches_base",
        data.matches_advanced
            .iter()
            .filter(|m| !match_ids.contains(&m.match_id))
            .map(advanced_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "player_id references ref_players",
        data.player_stats
            .iter()
            .filter(|s| !player_ids.contains(&s.player_id))
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "team_id references ref_teams",
        data.player_stats
            .iter()
            .filter(|s| !team_ids.contains(&s.team_id))
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "team_id references ref_teams",
        data.standings
            .iter()
            .filter(|s| !team_ids.contains(&s.team_id))
            .map(standing_key),
    );
}

fn null_policy_checks(checks: &mut Checks<'_>, data: &Dataset) {
    use CheckCategory::NullPolicy as Cat;
    checks.record(
        Cat,
        "ref_teams",
        "team_name and primary_competition are non-empty",
        data.teams
            .iter()
            .filter(|t| t.team_name.is_empty() || t.primary_competition.is_empty())
            .map(|t| format!("team_id={}", t.team_id)),
    );
    checks.record(
        Cat,
        "ref_teams",
        "international teams carry a country",
        data.teams
            .iter()
            .filter(|t| t.competition_type == CompetitionType::International && t.country.is_none())
            .map(|t| format!("team_id={}", t.team_id)),
    );
    checks.record(
        Cat,
        "ref_players",
        "player_name and team_name are non-empty",
        data.players
            .iter()
            .filter(|p| p.player_name.is_empty() || p.team_name.is_empty())
            .map(|p| format!("player_id={}", p.player_id)),
    );
    checks.record(
        Cat,
        "db_matches_base",
        "competition, season and derived columns are present",
        data.matches_base
            .iter()
            .filter(|m| {
                m.competition_name.is_empty()
                    || m.season.is_empty()
                    || m.goal_difference.is_none()
                    || m.total_goals.is_none()
                    || m.total_cards.is_none()
                    || m.result.is_none()
            })
            .map(match_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "goal_contributions is present",
        data.player_stats
            .iter()
            .filter(|s| s.goal_contributions.is_none())
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "group, team and derived columns are present",
        data.standings
            .iter()
            .filter(|s| {
                s.group.is_empty()
                    || s.team.is_empty()
                    || s.goal_difference.is_none()
                    || s.clean_sheets.is_none()
            })
            .map(standing_key),
    );
}

fn range_checks(checks: &mut Checks<'_>, data: &Dataset) {
    use CheckCategory::Range as Cat;
    let config = checks.config;

    checks.record(
        Cat,
        "db_matches_base",
        "counts are non-negative",
        violating_fields(&data.matches_base, match_key, MATCH_COUNTS, negative),
    );
    checks.record(
        Cat,
        "db_matches_base",
        "shot accuracy within 0-100",
        violating_fields(
            &data.matches_base,
            match_key,
            MATCH_PERCENTAGES,
            percentage_out_of_range,
        ),
    );
    checks.record(
        Cat,
        "db_match_stats_advanced",
        "xG and counts are non-negative",
        violating_fields(
            &data.matches_advanced,
            advanced_key,
            ADVANCED_NON_NEGATIVE,
            negative,
        ),
    );
    checks.record(
        Cat,
        "db_match_stats_advanced",
        "possession and pass accuracy within 0-100",
        violating_fields(
            &data.matches_advanced,
            advanced_key,
            ADVANCED_PERCENTAGES,
            percentage_out_of_range,
        ),
    );
    let (min_age, max_age) = (config.min_age, config.max_age);
    checks.record(
        Cat,
        "ref_players",
        format!("age within {min_age}-{max_age}"),
        data.players
            .iter()
            .filter(|p| p.age.is_some_and(|age| age < min_age || age > max_age))
            .map(|p| format!("player_id={}", p.player_id)),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "counts are non-negative",
        violating_fields(&data.player_stats, stat_key, STAT_COUNTS, negative),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "percentages within 0-100",
        violating_fields(
            &data.player_stats,
            stat_key,
            STAT_PERCENTAGES,
            percentage_out_of_range,
        ),
    );
    checks.record(
        Cat,
        "db_standings",
        "counts are non-negative",
        violating_fields(&data.standings, standing_key, STANDING_COUNTS, negative),
    );
    let max_rank = config.max_rank;
    checks.record(
        Cat,
        "db_standings",
        format!("rank within 1-{max_rank}"),
        data.standings
            .iter()
            .filter(|s| s.rank < 1 || s.rank > max_rank)
            .map(standing_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "win_percentage within 0-100",
        data.standings
            .iter()
            .filter(|s| s.win_percentage.is_some_and(percentage_out_of_range))
            .map(standing_key),
    );
}

fn exceeds(part: Option<i32>, whole: Option<i32>) -> bool {
    matches!((part, whole), (Some(part), Some(whole)) if part > whole)
}

fn cross_column_checks(checks: &mut Checks<'_>, data: &Dataset) {
    use CheckCategory::CrossColumn as Cat;
    checks.record(
        Cat,
        "db_matches_base",
        "home_team_id differs from away_team_id",
        data.matches_base
            .iter()
            .filter(|m| m.home_team_id == m.away_team_id)
            .map(match_key),
    );
    checks.record(
        Cat,
        "db_matches_base",
        "shots on target do not exceed shots",
        data.matches_base
            .iter()
            .filter(|m| exceeds(m.home_sot, m.home_shots) || exceeds(m.away_sot, m.away_shots))
            .map(match_key),
    );
    checks.record(
        Cat,
        "db_match_stats_advanced",
        "passes completed do not exceed passes attempted",
        data.matches_advanced
            .iter()
            .filter(|m| {
                exceeds(m.home_passes_completed, m.home_passes_attempted)
                    || exceeds(m.away_passes_completed, m.away_passes_attempted)
            })
            .map(advanced_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "shots on target do not exceed shots",
        data.player_stats
            .iter()
            .filter(|s| exceeds(s.shots_on_target, s.shots))
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "passes completed do not exceed passes",
        data.player_stats
            .iter()
            .filter(|s| exceeds(s.passes_completed, s.passes))
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_players_stats",
        "goals do not exceed shots",
        data.player_stats
            .iter()
            .filter(|s| exceeds(s.goals, s.shots))
            .map(stat_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "wins, draws and losses do not exceed played",
        data.standings
            .iter()
            .filter(|s| s.wins > s.played || s.draws > s.played || s.losses > s.played)
            .map(standing_key),
    );
}

fn duplicates<K: Ord + Clone>(keys: impl Iterator<Item = K>) -> Vec<K> {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for key in keys {
        if !seen.insert(key.clone()) {
            repeated.insert(key);
        }
    }
    repeated.into_iter().collect()
}

fn aggregate_checks(checks: &mut Checks<'_>, data: &Dataset) {
    use CheckCategory::Aggregate as Cat;
    checks.record(
        Cat,
        "ref_teams",
        "team_id is dense from 1",
        dense_gaps(data.teams.iter().map(|t| t.team_id)),
    );
    checks.record(
        Cat,
        "ref_teams",
        "team_name is unique",
        duplicates(data.teams.iter().map(|t| t.team_name.clone())),
    );
    checks.record(
        Cat,
        "ref_players",
        "player_id is dense from 1",
        dense_gaps(data.players.iter().map(|p| p.player_id)),
    );
    checks.record(
        Cat,
        "ref_players",
        "player_name is unique",
        duplicates(data.players.iter().map(|p| p.player_name.clone())),
    );
    checks.record(
        Cat,
        "db_matches_base",
        "match_id is dense from 1",
        dense_gaps(data.matches_base.iter().map(|m| m.match_id)),
    );
    checks.record(
        Cat,
        "db_match_stats_advanced",
        "match_id is unique",
        duplicates(data.matches_advanced.iter().map(|m| m.match_id))
            .into_iter()
            .map(|id| format!("match_id={id}")),
    );
    let tolerance = checks.config.possession_tolerance;
    checks.record(
        Cat,
        "db_match_stats_advanced",
        format!("possession sums to 100 within {tolerance}"),
        data.matches_advanced
            .iter()
            .filter(|m| match (m.home_possession, m.away_possession) {
                (Some(home), Some(away)) => (home + away - 100.0).abs() > tolerance,
                _ => false,
            })
            .map(advanced_key),
    );
    let stat_ids = data.player_stats.iter().map(|s| s.player_id).collect::<BTreeSet<_>>();
    let player_ids = data.players.iter().map(|p| p.player_id).collect::<BTreeSet<_>>();
    checks.record(
        Cat,
        "db_players_stats",
        "exactly one row per player",
        duplicates(data.player_stats.iter().map(|s| s.player_id))
            .into_iter()
            .chain(player_ids.difference(&stat_ids).copied())
            .map(|id| format!("player_id={id}")),
    );
    checks.record(
        Cat,
        "db_standings",
        "wins + draws + losses = played",
        data.standings
            .iter()
            .filter(|s| {
                i64::from(s.wins) + i64::from(s.draws) + i64::from(s.losses)
                    != i64::from(s.played)
            })
            .map(standing_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "points = 3 x wins + draws",
        data.standings
            .iter()
            .filter(|s| i64::from(s.points) != 3 * i64::from(s.wins) + i64::from(s.draws))
            .map(standing_key),
    );
    checks.record(
        Cat,
        "db_standings",
        "rank is unique within a group",
        duplicates(data.standings.iter().map(|s| (s.group.clone(), s.rank)))
            .into_iter()
            .map(|(group, rank)| format!("{group} rank {rank}")),
    );
    checks.record(
        Cat,
        "db_standings",
        "team appears once per group",
        duplicates(data.standings.iter().map(|s| (s.group.clone(), s.team_id)))
            .into_iter()
            .map(|(group, team_id)| format!("{group} team_id {team_id}")),
    );
}

fn cardinality_checks(checks: &mut Checks<'_>, data: &Dataset) {
    let config = checks.config;
    let tables = [
        ("ref_teams", data.teams.len(), config.teams),
        ("ref_players", data.players.len(), config.players),
        ("db_matches_base", data.matches_base.len(), config.matches_base),
        (
            "db_match_stats_advanced",
            data.matches_advanced.len(),
            config.matches_advanced,
        ),
        ("db_players_stats", data.player_stats.len(), config.player_stats),
        ("db_standings", data.standings.len(), config.standings),
    ];
    for (table, rows, expected) in tables {
        let offenders = if expected.contains(rows) {
            Vec::new()
        } else {
            vec![format!("{rows} rows")]
        };
        checks.record(
            CheckCategory::Cardinality,
            table,
            format!("row count {expected}"),
            offenders,
        );
    }
}

/// Runs every check against the final tables. Never stops at the first
/// failure.
pub fn validate(data: &Dataset, config: &ValidationConfig) -> ValidationReport {
    let mut checks = Checks {
        config,
        outcomes: Vec::new(),
    };
    referential_checks(&mut checks, data);
    null_policy_checks(&mut checks, data);
    range_checks(&mut checks, data);
    cross_column_checks(&mut checks, data);
    aggregate_checks(&mut checks, data);
    cardinality_checks(&mut checks, data);

    let report = ValidationReport::from_checks(checks.outcomes);
    let by_category = report
        .failures()
        .fold(BTreeMap::new(), |mut acc: BTreeMap<&str, usize>, check| {
            *acc.entry(check.category.label()).or_default() += 1;
            acc
        });
    if report.passed() {
        info!("✓ All {} validation checks passed", report.total_checks);
    } else {
        for (category, failed) in by_category {
            warn!("{failed} {category} check(s) failed");
        }
    }
    report
}
