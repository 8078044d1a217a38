//! Raw record loader.
//!
//! Reads the five league exports, the tournament match file, the group
//! standings file and the per-topic player files, renames their columns onto
//! one vocabulary and coerces every field. A row whose field cannot be coerced
//! (or whose required field is blank) is excluded and recorded in the
//! [`LoadReport`]; it never aborts the run. Exact duplicate rows are dropped
//! and counted separately.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::{
        canonical_name, canonical_text, parse_age, parse_count, parse_measure,
        parse_optional_date, parse_optional_time,
    },
    error::PipelineError,
    io_utils,
    model::{CleanMatch, CleanPlayer, CleanSources, CleanStanding, SourceKind},
};

pub const LEAGUE_SEASON: &str = "2022-23";
pub const TOURNAMENT_COMPETITION: &str = "World Cup";
pub const TOURNAMENT_SEASON: &str = "2022";

#[derive(Debug, Clone, Copy)]
pub struct LeagueSource {
    pub file_name: &'static str,
    pub competition: &'static str,
    pub country: &'static str,
}

/// League exports in processing order. Match ids follow this order.
pub const LEAGUE_SOURCES: &[LeagueSource] = &[
    LeagueSource {
        file_name: "D1.csv",
        competition: "Bundesliga",
        country: "Germany",
    },
    LeagueSource {
        file_name: "E0.csv",
        competition: "Premier League",
        country: "England",
    },
    LeagueSource {
        file_name: "F1.csv",
        competition: "Ligue 1",
        country: "France",
    },
    LeagueSource {
        file_name: "I1.csv",
        competition: "Serie A",
        country: "Italy",
    },
    LeagueSource {
        file_name: "SP1.csv",
        competition: "La Liga",
        country: "Spain",
    },
];

type FieldSpec = (&'static str, &'static [&'static str]);

const MATCH_FIELDS: &[FieldSpec] = &[
    ("date", &["Date", "date"]),
    ("time", &["Time", "time"]),
    ("home_team", &["HomeTeam", "home_team"]),
    ("away_team", &["AwayTeam", "away_team"]),
    ("home_goals", &["FTHG", "home_score", "home_goals"]),
    ("away_goals", &["FTAG", "away_score", "away_goals"]),
    ("home_shots", &["HS", "home_shots_total", "home_shots"]),
    ("away_shots", &["AS", "away_shots_total", "away_shots"]),
    ("home_sot", &["HST", "home_shots_on_target", "home_sot"]),
    ("away_sot", &["AST", "away_shots_on_target", "away_sot"]),
    ("home_fouls", &["HF", "home_fouls"]),
    ("away_fouls", &["AF", "away_fouls"]),
    ("home_corners", &["HC", "home_corners"]),
    ("away_corners", &["AC", "away_corners"]),
    ("home_yellow", &["HY", "home_yellow"]),
    ("away_yellow", &["AY", "away_yellow"]),
    ("home_red", &["HR", "home_red"]),
    ("away_red", &["AR", "away_red"]),
    ("venue", &["venue", "Venue"]),
    ("referee", &["Referee", "referee"]),
    ("home_xg", &["home_xg"]),
    ("away_xg", &["away_xg"]),
    ("home_possession", &["home_possession"]),
    ("away_possession", &["away_possession"]),
    ("home_passes_completed", &["home_passes_completed"]),
    ("home_passes_attempted", &["home_passes", "home_passes_attempted"]),
    ("away_passes_completed", &["away_passes_completed"]),
    ("away_passes_attempted", &["away_passes", "away_passes_attempted"]),
    ("home_tackles", &["home_tackles"]),
    ("away_tackles", &["away_tackles"]),
    ("home_interceptions", &["home_interceptions"]),
    ("away_interceptions", &["away_interceptions"]),
    ("home_clearances", &["home_clearances"]),
    ("away_clearances", &["away_clearances"]),
    ("home_saves", &["home_saves"]),
    ("away_saves", &["away_saves"]),
];
const MATCH_REQUIRED: &[&str] = &["date", "home_team", "away_team", "home_goals", "away_goals"];

const STANDING_FIELDS: &[FieldSpec] = &[
    ("group", &["group"]),
    ("rank", &["rank"]),
    ("team", &["team"]),
    ("played", &["matches_played", "played"]),
    ("wins", &["wins"]),
    ("draws", &["draws"]),
    ("losses", &["losses"]),
    ("goals_for", &["goals_scored", "goals_for"]),
    ("goals_against", &["goals_against"]),
    ("points", &["points"]),
];

const PLAYER_FIELDS: &[FieldSpec] = &[
    ("player", &["player"]),
    ("team", &["team"]),
    ("position", &["position"]),
    ("age", &["age"]),
    ("minutes", &["minutes"]),
    ("minutes_90s", &["minutes_90s"]),
    ("games", &["games"]),
    ("goals", &["goals"]),
    ("assists", &["assists"]),
    ("shots", &["shots_total", "shots"]),
    ("shots_on_target", &["shots_on_target"]),
    ("xg", &["xg"]),
    ("passes_completed", &["passes_completed"]),
    ("passes", &["passes"]),
    ("passes_pct", &["passes_pct"]),
    ("tackles", &["tackles"]),
    ("interceptions", &["interceptions"]),
    ("clearances", &["clearances"]),
    ("touches", &["touches"]),
    ("dispossessed", &["dispossessed"]),
    ("xg_assist", &["xg_assist"]),
];

/// Player topic files, merged in this order. Each file only contributes the
/// fields listed next to it; the first file to supply a field wins.
pub const PLAYER_FILES: &[(&str, &[&str])] = &[
    (
        "player_stats.csv",
        &[
            "player",
            "team",
            "position",
            "age",
            "minutes",
            "minutes_90s",
            "games",
            "goals",
            "assists",
        ],
    ),
    (
        "player_shooting.csv",
        &["player", "team", "shots", "shots_on_target", "xg"],
    ),
    (
        "player_passing.csv",
        &["player", "team", "passes_completed", "passes", "passes_pct"],
    ),
    (
        "player_defense.csv",
        &["player", "team", "tackles", "interceptions", "clearances"],
    ),
    (
        "player_possession.csv",
        &["player", "team", "touches", "dispossessed"],
    ),
    ("player_gca.csv", &["player", "team", "xg_assist"]),
];

/// On-disk location of every raw source below one root directory.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub league_dir: PathBuf,
    pub tournament_matches: PathBuf,
    pub tournament_standings: PathBuf,
    pub player_dir: PathBuf,
}

impl SourceLayout {
    pub fn from_root(root: &Path) -> Self {
        let tournament = root.join("world_cup");
        Self {
            league_dir: root.join("leagues"),
            tournament_matches: tournament.join("data.csv"),
            tournament_standings: tournament.join("group_stats.csv"),
            player_dir: tournament.join("player_data"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub encoding: &'static Encoding,
    pub delimiter: Option<u8>,
    pub league_season: String,
    pub tournament_season: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            delimiter: None,
            league_season: LEAGUE_SEASON.to_string(),
            tournament_season: TOURNAMENT_SEASON.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceTally {
    pub source: String,
    pub accepted: usize,
    pub excluded: usize,
    pub duplicates: usize,
}

/// Per-source row accounting plus the reason for every excluded row.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tallies: Vec<SourceTally>,
    pub exclusions: Vec<PipelineError>,
}

impl LoadReport {
    pub fn total_excluded(&self) -> usize {
        self.tallies.iter().map(|tally| tally.excluded).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.tallies.iter().map(|tally| tally.duplicates).sum()
    }

    pub fn tally(&self, source: &str) -> Option<&SourceTally> {
        self.tallies.iter().find(|tally| tally.source == source)
    }
}

/// Column positions for the fields a source actually provides.
struct FieldMap {
    indices: HashMap<&'static str, (usize, &'static str)>,
}

impl FieldMap {
    fn resolve(headers: &[String], specs: &[FieldSpec], allowed: Option<&[&str]>) -> Self {
        let mut indices = HashMap::new();
        for (name, aliases) in specs {
            if allowed.is_some_and(|allowed| !allowed.contains(name)) {
                continue;
            }
            let found = aliases.iter().find_map(|alias| {
                headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(alias))
                    .map(|idx| (idx, *alias))
            });
            if let Some(entry) = found {
                indices.insert(*name, entry);
            }
        }
        Self { indices }
    }

    fn ensure_present(&self, required: &[&str], source: &str) -> Result<()> {
        let missing = required
            .iter()
            .filter(|name| !self.indices.contains_key(*name))
            .copied()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!(
                "{source} is missing required column(s): {}",
                missing.join(", ")
            );
        }
        Ok(())
    }
}

/// One decoded source row with typed accessors keyed by canonical field name.
struct RawRow<'a> {
    source: &'a str,
    row: usize,
    fields: &'a FieldMap,
    values: &'a [String],
}

impl RawRow<'_> {
    fn raw(&self, field: &str) -> Option<(&str, &'static str)> {
        self.fields.indices.get(field).map(|(idx, header)| {
            (
                self.values.get(*idx).map(String::as_str).unwrap_or(""),
                *header,
            )
        })
    }

    fn coerce<T>(
        &self,
        field: &str,
        parse: impl Fn(&str) -> anyhow::Result<Option<T>>,
    ) -> Result<Option<T>, PipelineError> {
        match self.raw(field) {
            None => Ok(None),
            Some((value, header)) => parse(value)
                .map_err(|err| PipelineError::malformed(self.source, self.row, header, err.to_string())),
        }
    }

    fn require<T>(&self, field: &str, value: Option<T>) -> Result<T, PipelineError> {
        value.ok_or_else(|| {
            let header = self.raw(field).map(|(_, header)| header).unwrap_or("");
            let header = if header.is_empty() { field } else { header };
            PipelineError::malformed(self.source, self.row, header, "is required but blank")
        })
    }

    fn name(&self, field: &str) -> Result<String, PipelineError> {
        let value = self.coerce(field, |raw| Ok(canonical_name(raw)))?;
        self.require(field, value)
    }

    fn text(&self, field: &str) -> Result<Option<String>, PipelineError> {
        self.coerce(field, |raw| Ok(canonical_text(raw)))
    }

    fn count(&self, field: &str) -> Result<Option<i32>, PipelineError> {
        self.coerce(field, parse_count)
    }

    fn required_count(&self, field: &str) -> Result<i32, PipelineError> {
        let value = self.count(field)?;
        self.require(field, value)
    }

    fn measure(&self, field: &str) -> Result<Option<f64>, PipelineError> {
        self.coerce(field, parse_measure)
    }
}

/// Reads every row of one source, handing decoded rows to `parse`. Blank
/// lines and exact duplicates are skipped; parse failures are recorded.
#[allow(clippy::too_many_arguments)]
fn read_source<T>(
    path: &Path,
    source_name: &str,
    specs: &[FieldSpec],
    allowed: Option<&[&str]>,
    required: &[&str],
    options: &LoadOptions,
    report: &mut LoadReport,
    parse: impl Fn(&RawRow<'_>) -> Result<T, PipelineError>,
) -> Result<Vec<T>> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let fields = FieldMap::resolve(&headers, specs, allowed);
    fields.ensure_present(required, source_name)?;

    let mut tally = SourceTally {
        source: source_name.to_string(),
        ..SourceTally::default()
    };
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} in {path:?}", row_idx + 2))?;
        let decoded = match io_utils::decode_record(&record, options.encoding) {
            Ok(decoded) => decoded,
            Err(_) => {
                let err = PipelineError::malformed(
                    source_name,
                    row_idx + 2,
                    "<record>",
                    format!("is not valid {} text", options.encoding.name()),
                );
                debug!("Excluding row: {err}");
                tally.excluded += 1;
                report.exclusions.push(err);
                continue;
            }
        };
        if decoded.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        if !seen.insert(decoded.clone()) {
            tally.duplicates += 1;
            continue;
        }
        let raw = RawRow {
            source: source_name,
            row: row_idx + 2,
            fields: &fields,
            values: &decoded,
        };
        match parse(&raw) {
            Ok(parsed) => {
                tally.accepted += 1;
                rows.push(parsed);
            }
            Err(err) => {
                debug!("Excluding row: {err}");
                tally.excluded += 1;
                report.exclusions.push(err);
            }
        }
    }
    if tally.excluded > 0 {
        warn!(
            "{source_name}: excluded {} malformed row(s)",
            tally.excluded
        );
    }
    report.tallies.push(tally);
    Ok(rows)
}

fn parse_match_row(
    row: &RawRow<'_>,
    source_kind: SourceKind,
    competition: &str,
    season: &str,
) -> Result<CleanMatch, PipelineError> {
    let date = row.coerce("date", parse_optional_date)?;
    let date = row.require("date", date)?;
    let advanced = source_kind.has_advanced_stats();
    let adv_count = |field: &str| {
        if advanced {
            row.count(field)
        } else {
            Ok(None)
        }
    };
    let adv_measure = |field: &str| {
        if advanced {
            row.measure(field)
        } else {
            Ok(None)
        }
    };
    Ok(CleanMatch {
        source_kind,
        competition_name: competition.to_string(),
        season: season.to_string(),
        date,
        time: row.coerce("time", parse_optional_time)?,
        home_team: row.name("home_team")?,
        away_team: row.name("away_team")?,
        home_goals: row.required_count("home_goals")?,
        away_goals: row.required_count("away_goals")?,
        home_shots: row.count("home_shots")?,
        away_shots: row.count("away_shots")?,
        home_sot: row.count("home_sot")?,
        away_sot: row.count("away_sot")?,
        home_fouls: row.count("home_fouls")?,
        away_fouls: row.count("away_fouls")?,
        home_corners: row.count("home_corners")?,
        away_corners: row.count("away_corners")?,
        home_yellow: row.count("home_yellow")?,
        away_yellow: row.count("away_yellow")?,
        home_red: row.count("home_red")?,
        away_red: row.count("away_red")?,
        venue: row.text("venue")?,
        referee: row.text("referee")?,
        home_xg: adv_measure("home_xg")?,
        away_xg: adv_measure("away_xg")?,
        home_possession: adv_measure("home_possession")?,
        away_possession: adv_measure("away_possession")?,
        home_passes_completed: adv_count("home_passes_completed")?,
        home_passes_attempted: adv_count("home_passes_attempted")?,
        away_passes_completed: adv_count("away_passes_completed")?,
        away_passes_attempted: adv_count("away_passes_attempted")?,
        home_tackles: adv_count("home_tackles")?,
        away_tackles: adv_count("away_tackles")?,
        home_interceptions: adv_count("home_interceptions")?,
        away_interceptions: adv_count("away_interceptions")?,
        home_clearances: adv_count("home_clearances")?,
        away_clearances: adv_count("away_clearances")?,
        home_saves: adv_count("home_saves")?,
        away_saves: adv_count("away_saves")?,
    })
}

pub fn load_league_file(
    path: &Path,
    league: &LeagueSource,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Vec<CleanMatch>> {
    let matches = read_source(
        path,
        league.file_name,
        MATCH_FIELDS,
        None,
        MATCH_REQUIRED,
        options,
        report,
        |row| parse_match_row(row, SourceKind::League, league.competition, &options.league_season),
    )
    .with_context(|| format!("Loading {} from {path:?}", league.competition))?;
    info!("Cleaned {}: {} match(es)", league.competition, matches.len());
    Ok(matches)
}

/// Loads every configured league export found in `dir`; missing files are
/// skipped with a warning.
pub fn load_leagues(
    dir: &Path,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Vec<CleanMatch>> {
    let mut all = Vec::new();
    for league in LEAGUE_SOURCES {
        let path = dir.join(league.file_name);
        if !path.exists() {
            warn!("League file not found: {path:?}");
            continue;
        }
        all.extend(load_league_file(&path, league, options, report)?);
    }
    info!("Combined {} league match(es)", all.len());
    Ok(all)
}

pub fn load_tournament_matches(
    path: &Path,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Vec<CleanMatch>> {
    let source_name = file_label(path);
    let matches = read_source(
        path,
        &source_name,
        MATCH_FIELDS,
        None,
        MATCH_REQUIRED,
        options,
        report,
        |row| {
            parse_match_row(
                row,
                SourceKind::Tournament,
                TOURNAMENT_COMPETITION,
                &options.tournament_season,
            )
        },
    )
    .with_context(|| format!("Loading tournament matches from {path:?}"))?;
    info!("Cleaned {TOURNAMENT_COMPETITION} matches: {}", matches.len());
    Ok(matches)
}

pub fn load_standings(
    path: &Path,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Vec<CleanStanding>> {
    let source_name = file_label(path);
    let required = STANDING_FIELDS.iter().map(|(name, _)| *name).collect::<Vec<_>>();
    let standings = read_source(
        path,
        &source_name,
        STANDING_FIELDS,
        None,
        &required,
        options,
        report,
        |row| {
            Ok(CleanStanding {
                group: row.name("group")?,
                rank: row.required_count("rank")?,
                team: row.name("team")?,
                played: row.required_count("played")?,
                wins: row.required_count("wins")?,
                draws: row.required_count("draws")?,
                losses: row.required_count("losses")?,
                goals_for: row.required_count("goals_for")?,
                goals_against: row.required_count("goals_against")?,
                points: row.required_count("points")?,
            })
        },
    )
    .with_context(|| format!("Loading standings from {path:?}"))?;
    info!("Cleaned {TOURNAMENT_COMPETITION} standings: {} team(s)", standings.len());
    Ok(standings)
}

fn parse_player_row(row: &RawRow<'_>) -> Result<CleanPlayer, PipelineError> {
    let minutes = match row.count("minutes")? {
        Some(minutes) => Some(minutes),
        None => row
            .measure("minutes_90s")?
            .map(|nineties| (nineties * 90.0).round() as i32),
    };
    Ok(CleanPlayer {
        player: row.name("player")?,
        team: row.name("team")?,
        position: row.text("position")?,
        age: row.coerce("age", parse_age)?,
        minutes,
        games: row.count("games")?,
        goals: row.count("goals")?,
        assists: row.count("assists")?,
        shots: row.count("shots")?,
        shots_on_target: row.count("shots_on_target")?,
        passes_completed: row.count("passes_completed")?,
        passes: row.count("passes")?,
        passes_pct: row.measure("passes_pct")?,
        tackles: row.count("tackles")?,
        interceptions: row.count("interceptions")?,
        clearances: row.count("clearances")?,
        touches: row.count("touches")?,
        dispossessed: row.count("dispossessed")?,
        xg: row.measure("xg")?,
        xg_assist: row.measure("xg_assist")?,
    })
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn merge_missing(target: &mut CleanPlayer, partial: CleanPlayer) {
    fill(&mut target.position, partial.position);
    fill(&mut target.age, partial.age);
    fill(&mut target.minutes, partial.minutes);
    fill(&mut target.games, partial.games);
    fill(&mut target.goals, partial.goals);
    fill(&mut target.assists, partial.assists);
    fill(&mut target.shots, partial.shots);
    fill(&mut target.shots_on_target, partial.shots_on_target);
    fill(&mut target.passes_completed, partial.passes_completed);
    fill(&mut target.passes, partial.passes);
    fill(&mut target.passes_pct, partial.passes_pct);
    fill(&mut target.tackles, partial.tackles);
    fill(&mut target.interceptions, partial.interceptions);
    fill(&mut target.clearances, partial.clearances);
    fill(&mut target.touches, partial.touches);
    fill(&mut target.dispossessed, partial.dispossessed);
    fill(&mut target.xg, partial.xg);
    fill(&mut target.xg_assist, partial.xg_assist);
}

/// Merges the player topic files into one record per (player, team).
pub fn load_players(
    dir: &Path,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Vec<CleanPlayer>> {
    let mut merged: BTreeMap<(String, String), CleanPlayer> = BTreeMap::new();
    let mut files_read = 0usize;
    for (file_name, allowed) in PLAYER_FILES {
        let path = dir.join(file_name);
        if !path.exists() {
            warn!("Player file not found: {path:?}");
            continue;
        }
        let partials = read_source(
            &path,
            file_name,
            PLAYER_FIELDS,
            Some(*allowed),
            &["player", "team"],
            options,
            report,
            parse_player_row,
        )
        .with_context(|| format!("Loading player data from {path:?}"))?;
        files_read += 1;

        let mut seen_in_file = HashSet::new();
        let mut repeated = 0usize;
        for partial in partials {
            let key = (partial.player.clone(), partial.team.clone());
            if !seen_in_file.insert(key.clone()) {
                repeated += 1;
                continue;
            }
            let entry = merged.entry(key).or_insert_with(|| CleanPlayer {
                player: partial.player.clone(),
                team: partial.team.clone(),
                ..CleanPlayer::default()
            });
            merge_missing(entry, partial);
        }
        if repeated > 0
            && let Some(tally) = report.tallies.last_mut()
        {
            tally.accepted -= repeated;
            tally.duplicates += repeated;
        }
        debug!("Merged {file_name}");
    }
    if files_read == 0 {
        bail!("No player data files found in {dir:?}");
    }
    info!("Merged player data: {} player(s)", merged.len());
    Ok(merged.into_values().collect())
}

/// Loads every raw source. League matches come first in [`LEAGUE_SOURCES`]
/// order, followed by the tournament matches.
pub fn load_sources(layout: &SourceLayout, options: &LoadOptions) -> Result<(CleanSources, LoadReport)> {
    let mut report = LoadReport::default();
    let mut matches = load_leagues(&layout.league_dir, options, &mut report)?;
    matches.extend(load_tournament_matches(
        &layout.tournament_matches,
        options,
        &mut report,
    )?);
    let standings = load_standings(&layout.tournament_standings, options, &mut report)?;
    let players = load_players(&layout.player_dir, options, &mut report)?;
    if report.total_excluded() > 0 {
        warn!(
            "Excluded {} malformed row(s) across all sources",
            report.total_excluded()
        );
    }
    Ok((
        CleanSources {
            matches,
            standings,
            players,
        },
        report,
    ))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
