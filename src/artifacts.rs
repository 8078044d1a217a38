//! On-disk artifacts: the six output tables, the intermediate tables that let
//! each step run in isolation, and the manifest/report JSON files.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{
    io_utils,
    model::{
        CleanMatch, CleanPlayer, CleanStanding, MatchAdvanced, MatchBase, NormalizedMatch, Player,
        PlayerStat, StandingRow, Team,
    },
};

pub const TEAMS_FILE: &str = "ref_teams.csv";
pub const PLAYERS_FILE: &str = "ref_players.csv";
pub const MATCHES_BASE_FILE: &str = "db_matches_base.csv";
pub const MATCHES_ADVANCED_FILE: &str = "db_match_stats_advanced.csv";
pub const PLAYER_STATS_FILE: &str = "db_players_stats.csv";
pub const STANDINGS_FILE: &str = "db_standings.csv";
pub const REPORT_FILE: &str = "validation_report.json";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const INTERMEDIATE_DIR: &str = "intermediate";
pub const CLEAN_MATCHES_FILE: &str = "clean_matches.csv";
pub const CLEAN_STANDINGS_FILE: &str = "clean_standings.csv";
pub const CLEAN_PLAYERS_FILE: &str = "clean_players.csv";
pub const LOAD_REPORT_FILE: &str = "load_report.json";
pub const NORMALIZED_MATCHES_FILE: &str = "normalized_matches.csv";
pub const NORMALIZED_PLAYER_STATS_FILE: &str = "normalized_player_stats.csv";
pub const NORMALIZED_STANDINGS_FILE: &str = "normalized_standings.csv";
pub const SPLIT_MATCHES_BASE_FILE: &str = "split_matches_base.csv";
pub const SPLIT_MATCHES_ADVANCED_FILE: &str = "split_matches_advanced.csv";

/// Final tables in manifest order.
pub const OUTPUT_TABLES: &[&str] = &[
    TEAMS_FILE,
    PLAYERS_FILE,
    MATCHES_BASE_FILE,
    MATCHES_ADVANCED_FILE,
    PLAYER_STATS_FILE,
    STANDINGS_FILE,
];

/// Fixed column order of a persisted table. Written explicitly so that an
/// empty table still carries its header.
pub trait TableSchema {
    const COLUMNS: &'static [&'static str];
}

impl TableSchema for CleanMatch {
    const COLUMNS: &'static [&'static str] = &[
        "source_kind",
        "competition_name",
        "season",
        "date",
        "time",
        "home_team",
        "away_team",
        "home_goals",
        "away_goals",
        "home_shots",
        "away_shots",
        "home_sot",
        "away_sot",
        "home_fouls",
        "away_fouls",
        "home_corners",
        "away_corners",
        "home_yellow",
        "away_yellow",
        "home_red",
        "away_red",
        "venue",
        "referee",
        "home_xg",
        "away_xg",
        "home_possession",
        "away_possession",
        "home_passes_completed",
        "home_passes_attempted",
        "away_passes_completed",
        "away_passes_attempted",
        "home_tackles",
        "away_tackles",
        "home_interceptions",
        "away_interceptions",
        "home_clearances",
        "away_clearances",
        "home_saves",
        "away_saves",
    ];
}

impl TableSchema for NormalizedMatch {
    const COLUMNS: &'static [&'static str] = &[
        "source_kind",
        "competition_name",
        "season",
        "date",
        "time",
        "home_team_id",
        "away_team_id",
        "home_goals",
        "away_goals",
        "home_shots",
        "away_shots",
        "home_sot",
        "away_sot",
        "home_fouls",
        "away_fouls",
        "home_corners",
        "away_corners",
        "home_yellow",
        "away_yellow",
        "home_red",
        "away_red",
        "venue",
        "referee",
        "home_xg",
        "away_xg",
        "home_possession",
        "away_possession",
        "home_passes_completed",
        "home_passes_attempted",
        "away_passes_completed",
        "away_passes_attempted",
        "home_tackles",
        "away_tackles",
        "home_interceptions",
        "away_interceptions",
        "home_clearances",
        "away_clearances",
        "home_saves",
        "away_saves",
    ];
}

impl TableSchema for CleanStanding {
    const COLUMNS: &'static [&'static str] = &[
        "group",
        "rank",
        "team",
        "played",
        "wins",
        "draws",
        "losses",
        "goals_for",
        "goals_against",
        "points",
    ];
}

impl TableSchema for CleanPlayer {
    const COLUMNS: &'static [&'static str] = &[
        "player",
        "team",
        "position",
        "age",
        "minutes",
        "games",
        "goals",
        "assists",
        "shots",
        "shots_on_target",
        "passes_completed",
        "passes",
        "passes_pct",
        "tackles",
        "interceptions",
        "clearances",
        "touches",
        "dispossessed",
        "xg",
        "xg_assist",
    ];
}

impl TableSchema for Team {
    const COLUMNS: &'static [&'static str] = &[
        "team_id",
        "team_name",
        "competition_type",
        "country",
        "primary_competition",
    ];
}

impl TableSchema for Player {
    const COLUMNS: &'static [&'static str] = &[
        "player_id",
        "player_name",
        "team_id",
        "team_name",
        "position",
        "age",
    ];
}

impl TableSchema for MatchBase {
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "competition_name",
        "season",
        "date",
        "time",
        "home_team_id",
        "away_team_id",
        "home_goals",
        "away_goals",
        "home_shots",
        "away_shots",
        "home_sot",
        "away_sot",
        "home_fouls",
        "away_fouls",
        "home_corners",
        "away_corners",
        "home_yellow",
        "away_yellow",
        "home_red",
        "away_red",
        "venue",
        "referee",
        "goal_difference",
        "total_goals",
        "total_cards",
        "home_shot_accuracy",
        "away_shot_accuracy",
        "result",
    ];
}

impl TableSchema for MatchAdvanced {
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "home_xg",
        "away_xg",
        "home_possession",
        "away_possession",
        "home_passes_completed",
        "home_passes_attempted",
        "away_passes_completed",
        "away_passes_attempted",
        "home_tackles",
        "away_tackles",
        "home_interceptions",
        "away_interceptions",
        "home_clearances",
        "away_clearances",
        "home_saves",
        "away_saves",
        "home_pass_accuracy",
        "away_pass_accuracy",
        "possession_delta",
        "xg_difference",
    ];
}

impl TableSchema for PlayerStat {
    const COLUMNS: &'static [&'static str] = &[
        "player_id",
        "team_id",
        "player",
        "team",
        "position",
        "age",
        "minutes",
        "games",
        "goals",
        "assists",
        "shots",
        "shots_on_target",
        "passes_completed",
        "passes",
        "passes_pct",
        "tackles",
        "interceptions",
        "clearances",
        "touches",
        "dispossessed",
        "xg",
        "xg_assist",
        "goals_per_game",
        "assists_per_game",
        "shot_efficiency",
        "sot_percentage",
        "goal_contributions",
        "contributions_per_game",
    ];
}

impl TableSchema for StandingRow {
    const COLUMNS: &'static [&'static str] = &[
        "group",
        "rank",
        "team_id",
        "team",
        "played",
        "wins",
        "draws",
        "losses",
        "goals_for",
        "goals_against",
        "points",
        "goal_difference",
        "win_percentage",
        "points_per_game",
        "goals_per_game",
        "clean_sheets",
    ];
}

pub fn intermediate_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(INTERMEDIATE_DIR)
}

pub fn write_table<T>(path: &Path, rows: &[T]) -> Result<usize>
where
    T: Serialize + TableSchema,
{
    let mut writer = io_utils::open_csv_writer(path)?;
    writer
        .write_record(T::COLUMNS)
        .with_context(|| format!("Writing header to {path:?}"))?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .serialize(row)
            .with_context(|| format!("Writing row {} to {path:?}", idx + 2))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(rows.len())
}

pub fn read_table<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned + TableSchema,
{
    let mut reader = io_utils::open_csv_reader_from_path(path, io_utils::DEFAULT_CSV_DELIMITER)
        .with_context(|| format!("Reading artifact {path:?}; run the preceding step first"))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Reading header of {path:?}"))?
        .clone();
    if !headers.iter().eq(T::COLUMNS.iter().copied()) {
        bail!(
            "Artifact {path:?} has unexpected columns; expected {}",
            T::COLUMNS.join(",")
        );
    }
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Parsing row {} of {path:?}", idx + 2)))
        .collect()
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Writing JSON to {path:?}"))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .with_context(|| format!("Writing {path:?}"))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Opening {path:?}"))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Parsing JSON in {path:?}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Validated,
    Unvalidated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub rows: usize,
    pub sha256: String,
}

/// Summary of the final tables: row counts, content digests, and whether the
/// validator accepted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub status: ManifestStatus,
    pub tables: Vec<ManifestEntry>,
}

/// Digest and record count of one output table as it sits on disk.
fn table_entry(out_dir: &Path, file: &str) -> Result<ManifestEntry> {
    let path = out_dir.join(file);
    let bytes = fs::read(&path).with_context(|| format!("Reading {path:?}"))?;
    let mut reader = io_utils::open_csv_reader(bytes.as_slice(), io_utils::DEFAULT_CSV_DELIMITER);
    let mut rows = 0usize;
    for record in reader.byte_records() {
        record.with_context(|| format!("Counting rows of {path:?}"))?;
        rows += 1;
    }
    Ok(ManifestEntry {
        file: file.to_string(),
        rows,
        sha256: format!("{:x}", Sha256::digest(&bytes)),
    })
}

impl Manifest {
    pub fn build(out_dir: &Path, status: ManifestStatus) -> Result<Self> {
        let tables = OUTPUT_TABLES
            .iter()
            .map(|file| table_entry(out_dir, file))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { status, tables })
    }

    pub fn save(&self, out_dir: &Path) -> Result<()> {
        write_json(&out_dir.join(MANIFEST_FILE), self)
    }

    pub fn load(out_dir: &Path) -> Result<Self> {
        read_json(&out_dir.join(MANIFEST_FILE))
    }

    /// Drops the manifest. Every step that rewrites files under `out_dir`
    /// calls this first.
    pub fn revoke(out_dir: &Path) -> Result<()> {
        let path = out_dir.join(MANIFEST_FILE);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Removing {path:?}"))?;
        }
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.status == ManifestStatus::Validated
    }

    /// Recomputes every table digest and row count and fails on the first
    /// table that no longer matches.
    pub fn verify(&self, out_dir: &Path) -> Result<()> {
        for file in OUTPUT_TABLES {
            let Some(recorded) = self.tables.iter().find(|entry| entry.file == *file) else {
                bail!("Manifest in {out_dir:?} does not list {file}");
            };
            let current = table_entry(out_dir, file)?;
            if current != *recorded {
                bail!("{file} in {out_dir:?} changed after it was validated");
            }
        }
        Ok(())
    }
}
