use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize football league and tournament data into validated relational tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every step from raw files to validated tables
    Run(PipelineArgs),
    /// Step 1: read raw sources into clean intermediate tables
    Load(PipelineArgs),
    /// Step 2: assign team and player ids and write the reference tables
    Register(PipelineArgs),
    /// Step 3: replace team and player names with registry ids
    Normalize(PipelineArgs),
    /// Step 4: split matches into base and advanced tables
    Split(PipelineArgs),
    /// Step 5: compute derived metrics and write the final tables
    Derive(PipelineArgs),
    /// Step 6: validate the final tables and write the report and manifest
    Validate(PipelineArgs),
    /// Write JSON samples of validated tables for frontend development
    ExportJson(ExportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PipelineArgs {
    /// Directory holding the raw sources (leagues/ and world_cup/)
    #[arg(long = "raw-dir", default_value = "data/raw")]
    pub raw_dir: PathBuf,
    /// Directory receiving the final tables, report and manifest
    #[arg(short = 'o', long = "out-dir", default_value = "data/clean")]
    pub out_dir: PathBuf,
    /// YAML file overriding validation thresholds
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Character encoding of the raw files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Delimiter for raw files (supports ',', 'tab', ';', '|'); inferred from the extension when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Season label stamped on league matches
    #[arg(long = "league-season", default_value = crate::loader::LEAGUE_SEASON)]
    pub league_season: String,
    /// Season label stamped on tournament matches
    #[arg(long = "tournament-season", default_value = crate::loader::TOURNAMENT_SEASON)]
    pub tournament_season: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Directory holding validated output tables
    #[arg(short = 'o', long = "out-dir", default_value = "data/clean")]
    pub out_dir: PathBuf,
    /// Directory receiving the JSON sample files
    #[arg(long = "json-dir", default_value = "data/json_samples")]
    pub json_dir: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn step_commands_share_defaults() {
        let cli = Cli::parse_from(["football-etl", "validate", "--config", "limits.yml"]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.out_dir, PathBuf::from("data/clean"));
                assert_eq!(args.config, Some(PathBuf::from("limits.yml")));
                assert_eq!(args.league_season, "2022-23");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
