pub mod artifacts;
pub mod cli;
pub mod data;
pub mod derive;
pub mod error;
pub mod export;
pub mod io_utils;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod split;
pub mod table;
pub mod validate;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ExportArgs, PipelineArgs},
    loader::LoadOptions,
    pipeline::{Pipeline, PipelineOptions, PipelineState, StepSummary},
    validate::{ValidationConfig, ValidationReport},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("football_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(&args),
        Commands::Load(args) => handle_step(&args, pipeline::run_load),
        Commands::Register(args) => handle_step(&args, pipeline::run_register),
        Commands::Normalize(args) => handle_step(&args, pipeline::run_normalize),
        Commands::Split(args) => handle_step(&args, pipeline::run_split),
        Commands::Derive(args) => handle_step(&args, pipeline::run_derive),
        Commands::Validate(args) => handle_validate(&args),
        Commands::ExportJson(args) => handle_export(&args),
    }
}

fn pipeline_options(args: &PipelineArgs) -> Result<PipelineOptions> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let validation = ValidationConfig::load_or_default(args.config.as_deref())
        .with_context(|| format!("Loading validation config {:?}", args.config))?;
    debug!("Validation thresholds: {validation:?}");
    Ok(PipelineOptions {
        raw_dir: args.raw_dir.clone(),
        out_dir: args.out_dir.clone(),
        load: LoadOptions {
            encoding,
            delimiter: args.delimiter,
            league_season: args.league_season.clone(),
            tournament_season: args.tournament_season.clone(),
        },
        validation,
    })
}

fn handle_run(args: &PipelineArgs) -> Result<()> {
    let options = pipeline_options(args)?;
    info!(
        "Running pipeline from '{}' into '{}'",
        options.raw_dir.display(),
        options.out_dir.display()
    );
    let mut pipeline = Pipeline::new(options);
    let outcome = pipeline.run_all();
    info!("Pipeline finished in state {}", pipeline.state());
    print!("{}", pipeline.render_summary());
    let report = outcome?;
    finish(&report)
}

fn handle_step(
    args: &PipelineArgs,
    step: fn(&PipelineOptions) -> Result<StepSummary>,
) -> Result<()> {
    let options = pipeline_options(args)?;
    let summary = step(&options)?;
    info!("✓ {}: {} row(s), {}", summary.step, summary.rows, summary.detail);
    Ok(())
}

fn handle_validate(args: &PipelineArgs) -> Result<()> {
    let options = pipeline_options(args)?;
    let (report, summary) = pipeline::run_validate(&options)?;
    let state = if report.passed() {
        PipelineState::Validated
    } else {
        PipelineState::Failed
    };
    print!("{}", pipeline::render_summary(&[summary], state));
    finish(&report)
}

/// Prints every failed check and turns a failed report into an error.
fn finish(report: &ValidationReport) -> Result<()> {
    if !report.passed() {
        print!("{}", report.render_failures());
    }
    report.to_result()?;
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let written = export::export_validated(&args.out_dir, &args.json_dir)
        .with_context(|| format!("Exporting samples from {:?}", args.out_dir))?;
    for path in written {
        info!("✓ Wrote {}", path.display());
    }
    Ok(())
}
