use anyhow::{bail, Result};
use chrono::Local;
use royalty_normalizer::{
    output, CleanOutcome, Engine, PipelineConfig, ReportDate, RuleBook, SourceConfig,
};
use std::{env, path::Path};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) load + check config ──────────────────────────────────────
    let config_path = env::var("PIPELINE_CONFIG").unwrap_or_else(|_| "pipeline.yaml".to_string());
    let cfg = PipelineConfig::load(&config_path)?;
    info!("{} sources configured in {}", cfg.sources.len(), config_path);
    for problem in cfg.validate() {
        warn!("config: {}", problem);
    }

    // ─── 3) the reporting period ─────────────────────────────────────
    let date = ReportDate::from_today(Local::now().date_naive());
    info!(period = %date.iso, month = %date.month, "report date");

    let root = Path::new(".");
    let engine = Engine::new(root, RuleBook::builtin().with_overrides(&cfg.rules));

    // ─── 4) one source at a time; a failure only skips that source ───
    let mut failed = Vec::new();
    for source in &cfg.sources {
        info!("processing source: {}", source.name);
        if let Err(e) = process_source(&engine, &cfg, source, &date, root) {
            error!(source = %source.name, "failed: {:#}", e);
            failed.push(source.name.clone());
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} sources failed: {}", failed.len(), cfg.sources.len(), failed.join(", "));
    }
    info!("all done");
    Ok(())
}

fn process_source(
    engine: &Engine,
    cfg: &PipelineConfig,
    source: &SourceConfig,
    date: &ReportDate,
    root: &Path,
) -> Result<()> {
    let (table, bad_records, inputs) = match engine.run(source, date)? {
        CleanOutcome::NoData => {
            info!("no files found for pattern: {}", source.pattern);
            return Ok(());
        }
        CleanOutcome::Completed {
            table,
            bad_records,
            inputs,
        } => (table, bad_records, inputs),
    };

    output::publish(
        cfg,
        &source.name,
        &date.month,
        root,
        &table,
        bad_records.as_ref(),
        &inputs,
    )
}
