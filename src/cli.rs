use crate::{
    analytics::google::GoogleReportingApi,
    auth::{ServiceAccountKey, TokenSource},
    config::Config,
    http::build_client,
    notify,
    pii::PiiClassifier,
    pipeline::{work_items, Pipeline},
    storage::drive::DriveStorage,
    table::{report_filename, sanitize_value},
    upload::folder_name,
    util::{ensure_dir, iso_date, parse_iso_date, run_id, today, DateWindow},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use time::Date;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "ga-pii-report")]
#[command(about = "Weekly analytics PII sweep (paginated report fetch + regex classification + storage upload)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./ga-pii-report.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate config and credentials without touching the network.
    Check {},
    /// Print the work items, date window and destination folder.
    Plan {
        /// Run date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Classify values with the configured PII patterns.
    Classify {
        #[arg(long = "value", required = true)]
        values: Vec<String>,
    },
    /// Fetch, classify and upload every (view, dimension) pair.
    Run {
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Run date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Check {} => check(&cfg),
        Command::Plan { date } => plan(&cfg, run_date(date.as_deref())?),
        Command::Classify { values } => classify(&cfg, values),
        Command::Run { out_dir, date } => {
            run(&cfg, out_dir.as_deref(), run_date(date.as_deref())?)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("ga-pii-report.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("ga-pii-report.example.toml"))
    }
}

fn run_date(raw: Option<&str>) -> Result<Date> {
    raw.map(parse_iso_date).unwrap_or_else(|| Ok(today()))
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn check(cfg: &Config) -> Result<()> {
    let validation = cfg.validate().map_err(|e| format!("{e:#}"));
    let classifier = PiiClassifier::from_config(cfg).map(|_| ()).map_err(|e| format!("{e:#}"));
    let key = ServiceAccountKey::load(Path::new(&cfg.auth.key_file))
        .map(|k| k.client_email)
        .map_err(|e| format!("{e:#}"));

    let ok = validation.is_ok() && classifier.is_ok() && key.is_ok();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "ok": ok,
            "config": validation.err(),
            "pii_patterns": classifier.err(),
            "key_file": cfg.auth.key_file,
            "client_email": key.as_ref().ok(),
            "key_error": key.as_ref().err(),
        }))?
    );
    if ok {
        Ok(())
    } else {
        Err(anyhow!("check failed"))
    }
}

fn plan(cfg: &Config, run_date: Date) -> Result<()> {
    cfg.validate()?;
    let window = DateWindow::trailing(run_date, cfg.report.window_days);
    let items: Vec<_> = work_items(cfg)
        .into_iter()
        .map(|w| {
            serde_json::json!({
                "view_id": w.view.id,
                "view_name": w.view.name,
                "dimension": w.dimension.id,
                "dimension_label": w.dimension.label,
                "file": report_filename(&w.view.name, &w.dimension.label),
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "run_id": run_id(cfg, run_date),
            "window_start": iso_date(window.start),
            "window_end": iso_date(window.end),
            "page_size": cfg.effective_page_size(),
            "folder_name": folder_name(cfg, run_date)?,
            "parent_folder_id": cfg.storage.parent_folder_id,
            "units": items,
        }))?
    );
    Ok(())
}

fn classify(cfg: &Config, values: &[String]) -> Result<()> {
    let classifier = PiiClassifier::from_config(cfg)?;
    let rows: Vec<_> = values
        .iter()
        .map(|v| {
            let clean = sanitize_value(v);
            serde_json::json!({
                "value": clean,
                "pii": classifier.is_pii(&clean),
                "matched": classifier.first_match(&clean),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn run(cfg: &Config, out_override: Option<&Path>, run_date: Date) -> Result<()> {
    cfg.validate()?;

    let out_dir = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    ensure_dir(&out_dir)?;

    let key = ServiceAccountKey::load(Path::new(&cfg.auth.key_file))?;
    let token_http = build_client(cfg.analytics.timeout_seconds)?;
    let api = GoogleReportingApi::new(
        cfg,
        TokenSource::new(token_http.clone(), key.clone(), &cfg.auth.analytics_scope, &cfg.auth.token_uri),
    )?;
    let storage = DriveStorage::new(
        cfg,
        TokenSource::new(token_http, key, &cfg.auth.drive_scope, &cfg.auth.token_uri),
    )?;

    let pipeline = Pipeline::new(cfg, api, storage, run_date, &out_dir)
        .with_notifier(notify::from_config(cfg)?);
    let report = pipeline.run_batch()?;

    if !cfg.paths.summary_file.is_empty() {
        let path = PathBuf::from(&cfg.paths.summary_file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("write summary: {}", path.display()))?;
        info!("summary written to {}", path.display());
    }

    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(anyhow!(
            "{} of {} report(s) failed",
            failed,
            report.units.len()
        ));
    }
    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("ga-pii-report.log"))
}
