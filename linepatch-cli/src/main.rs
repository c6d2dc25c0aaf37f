mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger, MergedConfig};
use fs_err as fs;
use linepatch_core::adapters::{
    CommandTypeChecker, FsSchemaProvider, NoTypeCheck, NoopEventSink, WebhookEventSink,
};
use linepatch_core::notifier::send_diagnostic;
use linepatch_core::ports::{EventSink, TypeChecker};
use linepatch_core::settings::{ApplySettings, DEFAULT_ORCHESTRATOR_URL};
use linepatch_core::{Orchestrator, PatchError};
use linepatch_render::render_batch_md;
use linepatch_types::batch::PatchBatch;
use linepatch_types::wire::BatchV1;
use std::io::Read;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "linepatch",
    version,
    about = "Apply line-addressed patch batches to source files with auditable diffs."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a batch document and print the result as JSON.
    Apply(ApplyArgs),
    /// Parse a batch and check it against the task schema without applying it.
    Validate(ValidateArgs),
    /// Send one diagnostic event to the orchestrator and exit.
    NotifyTest(NotifyTestArgs),
}

#[derive(Debug, Parser)]
struct ApplyArgs {
    /// Batch document (JSON). Use `-` for stdin.
    batch: Utf8PathBuf,

    /// Compute results and diffs without writing any file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Project root; operation paths resolve under it (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Orchestrator base URL for lifecycle events.
    #[arg(long, env = "ORCHESTRATOR_URL")]
    orchestrator_url: Option<String>,

    /// Do not send lifecycle events.
    #[arg(long, default_value_t = false)]
    no_notify: bool,

    /// Write each diff to this directory and send its path instead of the text.
    #[arg(long)]
    diff_dir: Option<Utf8PathBuf>,

    /// Skip the external type checker.
    #[arg(long, default_value_t = false)]
    no_type_check: bool,

    /// Also write the result JSON to this file.
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Write a markdown summary to this file.
    #[arg(long)]
    summary_md: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ValidateArgs {
    /// Batch document (JSON). Use `-` for stdin.
    batch: Utf8PathBuf,

    /// Project root holding the task schema (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct NotifyTestArgs {
    /// Orchestrator base URL.
    #[arg(long, env = "ORCHESTRATOR_URL")]
    orchestrator_url: Option<String>,

    /// Project root holding linepatch.toml (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,
}

fn main() -> ExitCode {
    init_tracing();

    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<PatchError>()
                .map(PatchError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn real_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Validate(args) => cmd_validate(args),
        Command::NotifyTest(args) => cmd_notify_test(args),
    }
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<ExitCode> {
    let batch = load_batch(&args.batch)?;
    let merged = merged_config(
        &args.project_root,
        &CliOverrides {
            orchestrator_url: args.orchestrator_url.clone(),
            no_notify: args.no_notify,
            diff_dir: args.diff_dir.clone(),
            no_type_check: args.no_type_check,
        },
    )?;
    debug!(?merged, "merged config");

    let schema = FsSchemaProvider::new(args.project_root.join(&merged.schema.path));
    let events = event_sink(&merged)?;
    let checker: Box<dyn TypeChecker> = if merged.typecheck.enabled {
        Box::new(CommandTypeChecker::from_settings(&merged.typecheck))
    } else {
        Box::new(NoTypeCheck)
    };
    let diff_dir = merged
        .notify
        .diff_dir
        .as_ref()
        .map(|dir| args.project_root.join(dir));

    let orchestrator = Orchestrator::new(ApplySettings {
        project_root: args.project_root.clone(),
        dry_run: args.dry_run,
    })
    .with_schema(&schema)
    .with_events(events.as_ref(), diff_dir)
    .with_type_checker(checker.as_ref());

    let result = orchestrator.apply_batch(&batch)?;

    let json = serde_json::to_string_pretty(&result).context("serialize result")?;
    println!("{json}");
    if let Some(out) = &args.out {
        write_file(out, &json)?;
    }
    if let Some(md) = &args.summary_md {
        write_file(md, &render_batch_md(&result))?;
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let batch = load_batch(&args.batch)?;
    let merged = merged_config(&args.project_root, &CliOverrides::default())?;
    let schema = FsSchemaProvider::new(args.project_root.join(&merged.schema.path));

    Orchestrator::new(ApplySettings {
        project_root: args.project_root.clone(),
        dry_run: true,
    })
    .with_schema(&schema)
    .validate(&batch)?;

    println!("batch is valid ({} operations)", batch.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_notify_test(args: NotifyTestArgs) -> anyhow::Result<ExitCode> {
    let merged = merged_config(
        &args.project_root,
        &CliOverrides {
            orchestrator_url: args.orchestrator_url,
            ..CliOverrides::default()
        },
    )?;
    let sink = WebhookEventSink::new(
        &merged.notify.url,
        Duration::from_secs(merged.notify.timeout_secs),
    )?;

    send_diagnostic(&sink)?;
    println!("diagnostic event sent to {}", sink.endpoint());
    Ok(ExitCode::SUCCESS)
}

fn merged_config(project_root: &Utf8Path, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
    let file_config =
        config::load_or_default(project_root).context("load linepatch.toml config")?;
    Ok(ConfigMerger::new(file_config).merge(cli))
}

fn event_sink(merged: &MergedConfig) -> anyhow::Result<Box<dyn EventSink>> {
    if !merged.notify.enabled {
        debug!("notifications disabled");
        return Ok(Box::new(NoopEventSink));
    }
    let url = if merged.notify.url.is_empty() {
        DEFAULT_ORCHESTRATOR_URL
    } else {
        merged.notify.url.as_str()
    };
    info!(url, "sending lifecycle events");
    Ok(Box::new(WebhookEventSink::new(
        url,
        Duration::from_secs(merged.notify.timeout_secs),
    )?))
}

fn load_batch(path: &Utf8Path) -> anyhow::Result<PatchBatch> {
    let raw = if path.as_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read batch from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("read batch {}", path))?
    };
    let wire: BatchV1 =
        serde_json::from_str(&raw).with_context(|| format!("parse batch {}", path))?;
    PatchBatch::try_from(wire).with_context(|| format!("invalid batch {}", path))
}

fn write_file(path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path))
}
