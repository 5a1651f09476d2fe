use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use fs_err as fs;
use pyfix_core::render::{render_patch, render_summary_md};
use pyfix_core::settings::RunSettings;
use pyfix_registry::{PluginOrigin, Registry};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pyfix",
    version,
    about = "Plan-driven rewrite engine for Python source files."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a plan over target files (default: dry-run).
    Run(RunArgs),
    /// Validate a plan document against the registered plugins.
    Validate(ValidateArgs),
    /// List registered transformers.
    Plugins(PluginsArgs),
    /// Show the unified diff a plan would produce for one file.
    Preview(PreviewArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Path to the plan document (JSON).
    #[arg(long)]
    plan: Utf8PathBuf,

    /// Target files, processed in the order given.
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    /// Write changes to disk. If omitted, runs a dry-run.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Directory scanned for plugin manifests.
    #[arg(long, default_value = "pyfix-plugins")]
    plugin_dir: Utf8PathBuf,

    /// Suffix appended to a file's path for its backup.
    #[arg(long, default_value = ".pyfix.bak")]
    backup_suffix: String,

    /// Emit the run summary as JSON instead of markdown.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ValidateArgs {
    /// Path to the plan document (JSON).
    #[arg(long)]
    plan: Utf8PathBuf,

    /// Directory scanned for plugin manifests.
    #[arg(long, default_value = "pyfix-plugins")]
    plugin_dir: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct PluginsArgs {
    /// Directory scanned for plugin manifests.
    #[arg(long, default_value = "pyfix-plugins")]
    plugin_dir: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct PreviewArgs {
    /// Path to the plan document (JSON).
    #[arg(long)]
    plan: Utf8PathBuf,

    /// File to preview.
    file: Utf8PathBuf,

    /// Directory scanned for plugin manifests.
    #[arg(long, default_value = "pyfix-plugins")]
    plugin_dir: Utf8PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Plugins(args) => cmd_plugins(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn load_plan(path: &Utf8PathBuf, registry: &Registry) -> anyhow::Result<pyfix_types::plan::TransformationPlan> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path))?;
    pyfix_plan::parse_plan(&bytes, &registry.keys())
        .with_context(|| format!("load plan {}", path))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let registry = Registry::discover(args.plugin_dir);
    let plan = load_plan(&args.plan, &registry)?;

    let mut settings = RunSettings::default();
    settings.dry_run = !args.apply;
    settings.backup_suffix = args.backup_suffix;

    let summary = pyfix_core::run(&plan, &registry, &args.files, &settings);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary).context("serialize summary")?);
    } else {
        print!("{}", render_summary_md(&summary));
    }

    if summary.files_failed > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::from(0))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let registry = Registry::discover(args.plugin_dir);
    let plan = load_plan(&args.plan, &registry)?;

    println!(
        "plan `{}` is valid ({} step(s))",
        plan.name,
        plan.transformations.len()
    );
    Ok(ExitCode::from(0))
}

fn cmd_plugins(args: PluginsArgs) -> anyhow::Result<ExitCode> {
    let registry = Registry::discover(args.plugin_dir);

    match args.format {
        OutputFormat::Json => {
            let listing: Vec<serde_json::Value> = registry
                .entries()
                .map(|entry| {
                    let info = entry.transformer.metadata();
                    serde_json::json!({
                        "key": entry.key,
                        "name": info.name,
                        "description": info.description,
                        "version": info.version,
                        "author": info.author,
                        "category": info.category.label(),
                        "builtin": entry.origin == PluginOrigin::Builtin,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing).context("serialize listing")?);
        }
        OutputFormat::Text => {
            for entry in registry.entries() {
                let info = entry.transformer.metadata();
                let origin = match &entry.origin {
                    PluginOrigin::Builtin => "builtin".to_string(),
                    PluginOrigin::Manifest(path) => path.to_string(),
                };
                println!(
                    "{:<24} {:<16} {} — {} [{}]",
                    entry.key,
                    info.category.label(),
                    info.name,
                    info.description,
                    origin
                );
            }
            for (path, err) in registry.load_failures() {
                eprintln!("warning: {path}: {err}");
            }
        }
    }
    Ok(ExitCode::from(0))
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<ExitCode> {
    let registry = Registry::discover(args.plugin_dir);
    let plan = load_plan(&args.plan, &registry)?;

    let source = fs::read_to_string(&args.file)?;
    let (transformed, steps, failure) =
        pyfix_core::transform_source(&plan, &registry, &source);

    for step in &steps {
        if let Some(message) = &step.message {
            eprintln!("step {}: {}", step.index, message);
        }
    }

    if let Some(failure) = failure {
        eprintln!("preview failed: {failure:?}");
        return Ok(ExitCode::from(1));
    }

    let patch = render_patch(args.file.as_str(), &source, &transformed);
    if patch.is_empty() {
        println!("no changes for {}", args.file);
    } else {
        print!("{patch}");
    }
    Ok(ExitCode::from(0))
}
