//! Command-line host: mount a product, report preflight, export every side.

use clap::Parser;
use printsurface_app::{
    ActionOutcome, AppConfig, AppError, ControlAction, DirectoryHost, Editor, ShortcutRegistry,
    format_report, load_snapshot, load_spec,
};
use printsurface_core::{SideId, Stage};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Preflight and export a print design.
#[derive(Parser, Debug)]
#[command(name = "printsurface")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print spec JSON describing the product
    #[arg(long, required_unless_present = "shortcuts")]
    spec: Option<PathBuf>,

    /// Stored side design, as SIDE=PATH (repeatable)
    #[arg(long = "snapshot", value_parser = parse_snapshot_arg)]
    snapshots: Vec<(SideId, PathBuf)>,

    /// Application config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Only print the preflight report
    #[arg(long)]
    check: bool,

    /// Refuse to export while any side has errors (overrides config)
    #[arg(long)]
    strict: bool,

    /// List keyboard shortcuts and exit
    #[arg(long)]
    shortcuts: bool,
}

fn parse_snapshot_arg(arg: &str) -> Result<(SideId, PathBuf), String> {
    match arg.split_once('=') {
        Some((side, path)) if !side.is_empty() && !path.is_empty() => {
            Ok((side.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected SIDE=PATH, got '{arg}'")),
    }
}

fn run(cli: Cli) -> Result<bool, AppError> {
    if cli.shortcuts {
        ShortcutRegistry::print_all();
        return Ok(true);
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    if cli.strict {
        config.refuse_export_on_errors = true;
    }

    let Some(spec_path) = cli.spec else {
        return Ok(true);
    };
    let spec = load_spec(&spec_path)?;
    let snapshots = cli
        .snapshots
        .into_iter()
        .map(|(side, path)| load_snapshot(side, &path))
        .collect::<Result<Vec<_>, _>>()?;
    let stage = Stage::mount_with_snapshots(Arc::new(spec), config.editor.clone(), snapshots)?;

    let reports = stage.preflight_all_sides()?;
    print!("{}", format_report(&reports));
    let clean = !reports
        .iter()
        .flat_map(|r| &r.warnings)
        .any(|w| w.is_blocking());
    if cli.check {
        return Ok(clean);
    }

    let host = DirectoryHost::new(&config.output_dir);
    let mut editor = Editor::new(stage, host, &config);
    if let ActionOutcome::Exported(bundle) = editor.handle(ControlAction::Export)? {
        println!(
            "Exported {} side(s) to {}",
            bundle.exports.len(),
            editor.host().dir().display()
        );
    }
    editor.handle(ControlAction::Close)?;
    Ok(clean)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting printsurface");

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
