use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use modplan::discovery::ModDiscoverer;
use modplan::locator::{ExplodedDirLocator, ExplodedEntry, LocatorConfig, ModsFolderLocator, SearchPathLocator};
use modplan::progress::LogProgress;
use modplan::report::LoadPlan;
use modplan::runtime::RealRuntime;

/// modplan - mod discovery and load planning
///
/// Scans the configured sources for loadable mod packages, resolves embedded
/// dependencies and prints the resulting load plan.
///
/// Examples:
///   modplan plan --mods-dir ./mods
///   modplan check --mods-dir ./mods --path dev/core.zip --launch-target clientdev
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Folder(s) to scan for packaged mods (also via MODPLAN_MODS_DIR)
    #[arg(
        long = "mods-dir",
        env = "MODPLAN_MODS_DIR",
        value_name = "DIR",
        global = true
    )]
    pub mods_dirs: Vec<PathBuf>,

    /// Individual package file(s), search-path style (dev targets only)
    #[arg(long = "path", value_name = "FILE", global = true)]
    pub paths: Vec<PathBuf>,

    /// Exploded mod directory root(s), NAME=DIR
    #[arg(long = "exploded", value_name = "NAME=DIR", global = true)]
    pub exploded: Vec<String>,

    /// Path(s) no locator may report
    #[arg(long = "exclude", value_name = "PATH", global = true)]
    pub excluded: Vec<PathBuf>,

    /// Launch target name; enables dev-only discovery sources
    #[arg(long = "launch-target", value_name = "NAME", global = true)]
    pub launch_target: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the ordered load plan with provenance
    Plan,

    /// Run the pipeline and report only the summary
    Check,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let plan = match run_pipeline(&cli) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Plan => print_plan(&plan),
        Commands::Check => print_summary(&plan),
    }

    if plan.is_fatal() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn run_pipeline(cli: &Cli) -> Result<LoadPlan> {
    let mut discoverer = ModDiscoverer::new()
        .with_config(LocatorConfig { launch_target: cli.launch_target.clone() });

    for dir in &cli.mods_dirs {
        discoverer = discoverer.with_locator(Box::new(ModsFolderLocator::new(dir)));
    }
    if !cli.paths.is_empty() {
        discoverer =
            discoverer.with_locator(Box::new(SearchPathLocator::new(cli.paths.clone())));
    }
    let exploded = parse_exploded(&cli.exploded)?;
    if !exploded.is_empty() {
        discoverer = discoverer.with_locator(Box::new(ExplodedDirLocator::new(exploded)));
    }
    for path in &cli.excluded {
        discoverer = discoverer.exclude(path.clone());
    }

    Ok(discoverer.discover_and_validate(&RealRuntime, &LogProgress, |_| Ok(())))
}

fn parse_exploded(values: &[String]) -> Result<Vec<ExplodedEntry>> {
    values
        .iter()
        .map(|value| {
            let (name, dir) = value.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("invalid --exploded value `{value}`, expected NAME=DIR")
            })?;
            Ok(ExplodedEntry::new(name, vec![PathBuf::from(dir)]))
        })
        .collect()
}

fn print_plan(plan: &LoadPlan) {
    println!("Load plan ({} file(s)):", plan.files().len());
    for file in plan.files() {
        println!("  {:<12} {} {}", file.kind.to_string(), file.display_id(), file.attributes);
    }
    print_summary(plan);
}

fn print_summary(plan: &LoadPlan) {
    for warning in plan.warnings() {
        println!("warning: {warning}");
    }
    for error in plan.errors() {
        println!("error: {error}");
    }
    println!(
        "{} mod resource(s), {} library resource(s), {} warning(s), {} error(s)",
        plan.mod_resources().len(),
        plan.library_resources().len(),
        plan.warnings().len(),
        plan.errors().len()
    );
}
