use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use csbind_gen::{NoteKind, PackageSources};
use csbind_utils::logger;
use tracing::debug;

use crate::config::Config;
use crate::driver;
use crate::version::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "csbind",
    version = VERSION,
    about = "Generates native export shims and managed wrappers from a class model"
)]
pub struct CsbindCli {
    #[arg(short, long, global = true)]
    /// Log exclusions and other details while generating.
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl CsbindCli {
    pub const fn command(&self) -> &Command {
        &self.command
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generates native and managed sources for the model.
    Generate {
        model: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory; `Native/` and `Managed/` are created inside.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Restrict generation to these packages.
        #[arg(short, long = "package")]
        packages: Vec<String>,
        /// Apply the omission rules of this platform.
        #[arg(long)]
        platform: Option<String>,
    },
    /// Runs generation without writing and reports what was left out.
    Check {
        model: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        platform: Option<String>,
    },
    /// Lists every exported symbol.
    Symbols {
        model: PathBuf,
        #[arg(short, long = "package")]
        packages: Vec<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = CsbindCli::parse();
    logger::init_logging(cli.verbose);
    debug!(?cli, "parsed command line");
    match &cli.command {
        Command::Generate {
            model,
            config,
            out,
            packages,
            platform,
        } => handle_generate(
            model,
            config.as_deref(),
            out.as_deref(),
            packages,
            platform.as_deref(),
        ),
        Command::Check {
            model,
            config,
            platform,
        } => handle_check(&cli, model, config.as_deref(), platform.as_deref()),
        Command::Symbols { model, packages } => handle_symbols(model, packages),
    }
}

fn handle_generate(
    model_path: &Path,
    config: Option<&Path>,
    out: Option<&Path>,
    packages: &[String],
    platform: Option<&str>,
) -> Result<()> {
    let config = Config::discover(config, model_path)?;
    let options = config.options_for(platform)?;
    let model = driver::load_model(model_path)?;
    let sources = driver::generate(&model, options, packages)?;

    let out = config.output_dir(out);
    let written = driver::write_sources(&out, &sources)?;
    for path in &written {
        println!("{} {}", "wrote".green().bold(), path.display());
    }
    print_summary(&sources);
    Ok(())
}

fn handle_check(
    cli: &CsbindCli,
    model_path: &Path,
    config: Option<&Path>,
    platform: Option<&str>,
) -> Result<()> {
    let config = Config::discover(config, model_path)?;
    let options = config.options_for(platform)?;
    let model = driver::load_model(model_path)?;
    let sources = driver::generate(&model, options, &[])?;

    for package in &sources {
        println!("{} {}", "package".bold(), package.package);
        for note in &package.notes {
            if note.is_expected() && !cli.verbose {
                continue;
            }
            let tag = match note.kind {
                NoteKind::Excluded(_) => "excluded".yellow(),
                NoteKind::FallbackConstructor => "note".cyan(),
            };
            println!("  {tag} {note}");
        }
    }
    print_summary(&sources);
    Ok(())
}

fn handle_symbols(model_path: &Path, packages: &[String]) -> Result<()> {
    let config = Config::discover(None, model_path)?;
    let model = driver::load_model(model_path)?;
    let sources = driver::generate(&model, config.options_for(None)?, packages)?;
    for package in &sources {
        println!("{}", package.package.bold());
        for symbol in &package.symbols {
            println!("  {symbol}");
        }
    }
    Ok(())
}

fn print_summary(sources: &[PackageSources]) {
    let classes: usize = sources.iter().map(|package| package.classes).sum();
    let symbols: usize = sources.iter().map(|package| package.symbols.len()).sum();
    let excluded = sources
        .iter()
        .flat_map(|package| &package.notes)
        .filter(|note| matches!(note.kind, NoteKind::Excluded(_)))
        .count();
    println!(
        "{} {} packages, {classes} classes, {symbols} symbols, {excluded} members excluded",
        "done".green().bold(),
        sources.len()
    );
}
