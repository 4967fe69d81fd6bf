use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use onomasticon::config::DERIVED_SUBDIR;
use onomasticon::dataset::Dataset;
use onomasticon::glyssen::GLYSSEN;
use onomasticon::theographic::THEOGRAPHIC;
use onomasticon::tipnr::TIPNR;
use onomasticon::{run, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "onomasticon")]
#[command(about = "Normalise Bible proper-name datasets into one identifier space")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Glyssen character and verse control files
    Glyssen(RunArgs),
    /// STEPBible Tyndale Individualised Proper Names (TIPNR)
    Tipnr(RunArgs),
    /// Theographic Bible Data CSV tables
    Theographic(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Folder holding the source files (default: the dataset's usual folder, probed upwards)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output folder (default: <input>/derivedFiles)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep identifiers without category letters and skip the merged outputs
    #[arg(long)]
    no_prefix: bool,

    /// Also write XML copies of the normalised tables
    #[arg(long)]
    xml: bool,

    /// Skip the raw and mid snapshots
    #[arg(long)]
    skip_snapshots: bool,
}

impl RunArgs {
    fn into_config(self, dataset: &Dataset) -> RunConfig {
        let input_dir = self
            .input
            .unwrap_or_else(|| PathBuf::from(dataset.default_input));
        let output_dir = self
            .output
            .unwrap_or_else(|| input_dir.join(DERIVED_SUBDIR));
        RunConfig {
            input_dir,
            output_dir,
            prefix: !self.no_prefix,
            xml: self.xml,
            snapshots: !self.skip_snapshots,
        }
    }
}

fn run_dataset(dataset: &Dataset, args: RunArgs) -> Result<()> {
    let config = args.into_config(dataset);
    let start = Instant::now();
    let stats = run(dataset, &config)?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Dataset:            {}", dataset.name);
    println!("Output folder:      {}", config.output_dir.display());
    println!("Total time:         {:.2}s", duration.as_secs_f64());
    println!();
    println!("Rows loaded:        {}", stats.rows());
    println!("Malformed rows:     {}", stats.malformed_rows());
    println!("Records dropped:    {}", stats.dropped());
    println!("Values cleaned:     {}", stats.cleaned());
    println!("Records identified: {}", stats.identified());
    println!("Disambiguated:      {}", stats.disambiguated());
    println!("Families resolved:  {}", stats.families());
    println!("Family ties:        {}", stats.ties());
    println!("Renamed:            {}", stats.renamed());
    println!("Verse references:   {}", stats.verses());
    println!("Links rewritten:    {}", stats.links());
    println!("Broken links:       {}", stats.broken_links());
    println!("Unparsed notes:     {}", stats.translation_fallbacks());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Glyssen(args) => run_dataset(&GLYSSEN, args),
        Commands::Tipnr(args) => run_dataset(&TIPNR, args),
        Commands::Theographic(args) => run_dataset(&THEOGRAPHIC, args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
