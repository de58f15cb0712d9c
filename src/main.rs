use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vinventory::config::{ConfigFile, PipelineOptions};
use vinventory::io::json::write_summary_json;
use vinventory::model::UnitConvention;
use vinventory::pipeline;
use vinventory::resolve::CanonicalField;
use vinventory::{Result, ToolError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Process(args) => execute_process(args),
        Command::Columns(args) => execute_columns(args),
    }
}

fn execute_process(args: ProcessArgs) -> Result<()> {
    ensure_exists(&args.source.input)?;
    let options = args.source.options()?;

    let output = pipeline::process_workbook(&args.source.input, &args.output, options)?;

    if let Some(path) = &args.summary_json {
        write_summary_json(path, &output.inventory, &output.report, args.include_rows)?;
    }

    println!(
        "Wrote {} VMs to {}",
        output.inventory.len(),
        args.output.display()
    );
    Ok(())
}

fn execute_columns(args: SourceArgs) -> Result<()> {
    ensure_exists(&args.input)?;
    let options = args.options()?;
    let resolution = pipeline::inspect_columns(&args.input, &options)?;

    for field in CanonicalField::ALL {
        println!("{:<40} <- {}", field.canonical_name(), resolution.column(field));
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::MissingInput(path.to_path_buf()))
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Normalise RVTools exports into a server list with a migration summary."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the ServerList and Summary workbook.
    Process(ProcessArgs),
    /// Show which source column each field resolves to.
    Columns(SourceArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Input workbook path (xlsx, xls or ods).
    #[arg(long)]
    input: PathBuf,

    /// Sheet holding the VM inventory.
    #[arg(long)]
    sheet: Option<String>,

    /// Disk unit convention.
    #[arg(long, value_enum)]
    units: Option<UnitsArg>,

    /// JSON configuration file with sheet names, units and extra synonyms.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ProcessArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Also write the evaluated summary as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Include the inventory rows in the JSON summary.
    #[arg(long, requires = "summary_json")]
    include_rows: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitsArg {
    /// MiB / 1024, labelled GiB.
    BinaryGib,
    /// MiB / 953.7, labelled GB.
    DecimalGb,
}

impl From<UnitsArg> for UnitConvention {
    fn from(arg: UnitsArg) -> Self {
        match arg {
            UnitsArg::BinaryGib => UnitConvention::BinaryGib,
            UnitsArg::DecimalGb => UnitConvention::DecimalGb,
        }
    }
}

impl SourceArgs {
    /// Defaults, then the config file, then command-line flags.
    fn options(&self) -> Result<PipelineOptions> {
        let mut options = PipelineOptions::default();
        if let Some(path) = &self.config {
            ensure_exists(path)?;
            ConfigFile::load(path)?.apply(&mut options);
        }
        if let Some(sheet) = &self.sheet {
            options.source_sheet = sheet.clone();
        }
        if let Some(units) = self.units {
            options.units = units.into();
        }
        Ok(options)
    }
}
