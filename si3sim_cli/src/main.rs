use clap::error::ErrorKind as UsageError;
use clap::{Args, CommandFactory, Parser, Subcommand};
use si3sim_core::*;
use std::fs::File;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "si3sim")]
#[command(version)]
#[command(about = "Si3 measurement schedule simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Schedule document (JSON); generates when no subcommand is given
    config: Option<PathBuf>,

    /// Sample stream destination (CSV)
    output: Option<PathBuf>,

    #[command(flatten)]
    generate: GenerateArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (defaults to $XDG_CONFIG_HOME/si3sim/config.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Write timestamps as milliseconds since the Unix epoch
    #[arg(long)]
    epoch_millis: bool,

    /// Write calendar timestamps as YYMMDD HHMMSS
    #[arg(long, conflicts_with = "epoch_millis")]
    no_delimiters: bool,

    /// Fractional digits for sample values
    #[arg(long)]
    value_decimals: Option<u32>,

    /// Name of the value column
    #[arg(long)]
    series_name: Option<String>,

    /// Continue from where the previous run stopped
    #[arg(long)]
    resume: bool,

    /// Save the updated schedule here instead of rewriting CONFIG
    #[arg(long)]
    record: Option<PathBuf>,
}

impl GenerateArgs {
    fn output_options(&self, settings: &Settings) -> OutputOptions {
        let mut options = settings.output_options();
        if self.epoch_millis {
            options.timestamps = TimestampFormat::EpochMillis;
            if settings.output.value_decimals.is_none() {
                options.value_decimals = options.timestamps.default_value_decimals();
            }
        }
        if self.no_delimiters {
            if let TimestampFormat::Calendar { decimals, .. } = options.timestamps {
                options.timestamps = TimestampFormat::Calendar {
                    delimiters: false,
                    decimals,
                };
            }
        }
        if let Some(digits) = self.value_decimals {
            options.value_decimals = digits;
        }
        if let Some(name) = &self.series_name {
            options.series_name = name.clone();
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the sample stream for a schedule (the default)
    Generate {
        /// Schedule document (JSON)
        config: PathBuf,

        /// Sample stream destination (CSV)
        output: PathBuf,

        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Check a schedule without generating anything
    Validate {
        config: PathBuf,
    },

    /// List the runs recorded in a schedule
    History {
        config: PathBuf,
    },

    /// Write a starter schedule document
    Init {
        config: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("si3sim: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    si3sim_core::logging::init_for_verbosity(&settings.logging.level, cli.verbose);

    match cli.command {
        Some(Commands::Generate {
            config,
            output,
            args,
        }) => generate(&config, &output, &args, &settings),
        Some(Commands::Validate { config }) => cmd_validate(&config),
        Some(Commands::History { config }) => cmd_history(&config),
        Some(Commands::Init { config, force }) => cmd_init(&config, force),
        None => {
            let (config, output) = match (cli.config, cli.output) {
                (Some(config), Some(output)) => (config, output),
                _ => Cli::command()
                    .error(
                        UsageError::MissingRequiredArgument,
                        "<CONFIG> and <OUTPUT> are required when no subcommand is given",
                    )
                    .exit(),
            };
            generate(&config, &output, &cli.generate, &settings)
        }
    }
}

fn generate(config: &Path, output: &Path, args: &GenerateArgs, settings: &Settings) -> Result<()> {
    let options = args.output_options(settings);
    let record_path = args.record.clone().unwrap_or_else(|| config.to_path_buf());
    cmd_generate(config, output, &record_path, options, args.resume)
}

fn cmd_generate(
    config_path: &Path,
    output: &Path,
    record_path: &Path,
    options: OutputOptions,
    resume: bool,
) -> Result<()> {
    tracing::debug!("Output options: {:?}", options);
    let config = ScheduleConfig::load_from(config_path)?;
    let previous = config.last_run_record().cloned();

    // Reject a bad schedule before the output file is touched
    let mut engine = ScheduleEngine::new(config)?;

    if resume {
        let cursor = previous
            .as_ref()
            .and_then(RunRecord::next_cursor)
            .ok_or_else(|| Error::Validation("no previous run to resume from".into()))?;
        engine.resume_at(cursor)?;
    }

    let file = File::create(output)?;
    let mut sink = CsvSampleSink::new(BufWriter::new(file), options)?;

    let args: Vec<String> = std::env::args().collect();
    let record = RunRecord::begin(output.display().to_string(), previous.as_ref())
        .with_command_line(args.join(" "));

    let summary = run_to_completion(&mut engine, record_path, record, |engine| {
        engine.generate(&mut sink)
    })?;

    let file = sink
        .into_inner()?
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    file.sync_all()?;

    println!(
        "✓ Wrote {} samples from {} windows to {}",
        summary.samples,
        summary.windows,
        output.display()
    );
    println!("  Next cursor: {}", summary.cursor);
    println!("  Run recorded in {}", record_path.display());

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    let mut config = ScheduleConfig::load_from(config_path)?;
    config.check()?;
    println!("OK");
    Ok(())
}

fn cmd_history(config_path: &Path) -> Result<()> {
    let config = ScheduleConfig::load_from(config_path)?;
    let history = config.run_history();

    if history.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }

    for record in history {
        println!(
            "{}  {}  {}  {:<7}  {}",
            record.run_id,
            record.start_time,
            record.end_time,
            if record.clean_run { "clean" } else { "UNCLEAN" },
            record.output_file
        );
    }
    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(Error::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", config_path.display()),
        )));
    }

    let mut config = ScheduleConfig::new(
        RecurrencePeriod::Daily,
        "2024-01-01T00:00:00Z".parse()?,
        "2024-01-02T00:00:00Z".parse()?,
    );
    config.add_window(MeasurementWindow::new(
        0,
        ClockTime::midnight(),
        ClockTime::from_hms(23, 59, 59)?,
        3600,
    ));
    config.save_to(config_path)?;

    println!("✓ Wrote starter schedule to {}", config_path.display());
    Ok(())
}
