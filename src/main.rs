use clap::{ArgAction, Parser, Subcommand};
use pixpress::config::{self, Settings};
use pixpress::imaging::{self, OutputFormat, RustBackend};
use pixpress::intake::{self, InputScan, RawFile};
use pixpress::registry::Registry;
use pixpress::{batch, export, output};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Input selection shared by commands that read images.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Image files or directories to read
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,
}

/// Output settings; each flag overrides the config file.
#[derive(clap::Args, Clone, Default)]
struct SettingsArgs {
    /// Output format: webp, jpeg or png
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Encoding quality, 0-100 (ignored for png)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,

    /// Largest output width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_width: Option<u32>,

    /// Largest output height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_height: Option<u32>,
}

impl SettingsArgs {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(quality) = self.quality {
            settings.quality = imaging::Quality::new(quality);
        }
        if self.max_width.is_some() {
            settings.max_width = self.max_width;
        }
        if self.max_height.is_some() {
            settings.max_height = self.max_height;
        }
        settings
    }
}

#[derive(Parser)]
#[command(name = "pixpress")]
#[command(about = "Batch image resizer and recompressor")]
#[command(long_about = "\
Batch image resizer and recompressor

Reads JPEG, PNG and WebP files, scales them down to fit optional maximum
dimensions (never up, aspect ratio kept) and re-encodes them as WebP, JPEG
or PNG. Every image is handled on its own: one that fails to decode or
encode is reported and the rest of the batch carries on.

Settings resolution (later wins):
  stock defaults → pixpress.toml → command-line flags

Run 'pixpress gen-config' to generate a documented pixpress.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when missing)
    #[arg(long, default_value = "pixpress.toml", global = true)]
    config: PathBuf,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize and re-encode images into an output directory
    Process {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Write a JSON report of the batch to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List accepted inputs with size, type and dimensions without encoding
    Check(InputArgs),
    /// Print a stock pixpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Process {
            input,
            settings,
            out,
            report,
        } => {
            let app_config = config::load_config(&cli.config)?;
            let run_settings = settings.apply(app_config.output);
            run_settings.validate()?;

            let scan = intake::collect_inputs(&input.inputs, input.recursive);
            warn_skipped(&scan);
            let mut registry = load_registry(&scan);
            let backend = RustBackend::new();
            println!("{}", output::format_settings(&run_settings));

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::process_pending(
                &mut registry,
                &backend,
                &run_settings,
                &app_config.processing,
                Some(&tx),
            );
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let batch_report = result?;

            let mut sink = export::DirectorySink::new(&out);
            let exported =
                export::export_all(&registry, &mut sink, app_config.processing.export_stagger());
            output::print_export_summary(&out, &exported);
            output::print_pending(&registry);

            if let Some(path) = report {
                write_report(&path, &batch_report)?;
                info!("wrote report to {}", path.display());
            }
        }
        Command::Check(input) => {
            let scan = intake::collect_inputs(&input.inputs, input.recursive);
            let registry = load_registry(&scan);
            let backend = RustBackend::new();
            let entries: Vec<_> = registry
                .all()
                .iter()
                .map(|record| (record, imaging::get_dimensions(&backend, &record.data)))
                .collect();
            output::print_check_output(&entries, &scan.skipped);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr at a level picked by `-v`; the environment is not consulted.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("pixpress={level}")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn warn_skipped(scan: &InputScan) {
    for (path, err) in &scan.skipped {
        warn!("skipping {}: {}", path.display(), err);
    }
}

/// Read every accepted input into a fresh registry.
fn load_registry(scan: &InputScan) -> Registry {
    let mut registry = Registry::new();
    let summary = registry.add_all(scan.accepted.iter().map(|f| f as &dyn RawFile));
    for (name, err) in &summary.failed {
        warn!("could not add {}: {}", name, err);
    }
    info!("registered {} image(s)", summary.added.len());
    registry
}

fn write_report(path: &Path, report: &batch::BatchReport) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&report.to_document())?;
    std::fs::write(path, json)?;
    Ok(())
}
