//! # tapeprint CLI
//!
//! Command-line interface for Brother P-touch label printing.
//!
//! ## Usage
//!
//! ```bash
//! # Run the web front end
//! tapeprint serve --device usb --listen 0.0.0.0:8080
//!
//! # Print three chained labels
//! tapeprint --device /dev/rfcomm0 print "Cable 1" --copies 3 --chain
//!
//! # Render without printing
//! tapeprint preview "Cable 1" --png cable.png --tape 12
//!
//! # Query the printer
//! tapeprint status
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tapeprint::{
    LabelPrinter, LabelRequest, LabelSettings, PrintJob, TapeprintError,
    config::ServerConfig,
    fonts::FontCatalog,
    render,
    server,
    session::{PrinterSession, SharedSession},
    transport::SerialConnector,
};

/// tapeprint - Label printer utility
#[derive(Parser, Debug)]
#[command(name = "tapeprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device path, or "usb"
    #[arg(long, global = true, env = "TAPEPRINT_DEVICE", default_value = "usb")]
    device: String,

    /// JSON file with label settings
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP front end
    Serve {
        /// Address to listen on
        #[arg(long, env = "TAPEPRINT_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,
    },

    /// Print a label
    Print {
        /// Label text
        text: String,

        /// Number of copies
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Do not cut after the last copy
        #[arg(long)]
        chain: bool,

        /// Font name or path to a TTF/OTF file
        #[arg(long)]
        font: Option<String>,

        /// Font size in points (defaults to the tape width's size)
        #[arg(long)]
        size: Option<String>,
    },

    /// Render a label to a PNG file without printing
    Preview {
        /// Label text
        text: String,

        /// Output file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        /// Tape width in mm to size for (0 = no tape)
        #[arg(long, default_value = "0")]
        tape: u8,

        /// Font name or path to a TTF/OTF file
        #[arg(long)]
        font: Option<String>,

        /// Font size in points
        #[arg(long)]
        size: Option<String>,
    },

    /// Show the printer status
    Status,

    /// List installed fonts
    Fonts,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TapeprintError> {
    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => LabelSettings::load(path)?,
        None => LabelSettings::default(),
    };

    match cli.command {
        Commands::Serve { listen } => {
            let config = ServerConfig {
                device: cli.device,
                listen_addr: listen,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config, settings))
        }

        Commands::Print {
            text,
            copies,
            chain,
            font,
            size,
        } => {
            let printer = open_printer(&cli.device, settings);
            let request = LabelRequest {
                text,
                font_path: resolve_font(font.as_deref())?,
                font_size: size,
            };
            match printer.print(&request, PrintJob::new(copies, chain)) {
                Ok(report) => {
                    println!(
                        "Printed {} label(s) on {} mm tape",
                        report.copies_printed, report.status.tape_width_mm
                    );
                    Ok(())
                }
                Err(e) => {
                    if let Some(copy) = e.failed_copy() {
                        eprintln!("Copy {} failed, {} label(s) printed", copy, e.printed());
                    }
                    Err(e.into_error())
                }
            }
        }

        Commands::Preview {
            text,
            png,
            tape,
            font,
            size,
        } => {
            // Only used for sizing; the device is never opened
            let printer = open_printer(&cli.device, settings);
            let request = LabelRequest {
                text,
                font_path: resolve_font(font.as_deref())?,
                font_size: size,
            };
            let spec = printer.label_spec(&request, tape);
            let label = render::render(&spec)?;
            std::fs::write(&png, tapeprint::preview::to_png(&label)?)?;
            println!(
                "Saved {}x{} label ({} pt) to {}",
                label.width(),
                label.height(),
                spec.font_size_pt,
                png.display()
            );
            Ok(())
        }

        Commands::Status => {
            let report = open_printer(&cli.device, settings).status();
            println!("State: {}", report.state);
            if let Some(status) = report.status {
                println!("Model: 0x{:02x}", status.model);
                println!("Tape width: {} mm", status.tape_width_mm);
                for fault in status.fault_descriptions() {
                    println!("Fault: {}", fault);
                }
            }
            match report.error {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        Commands::Fonts => {
            for name in FontCatalog::system().families() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn open_printer(device: &str, settings: LabelSettings) -> LabelPrinter {
    let session = PrinterSession::new(device, Arc::new(SerialConnector));
    LabelPrinter::new(SharedSession::new(session), settings)
}

/// A font argument is either a file path or a name from the catalog.
fn resolve_font(font: Option<&str>) -> Result<Option<PathBuf>, TapeprintError> {
    let Some(font) = font.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    if Path::new(font).is_file() {
        return Ok(Some(PathBuf::from(font)));
    }
    FontCatalog::system()
        .find(font)
        .map(|entry| Some(entry.path.clone()))
        .ok_or_else(|| TapeprintError::Config(format!("Font '{}' not found", font)))
}
