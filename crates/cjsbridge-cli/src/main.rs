//! cjsbridge command-line inspector.
//!
//! Exposes the analysis pipeline for a shell: classify a file, list the
//! export names the resolver infers for it, or print the ES module source
//! the loader would synthesize in its place.

use anyhow::Context;
use clap::{Parser, Subcommand};
use cjsbridge_core::{classify, synthesize, ExportResolver, ModuleFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "cjsbridge")]
#[command(about = "Static named-export inference for CommonJS modules", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (repeat for trace level)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a file is treated as CommonJS or an ES module
    Classify {
        /// File to classify
        file: PathBuf,
    },

    /// List the export names statically inferred for a CommonJS file
    Exports {
        /// File to analyze
        file: PathBuf,
        /// Emit a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Print the ES module source synthesized in place of a CommonJS file
    Synth {
        /// File to synthesize for
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify { file } => {
            // Classification walks the ancestor chain; anchor it on disk.
            let file = file.canonicalize().unwrap_or(file);
            let format = classify(&file)
                .with_context(|| format!("classifying {}", file.display()))?;
            println!(
                "{}",
                match format {
                    ModuleFormat::CommonJs => "commonjs",
                    ModuleFormat::EsModule => "module",
                }
            );
        }

        Commands::Exports { file, json } => {
            let names = ExportResolver::new().resolve(&file);
            if json {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                println!("{}", serde_json::to_string(&names)?);
            } else {
                for name in &names {
                    println!("{name}");
                }
            }
        }

        Commands::Synth { file } => {
            let url = file_url(&file)?;
            let names = ExportResolver::new().resolve(&file);
            print!("{}", synthesize(url.as_str(), &names));
        }
    }

    Ok(())
}

/// Absolute `file:` URL for a path, the address form the synthesized import
/// (and its `?cjsoriginal` routing) uses.
fn file_url(path: &Path) -> anyhow::Result<Url> {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(path));
    Url::from_file_path(&absolute)
        .map_err(|_| anyhow::anyhow!("cannot express {} as a file url", absolute.display()))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}
