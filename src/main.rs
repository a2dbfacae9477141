//! Command-line interface for edmx-rs

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use edmx::converters::convert;
#[cfg(feature = "cli")]
use edmx::limits::Limits;
#[cfg(feature = "cli")]
use edmx::loaders::Loader;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "edmx")]
#[command(author, version, about = "OData CSDL/XML metadata conversion tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a CSDL/XML metadata document to JSON
    Convert {
        /// Path to the metadata document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        /// Apply strict size and depth limits
        #[arg(long)]
        strict: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            file,
            pretty,
            strict,
            output,
        } => cmd_convert(file, pretty, strict, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_convert(
    file: PathBuf,
    pretty: bool,
    strict: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let limits = if strict { Limits::strict() } else { Limits::default() };
    let root = Loader::new().with_limits(limits).load_root(&file)?;

    let json_value = convert(&root)?;

    let json_str = if pretty {
        serde_json::to_string_pretty(&json_value)?
    } else {
        serde_json::to_string(&json_value)?
    };

    if let Some(output_path) = output {
        fs::write(output_path, &json_str)?;
    } else {
        println!("{}", json_str);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
