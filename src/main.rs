use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use test_split_core::test_parser::ImportCategory;
use test_split_core::{ParserConfig, TestFileParser, TestScanner};

#[derive(Parser)]
#[command(name = "test-split-core")]
#[command(about = "Structural parser for TypeScript test files")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single test file into imports, mocks, blocks and metrics
    ParseFile {
        /// Test file to parse (*.spec.ts, *.test.ts, *.spec.tsx, *.test.tsx)
        #[arg(short, long)]
        file: PathBuf,

        /// YAML file overriding the parser policy tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List test files under a directory
    Scan {
        /// Root directory to scan
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// YAML file overriding the parser policy tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse every test file under a directory
    Analyze {
        /// Root directory to scan and parse
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// YAML file overriding the parser policy tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Categorize the imports of a single file
    Imports {
        /// File to read imports from
        #[arg(short, long)]
        file: PathBuf,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImportEntry {
    line_number: usize,
    source: String,
    category: ImportCategory,
    names: Vec<String>,
    raw: String,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::ParseFile { file, config, output } => {
            match ParserConfig::load(config.as_deref()) {
                Ok(config) => {
                    let parser = TestFileParser::with_config(config);
                    match parser.parse_file(file) {
                        Ok(parsed) => output_result(&parsed, output.as_ref(), "parse-file"),
                        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
                    }
                }
                Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
            }
        }
        Commands::Scan { root, config, output } => {
            match ParserConfig::load(config.as_deref()) {
                Ok(config) => {
                    let scanner = TestScanner::new(&config);
                    let scan_result = scanner.scan(root);
                    output_result(&scan_result, output.as_ref(), "scan")
                }
                Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
            }
        }
        Commands::Analyze { root, config, output } => {
            match ParserConfig::load(config.as_deref()) {
                Ok(config) => {
                    let scanner = TestScanner::new(&config);
                    let report = scanner.parse_all(root);
                    output_result(&report, output.as_ref(), "analyze")
                }
                Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
            }
        }
        Commands::Imports { file, output } => {
            match std::fs::read_to_string(file) {
                Ok(content) => {
                    let parser = TestFileParser::new();
                    let imports = parser.import_parser();
                    let entries: Vec<ImportEntry> = imports
                        .parse_imports(&content)
                        .into_iter()
                        .map(|stmt| ImportEntry {
                            line_number: stmt.line_number,
                            category: imports.categorize(&stmt),
                            names: imports.extract_imported_names(&stmt),
                            source: stmt.source,
                            raw: stmt.raw,
                        })
                        .collect();
                    output_result(&entries, output.as_ref(), "imports")
                }
                Err(e) => Err(format!(
                    "Failed to read input file '{}': {}",
                    file.display(), e
                ).into()),
            }
        }
    };

    if let Err(e) = result {
        let command_name = match cli.command {
            Commands::ParseFile { .. } => "parse-file",
            Commands::Scan { .. } => "scan",
            Commands::Analyze { .. } => "analyze",
            Commands::Imports { .. } => "imports",
        };
        eprintln!("Error in '{}' command: {}", command_name, e);
        eprintln!("Hint: Use --help for usage information");
        std::process::exit(1);
    }
}

fn output_result<T: serde::Serialize>(
    result: &T,
    output_path: Option<&PathBuf>,
    command_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| format!("Failed to serialize {} result to JSON: {}", command_name, e))?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &json)
                .map_err(|e| format!(
                    "Failed to write output to '{}': {} (check directory exists and permissions)",
                    path.display(),
                    e
                ))?;
            println!("Output written to: {}", path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
