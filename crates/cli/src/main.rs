//! The `accord` binary: compare two contract versions for backward
//! compatibility, or generate sample payloads from a contract.
//!
//! Exit-code mapping happens exactly once, here at the outermost
//! boundary; the engine itself never terminates the process.

use std::path::{Path, PathBuf};
use std::process;

use accord_core::{difference, Contract, GenerationPolicy, PatternError, Row};
use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Accord contract compatibility toolchain.
#[derive(Parser)]
#[command(name = "accord", version, about = "Accord contract compatibility toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a newer contract is backward compatible with an older one
    Compare {
        /// Path to the older contract interchange JSON
        older: PathBuf,
        /// Path to the newer contract interchange JSON
        newer: PathBuf,
    },

    /// Generate sample payloads from a contract
    Generate {
        /// Path to the contract interchange JSON
        contract: PathBuf,
        /// Also produce boundary-violating variants for negative testing
        #[arg(long)]
        negative: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare { older, newer } => {
            cmd_compare(&older, &newer, cli.output, cli.quiet);
        }
        Commands::Generate { contract, negative } => {
            cmd_generate(&contract, negative, cli.output, cli.quiet);
        }
    }
}

fn cmd_compare(older_path: &Path, newer_path: &Path, output: OutputFormat, quiet: bool) {
    let older = load_contract(older_path, output, quiet);
    let newer = load_contract(newer_path, output, quiet);

    let report = difference(&older, &newer);
    if !quiet {
        match output {
            OutputFormat::Text => println!("{}", report.message()),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
            ),
        }
    }
    process::exit(report.exit_code());
}

fn cmd_generate(contract_path: &Path, negative: bool, output: OutputFormat, quiet: bool) {
    let contract = load_contract(contract_path, output, quiet);
    let resolver = contract.resolver_with(GenerationPolicy { negative });
    let row = Row::new();

    let mut parts = Vec::new();
    for part in &contract.multipart {
        let variants = match part.new_variants(&row, &resolver) {
            Ok(variants) => variants,
            Err(err) => exit_with_engine_error(err, output, quiet),
        };
        for variant in variants.into_iter().flatten() {
            let values = match variant.generate(&resolver) {
                Ok(values) => values,
                Err(err) => exit_with_engine_error(err, output, quiet),
            };
            for value in values {
                parts.push(serde_json::to_value(&value).unwrap_or_default());
            }
        }
    }

    let body = match &contract.body {
        Some(pattern) => match pattern.generate(&resolver) {
            Ok(value) => Some(serde_json::to_value(&value).unwrap_or_default()),
            Err(err) => exit_with_engine_error(err, output, quiet),
        },
        None => None,
    };

    if !quiet {
        let sample = serde_json::json!({
            "name": contract.name,
            "body": body,
            "multipart": parts,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&sample).unwrap_or_default()
        );
    }
}

/// Load a contract bundle, exiting on failure: a wrong extension is a
/// usage error (1), an unreadable file is environmental (3), and
/// unparsable interchange JSON is a contract defect (2).
fn load_contract(path: &Path, output: OutputFormat, quiet: bool) -> Contract {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        let msg = format!(
            "'{}' is not a contract interchange file (expected a .json extension)",
            path.display()
        );
        report_error(&msg, output, quiet);
        process::exit(1);
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            let msg = format!("error reading '{}': {}", path.display(), err);
            report_error(&msg, output, quiet);
            process::exit(3);
        }
    };

    match Contract::from_json(&text) {
        Ok(contract) => contract,
        Err(err) => {
            let msg = format!("error parsing contract '{}': {}", path.display(), err);
            report_error(&msg, output, quiet);
            process::exit(2);
        }
    }
}

fn exit_with_engine_error(err: PatternError, output: OutputFormat, quiet: bool) -> ! {
    report_error(&err.to_string(), output, quiet);
    let code = if err.is_contract_defect() { 2 } else { 3 };
    process::exit(code);
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
