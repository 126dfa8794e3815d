//! ngxplane - NGINX directive grammars and configuration assembly
//!
//! This is the main entry point for the ngxplane CLI.

mod report;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ngxplane_config::{Analyzer, ConfigAssembler};
use ngxplane_core::{Payload, PayloadLoader};
use ngxplane_grammar::settings::load_allowlist;
use ngxplane_grammar::{
    render, BuildError, BuildOptions, GrammarBuilder, GrammarSettings, GrammarTable, SourceVariant,
    VariantId,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ngxplane - derive NGINX directive grammars from module source and work
/// with parsed configuration payloads
#[derive(Parser)]
#[command(name = "ngxplane")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a directive grammar from NGINX or module source
    Generate {
        /// Source tree (or single .c/.cpp file) to scan
        #[arg(long)]
        source: PathBuf,

        /// Distribution or module name, e.g. "oss", "plus", "lua"
        #[arg(long)]
        name: String,

        /// Source version; "master" or "latest" name the development branch
        #[arg(long)]
        version: Option<String>,

        /// Source variant, when it differs from --name
        #[arg(long)]
        variant: Option<SourceVariant>,

        /// File with the documented directive names, one per line
        #[arg(long)]
        allowlist: Option<PathBuf>,

        /// TOML file with extra tokens, contexts and forced rules
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Rust)]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine a payload's included files into one config
    Assemble {
        /// Payload JSON produced by the parser
        payload: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not stop on include cycles
        #[arg(long)]
        allow_cycles: bool,
    },

    /// Check a payload against one or more JSON grammars
    Check {
        /// Payload JSON produced by the parser
        payload: PathBuf,

        /// Grammar JSON written by `generate --format json`
        #[arg(long = "grammar", required = true, num_args = 1..)]
        grammars: Vec<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Rust,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so generated output can be piped
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Generate {
            source,
            name,
            version,
            variant,
            allowlist,
            settings,
            format,
            output,
        } => {
            let settings = match settings {
                Some(path) => GrammarSettings::load(&path).map_err(BuildError::from)?,
                None => GrammarSettings::default(),
            };
            let allowlist = allowlist
                .map(load_allowlist)
                .transpose()
                .map_err(BuildError::from)?;

            // A name like "lua" doubles as the variant tag
            let variant = variant.or_else(|| name.parse().ok());
            let options = BuildOptions { variant, allowlist };

            let table = match GrammarBuilder::new(&settings).build(&source, &options) {
                Ok(table) => table,
                Err(BuildError::UnknownSymbol(err)) => {
                    eprint!("{}", report::unknown_symbol(&err));
                    return Err(BuildError::UnknownSymbol(err).into());
                }
                Err(e) => return Err(e.into()),
            };

            let id = VariantId::new(&name, version.as_deref());
            let text = match format {
                Format::Rust => render::render_rust(&table, &id),
                Format::Json => render::render_json(&table)?,
            };
            write_output(output.as_deref(), &text)?;
            tracing::info!("Generated grammar '{}' with {} directive(s)", id, table.len());
        }

        Commands::Assemble {
            payload,
            output,
            allow_cycles,
        } => {
            let payload = PayloadLoader::load(&payload)?;
            let mut assembler = ConfigAssembler::new(&payload);
            if allow_cycles {
                assembler = assembler.allow_cycles();
            }
            let combined = assembler.combine()?;
            write_output(output.as_deref(), &PayloadLoader::to_json(&combined)?)?;
        }

        Commands::Check { payload, grammars } => {
            let payload = PayloadLoader::load(&payload)?;
            let tables = grammars
                .iter()
                .map(|path| load_grammar(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let refs: Vec<&GrammarTable> = tables.iter().collect();

            let analysis = Analyzer::new(&refs).analyze_payload(&payload)?;
            let parse_errors = report_parse_errors(&payload);
            for diagnostic in &analysis.diagnostics {
                eprintln!("{}", diagnostic);
            }

            if analysis.is_clean() && !payload.status.is_failed() && payload.errors.is_empty() {
                println!("✅ Configuration '{}' is valid!", root_file(&payload));
            } else {
                eprintln!("❌ {} problem(s) found", analysis.diagnostics.len() + parse_errors);
                std::process::exit(1);
            }
        }

        Commands::Version => {
            println!("ngxplane v{}", ngxplane_core::VERSION);
        }
    }

    Ok(())
}

fn load_grammar(path: &Path) -> anyhow::Result<GrammarTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grammar {}", path.display()))?;
    let table: GrammarTable = serde_json::from_str(&content)
        .with_context(|| format!("invalid grammar {}", path.display()))?;
    tracing::debug!("Loaded grammar {} with {} directive(s)", path.display(), table.len());
    Ok(table)
}

fn write_output(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

/// Print payload-level errors, then the per-file errors the payload does not
/// already list. Returns how many were printed.
fn report_parse_errors(payload: &Payload) -> usize {
    for error in &payload.errors {
        match error.line {
            Some(line) => eprintln!("{}:{}: {}", error.file, line, error.error),
            None => eprintln!("{}: {}", error.file, error.error),
        }
    }

    let mut printed = payload.errors.len();
    for config in &payload.config {
        for error in &config.errors {
            let listed = payload
                .errors
                .iter()
                .any(|e| e.file == config.file && e.line == error.line && e.error == error.error);
            if listed {
                continue;
            }
            match error.line {
                Some(line) => eprintln!("{}:{}: {}", config.file, line, error.error),
                None => eprintln!("{}: {}", config.file, error.error),
            }
            printed += 1;
        }
    }
    printed
}

fn root_file(payload: &Payload) -> &str {
    payload.root().map(|c| c.file.as_str()).unwrap_or("<empty>")
}
