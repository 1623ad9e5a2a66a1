//! CLI interface for stepwise-tools

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stepwise::transform::CanonicalizeConfig;

#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "Canonicalize and inspect grammars for fluent builder APIs")]
#[command(version)]
pub struct Cli {
    /// Log pass-level detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a grammar into canonical left-factored form
    Canon {
        /// Input grammar in text format
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Give up after this many factoring rounds
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Factor ambiguous shapes instead of rejecting them
        #[arg(long)]
        allow_unsupported: bool,

        /// Leave empty productions of the input alone until factoring starts
        #[arg(long)]
        keep_input_empties: bool,
    },

    /// Report metrics and canonical-form violations without rewriting
    Check {
        /// Input grammar in text format
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Render a grammar as a Graphviz graph
    Viz {
        /// Input grammar in text format
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Canonicalize before rendering
        #[arg(short, long)]
        canonical: bool,

        /// Highlight selections with shared prefixes
        #[arg(short = 's', long)]
        show_conflicts: bool,
    },
}

impl Commands {
    /// Canonicalizer settings for `canon`; defaults for other commands.
    #[must_use]
    pub fn config(&self) -> CanonicalizeConfig {
        match self {
            Self::Canon {
                max_iterations,
                allow_unsupported,
                keep_input_empties,
                ..
            } => CanonicalizeConfig::default()
                .with_max_iterations(*max_iterations)
                .with_detect_unsupported(!allow_unsupported)
                .with_fold_input_empties(!keep_input_empties),
            Self::Check { .. } | Self::Viz { .. } => CanonicalizeConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Dot,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "bnf" => Ok(Self::Text),
            "dot" | "graphviz" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Supported: text, dot, json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("DOT".parse::<OutputFormat>(), Ok(OutputFormat::Dot));
        assert_eq!("bnf".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_canon_flags_map_to_config() {
        let cli = Cli::parse_from([
            "stepwise",
            "canon",
            "-i",
            "g.txt",
            "--max-iterations",
            "5",
            "--allow-unsupported",
        ]);
        let config = cli.command.config();
        assert_eq!(config.max_iterations, Some(5));
        assert!(!config.detect_unsupported);
        assert!(config.fold_input_empties);
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["stepwise", "check", "-i", "g.txt", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check { .. }));
    }
}
