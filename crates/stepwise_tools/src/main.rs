//! Stepwise Tools CLI
//!
//! Command-line tools for canonicalizing and inspecting grammars.

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};
use stepwise::grammar::{Grammar, parse_grammar};
use stepwise::info::ParserInfos;
use stepwise::transform::Canonicalizer;
use stepwise_tools::cli::{Cli, Commands, OutputFormat};
use stepwise_tools::{
    CheckReport, DotOptions, GrammarReport, annotated_text, generate_dot_with,
};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.command.config();
    match cli.command {
        Commands::Canon {
            input,
            output,
            format,
            ..
        } => {
            let grammar = read_grammar(&input)?;
            let infos = ParserInfos::full_for(&grammar);
            let canonical = Canonicalizer::new(config).canonicalize(&grammar, &infos)?;
            tracing::info!(
                input = %input.display(),
                rules = canonical.grammar.len(),
                iterations = canonical.stats.iterations,
                synthesized = canonical.stats.synthesized,
                "canonicalized grammar"
            );

            let content = match format {
                OutputFormat::Text => annotated_text(&canonical.grammar, &canonical.infos),
                OutputFormat::Dot => generate_dot_with(
                    &canonical.grammar,
                    DotOptions {
                        infos: Some(&canonical.infos),
                        show_conflicts: false,
                    },
                ),
                OutputFormat::Json => GrammarReport::canonical(&canonical)
                    .to_json()
                    .into_diagnostic()?,
            };
            emit(output.as_ref(), &content)?;
        }
        Commands::Check { input } => {
            let grammar = read_grammar(&input)?;
            let report = CheckReport::new(&grammar);
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{json}");
            if !report.is_canonical() {
                tracing::info!(input = %input.display(), "grammar is not canonical");
            }
        }
        Commands::Viz {
            input,
            output,
            canonical,
            show_conflicts,
        } => {
            let grammar = read_grammar(&input)?;
            let content = if canonical {
                let infos = ParserInfos::full_for(&grammar);
                let result = Canonicalizer::new(config).canonicalize(&grammar, &infos)?;
                generate_dot_with(
                    &result.grammar,
                    DotOptions {
                        infos: Some(&result.infos),
                        show_conflicts,
                    },
                )
            } else {
                generate_dot_with(
                    &grammar,
                    DotOptions {
                        infos: None,
                        show_conflicts,
                    },
                )
            };
            emit(output.as_ref(), &content)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_grammar(path: &Path) -> miette::Result<Grammar> {
    let src = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not read grammar file {}", path.display()))?;
    let grammar = parse_grammar(&src)?;
    tracing::debug!(path = %path.display(), rules = grammar.len(), "parsed grammar");
    Ok(grammar)
}

fn emit(output: Option<&PathBuf>, content: &str) -> miette::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{content}"),
    }
    Ok(())
}
