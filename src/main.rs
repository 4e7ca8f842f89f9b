use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use redline::config::{self, ReviewConfig};
use redline::{
    logging, read_document, write_document, AnalysisResult, BatchReport, Classification,
    HttpAnalyzer, ReviewSession, SessionError,
};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "redline")]
#[command(about = "Analyze a document and apply the proposed corrections", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Analysis service URL (overrides config and REDLINE_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document and list findings
    Analyze {
        /// Document to analyze
        file: PathBuf,
    },

    /// Apply corrections to a document and re-analyze it
    Fix {
        /// Document to correct
        file: PathBuf,

        #[command(flatten)]
        target: FixTarget,

        /// Replacement for --original
        #[arg(long, requires = "original")]
        replacement: Option<String>,

        /// Dry run - show what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Load and validate a config file
    CheckConfig {
        /// Config file to check
        path: PathBuf,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct FixTarget {
    /// Apply every correction with a known position
    #[arg(long)]
    all: bool,

    /// Apply the correction of one finding, by id
    #[arg(long)]
    finding: Option<String>,

    /// Replace the first occurrence of this text (requires --replacement)
    #[arg(long, requires = "replacement")]
    original: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze { file } => {
            let config = config::resolve(cli.config.as_deref(), cli.url.as_deref())?;
            cmd_analyze(&config, &file)
        }

        Commands::Fix {
            file,
            target,
            replacement,
            dry_run,
            diff,
        } => {
            let config = config::resolve(cli.config.as_deref(), cli.url.as_deref())?;
            cmd_fix(&config, &file, &target, replacement.as_deref(), dry_run, diff)
        }

        Commands::CheckConfig { path } => cmd_check_config(&path),
    }
}

fn open_session(config: &ReviewConfig, document: String) -> Result<ReviewSession<HttpAnalyzer>> {
    let analyzer = HttpAnalyzer::from_config(&config.service)?;
    Ok(ReviewSession::new(analyzer, config.review.clone(), document))
}

/// Print the user-facing message and exit non-zero.
fn fail(err: &SessionError) -> ! {
    eprintln!("{} {}", "✗".red(), err.user_message());
    eprintln!("  {}", err.to_string().dimmed());
    std::process::exit(1);
}

/// Helper: Show unified diff between original and corrected content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (corrected)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_findings(result: &AnalysisResult, classes: &Classification<'_>) {
    println!(
        "{} {}",
        "Document type:".bold(),
        result.document_type_label
    );

    if classes.is_clean() {
        println!("{} No issues found.", "✓".green());
        return;
    }

    for group in classes.visible_groups() {
        println!();
        println!(
            "{} ({} findings)",
            group.context.bold(),
            group.findings.len()
        );
        for finding in &group.findings {
            let id = finding.id.as_deref().unwrap_or("-");
            println!("  {} [{}] {}", "✗".red(), id.dimmed(), finding.rule_name.bold());
            println!("      {}", finding.message);
            if let Some(correction) = &finding.correction {
                let position = correction
                    .span
                    .map(|span| format!(" at {span}"))
                    .unwrap_or_default();
                println!(
                    "      {} {:?} -> {:?}{}",
                    "fix:".cyan(),
                    correction.original,
                    correction.replacement,
                    position.dimmed()
                );
            }
        }
    }

    println!();
    println!(
        "{} correctable, {} with a known position",
        format!("{}", classes.correctable_count).green(),
        format!("{}", classes.span_anchored_count).cyan()
    );
}

fn cmd_analyze(config: &ReviewConfig, file: &Path) -> Result<()> {
    let mut session = open_session(config, read_document(file)?)?;

    if let Err(err) = session.submit() {
        fail(&err);
    }

    if let (Some(result), Some(classes)) = (session.result(), session.classification()) {
        print_findings(result, &classes);
    }

    Ok(())
}

fn report_batch(report: &BatchReport, dry_run: bool) {
    let verb = if dry_run { "Would apply" } else { "Applied" };
    for edit in &report.applied {
        println!("{} {}: {} at {}", "✓".green(), verb, edit.rule_name, edit.span);
    }
    for edit in &report.skipped {
        println!(
            "{} Skipped {} at {} ({})",
            "⊙".yellow(),
            edit.rule_name,
            edit.span,
            edit.reason.to_string().dimmed()
        );
    }
}

fn cmd_fix(
    config: &ReviewConfig,
    file: &Path,
    target: &FixTarget,
    replacement: Option<&str>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let original_text = read_document(file)?;
    let mut session = open_session(config, original_text.clone())?;

    // 1. Analyze unless the user supplied the snippet pair directly
    if target.original.is_none() {
        if let Err(err) = session.submit() {
            fail(&err);
        }
    }

    // 2. Apply (each path re-analyzes on success)
    let outcome = if target.all {
        session.apply_all().map(|report| {
            report_batch(&report, dry_run);
            report.applied_count()
        })
    } else if let Some(id) = &target.finding {
        session.apply_finding(id).map(|_| 1)
    } else if let (Some(original), Some(replacement)) = (&target.original, replacement) {
        session.apply_one(original, replacement).map(|_| 1)
    } else {
        unreachable!("clap requires one fix target")
    };

    let applied = match outcome {
        Ok(count) => count,
        // The edits went in but re-analysis did not: keep them and still save
        Err(SessionError::Reanalysis {
            applied,
            report,
            source,
        }) => {
            if let Some(report) = &report {
                report_batch(report, dry_run);
            }
            eprintln!(
                "{} Corrections applied, but re-analysis failed: {}",
                "⊙".yellow(),
                source.user_message()
            );
            eprintln!("  {}", source.to_string().dimmed());
            applied
        }
        Err(err) => fail(&err),
    };

    // 3. Write back
    if show_diff {
        display_diff(file, &original_text, session.document());
    }

    if dry_run {
        println!("{}", "[DRY RUN - file not modified]".cyan());
    } else {
        let written = write_document(file, session.document())
            .with_context(|| format!("saving corrections to {}", file.display()))?;
        if written {
            println!("Saved {}", file.display());
        }
    }

    // 4. Summary
    println!();
    println!("{}", "Summary:".bold());
    if applied > 0 {
        println!("  {} corrections applied", format!("{}", applied).green());
    }
    if session.is_stale() {
        println!(
            "  {}",
            "findings not refreshed; run analyze again".yellow()
        );
    } else if let Some(classes) = session.classification() {
        println!(
            "  {} findings remaining ({} correctable)",
            format!("{}", classes.total()).yellow(),
            classes.correctable_count
        );
    }

    Ok(())
}

fn cmd_check_config(path: &Path) -> Result<()> {
    let config = config::load_from_path(path)?;
    println!("{} {}", "✓".green(), path.display());
    println!("  service.url: {}", config.service.url);
    println!("  service.timeout_secs: {}", config.service.timeout_secs);
    println!("  service.text_field: {}", config.service.text_field);
    println!("  review.primary_context: {}", config.review.primary_context);
    println!(
        "  review.normalize_newlines: {}",
        config.review.normalize_newlines
    );
    Ok(())
}
