use anchor_patcher::config::{self, EngineConfig};
use anchor_patcher::locator::{closest_line, LocateError};
use anchor_patcher::{
    apply_sequentially, build_prompt, parse_response, AbortSignal, ApplyReport, Decision,
    FileBuffer, FixedReviewer, MemoryBuffer, ParsedSuggestions, PatchOutcome, PatchPreview,
    PatchStatus, PatchSuggestion, PromptRequest, ReviewMode, Reviewer, SequentialApplier,
    TerminalReviewer, TextBuffer,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anchor-patcher")]
#[command(about = "Apply suggested code edits by exact text anchors instead of line numbers", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine config file (defaults to ./anchor-patcher.toml, then ~/.config/anchor-patcher.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SuggestionSource {
    /// File holding the suggester response (reads stdin if omitted or "-")
    #[arg(short, long)]
    suggestions: Option<PathBuf>,

    /// Do not fall back to the legacy line-number format
    #[arg(long)]
    no_legacy: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Review and apply suggested patches to a file
    Apply {
        /// File to patch
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        source: SuggestionSource,

        /// Apply every patch without prompting
        #[arg(short, long)]
        yes: bool,

        /// Dry run - work on an in-memory copy and leave the file untouched
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of the whole batch
        #[arg(short, long)]
        diff: bool,
    },

    /// Report which patches would apply, without modifying the file
    Check {
        /// File the patches target
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        source: SuggestionSource,
    },

    /// Print the normalised anchor patches as JSON
    Parse {
        /// Original file, needed to convert legacy line-number suggestions
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        source: SuggestionSource,
    },

    /// Print the instruction prompt for the patch suggester
    Prompt {
        /// Source file to embed
        #[arg(short, long)]
        file: PathBuf,

        /// Stack trace or error output to embed
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Language name (guessed from the file extension if omitted)
        #[arg(short, long)]
        language: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = env::current_dir().context("could not determine working directory")?;
    let config = config::discover(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Apply {
            file,
            source,
            yes,
            dry_run,
            diff,
        } => cmd_apply(&file, &source, config, yes, dry_run, diff),

        Commands::Check { file, source } => cmd_check(&file, &source, config),

        Commands::Parse { file, source } => cmd_parse(file.as_deref(), &source, config),

        Commands::Prompt {
            file,
            trace,
            language,
        } => cmd_prompt(&file, trace.as_deref(), language.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .init();
}

/// Helper: read the suggester response from a file or stdin.
fn read_suggestions(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read suggestions from {}", path.display())),
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read suggestions from stdin")?;
            Ok(raw)
        }
    }
}

fn reads_stdin(source: &SuggestionSource) -> bool {
    source
        .suggestions
        .as_deref()
        .map_or(true, |path| path == Path::new("-"))
}

/// Helper: load the document and parse the response against it.
fn load_batch(
    file: &Path,
    source: &SuggestionSource,
    mut config: EngineConfig,
) -> Result<(String, ParsedSuggestions)> {
    let original =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let raw = read_suggestions(source.suggestions.as_deref())?;
    if source.no_legacy {
        config.suggestions.legacy_fallback = false;
    }
    let parsed = parse_response(&raw, &original, config.parse_options());
    Ok((original, parsed))
}

/// Helper: show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
        if change.missing_newline() {
            println!();
        }
    }
}

fn print_outcome(outcome: &PatchOutcome, dry_run: bool) {
    let label = format!("{}: {}", outcome.kind.label_prefix(), outcome.issue);
    match &outcome.status {
        PatchStatus::Applied if dry_run => {
            println!("{} [{}] {}: Would apply", "✓".green(), outcome.index + 1, label)
        }
        PatchStatus::Applied => {
            println!("{} [{}] {}: Applied", "✓".green(), outcome.index + 1, label)
        }
        PatchStatus::AlreadyApplied => println!(
            "{} [{}] {}: Already applied",
            "⊙".yellow(),
            outcome.index + 1,
            label
        ),
        PatchStatus::Skipped => {
            println!("{} [{}] {}: Skipped", "⊘".cyan(), outcome.index + 1, label)
        }
        PatchStatus::NotFound { reason } => eprintln!(
            "{} [{}] {}: Not found - {}",
            "✗".red(),
            outcome.index + 1,
            label,
            reason
        ),
        PatchStatus::NotAttempted => println!(
            "{} [{}] {}: Not attempted (stopped)",
            "⊘".dimmed(),
            outcome.index + 1,
            label
        ),
    }
}

fn print_summary(report: &ApplyReport) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", report.applied()).green());
    println!(
        "  {} already applied",
        format!("{}", report.already_applied()).yellow()
    );
    println!("  {} skipped", format!("{}", report.skipped()).cyan());
    println!("  {} not found", format!("{}", report.not_found()).red());
    if report.not_attempted() > 0 {
        println!("  {} not attempted", report.not_attempted());
    }
}

fn cmd_apply(
    file: &Path,
    source: &SuggestionSource,
    mut config: EngineConfig,
    yes: bool,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    if yes {
        config.review.mode = ReviewMode::ApplyAll;
    }
    let mode = config.review.mode;
    if mode == ReviewMode::Interactive && reads_stdin(source) {
        bail!("interactive review reads answers from stdin; pass the response with --suggestions <FILE> or use --yes");
    }

    let context_lines = config.review.context_lines;
    let (original, parsed) = load_batch(file, source, config)?;

    if parsed.is_empty() {
        println!("No fixes suggested.");
        return Ok(());
    }

    println!("File: {}", file.display());
    println!(
        "Received {} patch(es) ({} format).",
        parsed.patches.len(),
        parsed.format
    );
    if dry_run {
        println!("{}", "  [DRY RUN - the file will not be modified]".cyan());
    }

    let abort = AbortSignal::new();
    let mut reviewer: Box<dyn Reviewer> = match mode {
        ReviewMode::Interactive => Box::new(TerminalReviewer::new(
            io::stdin().lock(),
            io::stdout(),
            context_lines,
            abort.clone(),
        )),
        ReviewMode::ApplyAll => Box::new(FixedReviewer::apply_all()),
        ReviewMode::SkipAll => Box::new(FixedReviewer::skip_all()),
    };

    let (result, patched) = if dry_run {
        let mut buffer = MemoryBuffer::new(original.clone());
        let result = SequentialApplier::new(&mut buffer, &mut *reviewer)
            .with_abort(abort)
            .run(&parsed.patches);
        (result, buffer.into_text())
    } else {
        let mut buffer = FileBuffer::open(file)
            .with_context(|| format!("failed to open {} for patching", file.display()))?;
        let result = SequentialApplier::new(&mut buffer, &mut *reviewer)
            .with_abort(abort)
            .run(&parsed.patches);
        (result, buffer.text().to_string())
    };

    println!();
    match result {
        Ok(report) => {
            for outcome in &report.outcomes {
                print_outcome(outcome, dry_run);
            }
            if show_diff && patched != original {
                display_diff(file, &original, &patched);
            }
            print_summary(&report);
            if report.applied() > 0 && report.not_found() == 0 && !dry_run {
                println!("{}", "All selected fixes applied successfully.".green());
            }
            Ok(())
        }
        Err(err) => {
            for outcome in &err.completed {
                print_outcome(outcome, dry_run);
            }
            eprintln!("{} {}", "✗".red(), err);
            eprintln!(
                "  {}",
                "Stopped: the document may be in an unexpected state; remaining patches were not attempted.".red()
            );
            std::process::exit(1);
        }
    }
}

/// Applies everything and remembers a closest-line hint for each miss,
/// in the order the misses were reported.
#[derive(Default)]
struct CheckReviewer {
    hints: Vec<Option<String>>,
}

impl Reviewer for CheckReviewer {
    fn preview(&mut self, _preview: &PatchPreview<'_>) {}

    fn decide(&mut self, _preview: &PatchPreview<'_>) -> Option<Decision> {
        Some(Decision::Apply)
    }

    fn clear(&mut self) {}

    fn not_found(&mut self, patch: &PatchSuggestion, document: &str, _error: &LocateError) {
        let hint = closest_line(document, patch.snippet()).map(|(line, text, score)| {
            format!("closest line {}: {:?} (similarity {:.2})", line + 1, text, score)
        });
        self.hints.push(hint);
    }
}

fn cmd_check(file: &Path, source: &SuggestionSource, config: EngineConfig) -> Result<()> {
    let (original, parsed) = load_batch(file, source, config)?;

    println!("{}", "Patch Check Report".bold());
    println!("File: {}", file.display());
    println!("Format: {}", parsed.format);
    println!();

    if parsed.is_empty() {
        println!("No fixes suggested.");
        return Ok(());
    }

    let mut buffer = MemoryBuffer::new(original);
    let mut reviewer = CheckReviewer::default();
    let report = apply_sequentially(&mut buffer, &parsed.patches, &mut reviewer)?;

    let mut hints = reviewer.hints.into_iter();
    for outcome in &report.outcomes {
        print_outcome(outcome, true);
        if let PatchStatus::NotFound { .. } = outcome.status {
            if let Some(hint) = hints.next().flatten() {
                eprintln!("  {}", hint.dimmed());
            }
            eprintln!("  Possible causes:");
            eprintln!("    - Snippet was not copied verbatim (indentation, quotes, trailing spaces)");
            eprintln!("    - An earlier patch already changed this text");
            eprintln!("    - occurrence_index is negative or exceeds the number of matches");
        }
    }
    print_summary(&report);

    if report.not_found() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_parse(file: Option<&Path>, source: &SuggestionSource, mut config: EngineConfig) -> Result<()> {
    let original = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => String::new(),
    };
    let raw = read_suggestions(source.suggestions.as_deref())?;
    if source.no_legacy {
        config.suggestions.legacy_fallback = false;
    }
    let parsed = parse_response(&raw, &original, config.parse_options());

    eprintln!("Format: {}", parsed.format);
    println!("{}", serde_json::to_string_pretty(&parsed.patches)?);
    Ok(())
}

fn cmd_prompt(file: &Path, trace: Option<&Path>, language: Option<&str>) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let trace = trace
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read trace {}", path.display()))
        })
        .transpose()?;
    let language = language.unwrap_or_else(|| language_for(file));

    println!(
        "{}",
        build_prompt(&PromptRequest {
            language,
            source: &source,
            trace: trace.as_deref(),
        })
    );
    Ok(())
}

fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => "python",
        Some("rs") => "rust",
        Some("js") | Some("mjs") => "javascript",
        Some("ts") => "typescript",
        Some("go") => "go",
        Some("rb") => "ruby",
        Some("java") => "java",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("cc") | Some("hpp") => "cpp",
        Some("sh") => "bash",
        _ => "text",
    }
}
