//! CLI binary for flashcard-import.
//!
//! A thin shim over the library crate: terminal prompts implement the
//! `Interaction` collaborator, a JSON file is the collection, and flags can
//! pre-answer every prompt for scripted use.

use anyhow::{Context, Result};
use clap::Parser;
use flashcard_import::deck_tree::flatten;
use flashcard_import::{
    build_deck_tree, filter_deck_tree, run_import, DeckEntry, ImportConfig, ImportError,
    ImportOutcome, ImportProgressCallback, Interaction, JsonCollection, NoteSink,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar for the write phase. Hidden until the import starts so it
/// never overlaps the prompts.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::hidden(),
            errors: AtomicUsize::new(0),
        })
    }
}

impl ImportProgressCallback for CliProgressCallback {
    fn on_import_start(&self, total_cards: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>4}/{len} cards  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.set_length(total_cards as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Importing");
    }

    fn on_note_added(&self, _card: usize, _total_cards: usize) {
        self.bar.inc(1);
    }

    fn on_note_error(&self, card: usize, total_cards: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Card {:>4}/{:<4}  {}",
            red("✗"),
            card,
            total_cards,
            red(error)
        ));
        self.bar.inc(1);
    }

    fn on_import_complete(&self, total_cards: usize, imported: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!(
                "{} {}/{} cards written  ({} skipped)",
                cyan("⚠"),
                bold(&imported.to_string()),
                total_cards,
                red(&failed.to_string()),
            );
        }
    }
}

// ── Terminal prompts ─────────────────────────────────────────────────────────

/// Read one trimmed line from stdin after printing `label` to stderr.
/// `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    eprint!("{} {} ", cyan("?"), bold(label));
    io::stderr().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Terminal implementation of the interactive collaborators. Any answer
/// given on the command line is used once instead of prompting.
struct TerminalInteraction {
    input: Option<PathBuf>,
    deck: Option<String>,
    note_type: Option<String>,
    assume_yes: bool,
}

impl Interaction for TerminalInteraction {
    fn choose_file(&mut self) -> Option<PathBuf> {
        if let Some(path) = self.input.take() {
            return Some(path);
        }
        let answer = prompt("Text file to import (empty to cancel):")?;
        (!answer.is_empty()).then(|| PathBuf::from(answer))
    }

    fn pick_deck(&mut self, decks: &[DeckEntry]) -> Option<String> {
        if let Some(deck) = self.deck.take() {
            return Some(deck);
        }
        let tree = build_deck_tree(decks);
        let mut view = tree.clone();
        loop {
            let rows = flatten(&view);
            if rows.is_empty() {
                eprintln!("  {}", dim("(no matching decks)"));
            }
            for (i, (depth, node)) in rows.iter().enumerate() {
                eprintln!(
                    "  {:>3}. {}{}",
                    i + 1,
                    "  ".repeat(*depth),
                    node.display_name
                );
            }

            let answer = prompt("Deck number or name, /text to filter, empty to cancel:")?;
            if answer.is_empty() {
                return None;
            }
            if let Some(query) = answer.strip_prefix('/') {
                view = filter_deck_tree(&tree, query);
                continue;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=rows.len()).contains(&n) => {
                    return Some(rows[n - 1].1.full_name.clone());
                }
                Ok(n) => eprintln!("  {}", red(&format!("No deck numbered {n}"))),
                Err(_) => return Some(answer),
            }
        }
    }

    fn pick_template(&mut self, templates: &[String], preselected: usize) -> Option<String> {
        if let Some(name) = self.note_type.take() {
            return Some(name);
        }
        loop {
            for (i, name) in templates.iter().enumerate() {
                let marker = if i == preselected { green("*") } else { " ".into() };
                eprintln!("  {}{:>3}. {}", marker, i + 1, name);
            }
            let answer = prompt("Note type number or name (empty for *, q to cancel):")?;
            if answer.eq_ignore_ascii_case("q") {
                return None;
            }
            if answer.is_empty() {
                return templates.get(preselected).cloned();
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=templates.len()).contains(&n) => return Some(templates[n - 1].clone()),
                Ok(n) => eprintln!("  {}", red(&format!("No note type numbered {n}"))),
                Err(_) => return Some(answer),
            }
        }
    }

    fn confirm(&mut self, card_count: usize) -> bool {
        if self.assume_yes {
            return true;
        }
        match prompt(&format!("Import {card_count} card(s)? [Y/n]")) {
            Some(a) => a.is_empty() || a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"),
            None => false,
        }
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{} {}", green("◆"), message);
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"INPUT FORMAT:
  Cards are separated by the literal token #flashcard. Text before the first
  token counts as a card too. Blank cards are skipped. Each card goes into
  the first field of the chosen note type; newlines, double spaces and tabs
  are kept visible with <br> and &nbsp;.

EXAMPLES:
  # Fully interactive
  flashcard-import

  # Scripted: no prompts
  flashcard-import notes.txt --deck "Chinese::HSK1" --note-type Basic --yes

  # Start a new collection and tag every note
  flashcard-import notes.txt --init --tag imported --tag hsk1

  # Show the deck hierarchy
  flashcard-import --list-decks

ENCODINGS:
  UTF-8, GBK, GB18030 and UTF-16 are tried in that order; if none fits the
  file is read as Latin-1.
"#;

/// Import #flashcard-delimited text files into a flashcard collection.
#[derive(Parser, Debug)]
#[command(
    name = "flashcard-import",
    version,
    about = "Import #flashcard-delimited text files into a flashcard collection",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text file to import. Prompted for when omitted.
    input: Option<PathBuf>,

    /// Collection file to write notes into.
    #[arg(short, long, env = "FLASHCARD_IMPORT_COLLECTION", default_value = "collection.json")]
    collection: PathBuf,

    /// Create the collection (with stock decks and note types) if missing.
    #[arg(long, env = "FLASHCARD_IMPORT_INIT")]
    init: bool,

    /// Target deck; created if it does not exist. Prompted for when omitted.
    #[arg(short, long, env = "FLASHCARD_IMPORT_DECK")]
    deck: Option<String>,

    /// Note type to create. Prompted for when omitted.
    #[arg(short = 't', long, env = "FLASHCARD_IMPORT_NOTE_TYPE")]
    note_type: Option<String>,

    /// Card delimiter token.
    #[arg(long, env = "FLASHCARD_IMPORT_DELIMITER", default_value = flashcard_import::DEFAULT_DELIMITER)]
    delimiter: String,

    /// Preselect the first note type whose name contains this keyword.
    #[arg(long, env = "FLASHCARD_IMPORT_KEYWORD", default_value = flashcard_import::DEFAULT_TEMPLATE_KEYWORD)]
    keyword: String,

    /// Tag to add to every note (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Do not ask for confirmation.
    #[arg(short, long, env = "FLASHCARD_IMPORT_YES")]
    yes: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long, env = "FLASHCARD_IMPORT_JSON")]
    json: bool,

    /// Print the deck hierarchy and exit.
    #[arg(long)]
    list_decks: bool,

    /// Disable progress bar.
    #[arg(long, env = "FLASHCARD_IMPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLASHCARD_IMPORT_VERBOSE")]
    verbose: bool,

    /// Only show errors.
    #[arg(short, long, env = "FLASHCARD_IMPORT_QUIET")]
    quiet: bool,
}

/// Process exit status for a run: 1 on a fatal import error, 0 otherwise.
/// Cancelling at a prompt is a normal exit.
fn exit_status(result: &std::result::Result<ImportOutcome, ImportError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library logs quiet while the progress bar is visible.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Open collection ──────────────────────────────────────────────────
    let mut collection = if cli.init {
        JsonCollection::open_or_create(&cli.collection)
    } else {
        JsonCollection::open(&cli.collection)
    }
    .with_context(|| {
        format!(
            "Failed to open collection {} (use --init to create one)",
            cli.collection.display()
        )
    })?;

    if cli.list_decks {
        for (depth, node) in flatten(&build_deck_tree(&collection.decks())) {
            println!("{}{}", "  ".repeat(depth), node.display_name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ImportConfig::builder()
        .delimiter(cli.delimiter.clone())
        .template_keyword(cli.keyword.clone())
        .tags(cli.tags.clone());
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut host = TerminalInteraction {
        input: cli.input.clone(),
        deck: cli.deck.clone(),
        note_type: cli.note_type.clone(),
        assume_yes: cli.yes,
    };

    // ── Run import ───────────────────────────────────────────────────────
    let result = run_import(&mut host, &mut collection, &config);
    // Fatal errors were already reported through `notify`.
    if let Ok(outcome) = &result {
        if cli.json {
            let json =
                serde_json::to_string_pretty(outcome).context("Failed to serialise outcome")?;
            println!("{json}");
        } else if let Some(report) = outcome.report() {
            if !cli.quiet {
                eprintln!(
                    "   {} {}  {}ms",
                    dim("encoding"),
                    report.encoding,
                    report.duration_ms
                );
            }
        }
    }
    Ok(ExitCode::from(exit_status(&result)))
}
