//! End-to-end tests for the import orchestrator.
//!
//! The host prompts are scripted with [`ScriptedHost`] and notes go into a
//! real [`JsonCollection`] inside a temporary directory.

use flashcard_import::{
    run_import, Cancellation, CollectionError, DeckEntry, DeckId, ImportConfig, ImportError,
    ImportOutcome, ImportProgressCallback, Interaction, JsonCollection, Note, NoteId, NoteSink,
    NoteTypeId, SourceEncoding,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

enum TemplateAnswer {
    Preselected,
    Named(&'static str),
    Cancel,
}

/// Answers every prompt from a fixed script and records what it was asked.
struct ScriptedHost {
    file: Option<PathBuf>,
    deck: Option<&'static str>,
    template: TemplateAnswer,
    confirm: bool,

    deck_prompts: usize,
    offered_decks: Vec<String>,
    offered_templates: Vec<String>,
    preselected: Option<usize>,
    confirmed_count: Option<usize>,
    messages: Vec<String>,
}

impl ScriptedHost {
    fn new(file: &Path, deck: &'static str) -> Self {
        Self {
            file: Some(file.to_path_buf()),
            deck: Some(deck),
            template: TemplateAnswer::Preselected,
            confirm: true,
            deck_prompts: 0,
            offered_decks: Vec::new(),
            offered_templates: Vec::new(),
            preselected: None,
            confirmed_count: None,
            messages: Vec::new(),
        }
    }
}

impl Interaction for ScriptedHost {
    fn choose_file(&mut self) -> Option<PathBuf> {
        self.file.take()
    }

    fn pick_deck(&mut self, decks: &[DeckEntry]) -> Option<String> {
        self.deck_prompts += 1;
        self.offered_decks = decks.iter().map(|d| d.name.clone()).collect();
        self.deck.map(str::to_string)
    }

    fn pick_template(&mut self, templates: &[String], preselected: usize) -> Option<String> {
        self.offered_templates = templates.to_vec();
        self.preselected = Some(preselected);
        match self.template {
            TemplateAnswer::Preselected => templates.get(preselected).cloned(),
            TemplateAnswer::Named(name) => Some(name.to_string()),
            TemplateAnswer::Cancel => None,
        }
    }

    fn confirm(&mut self, card_count: usize) -> bool {
        self.confirmed_count = Some(card_count);
        self.confirm
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Wraps a collection and rejects the n-th `add_note` call (1-based).
struct FlakySink {
    inner: JsonCollection,
    fail_on_add: usize,
    adds: usize,
    persists: usize,
}

impl NoteSink for FlakySink {
    fn decks(&self) -> Vec<DeckEntry> {
        self.inner.decks()
    }

    fn template_names(&self) -> Vec<String> {
        self.inner.template_names()
    }

    fn find_template(&self, name: &str) -> Option<NoteTypeId> {
        self.inner.find_template(name)
    }

    fn resolve_deck(&mut self, name: &str) -> Result<DeckId, CollectionError> {
        self.inner.resolve_deck(name)
    }

    fn select_deck(&mut self, deck: DeckId, note_type: NoteTypeId) -> Result<(), CollectionError> {
        self.inner.select_deck(deck, note_type)
    }

    fn create_note(&self, note_type: NoteTypeId) -> Result<Note, CollectionError> {
        self.inner.create_note(note_type)
    }

    fn add_note(&mut self, note: Note, deck: DeckId) -> Result<NoteId, CollectionError> {
        self.adds += 1;
        if self.adds == self.fail_on_add {
            return Err(CollectionError::UnknownDeck(deck.0));
        }
        self.inner.add_note(note, deck)
    }

    fn persist(&mut self) -> Result<(), CollectionError> {
        self.persists += 1;
        self.inner.persist()
    }
}

/// Route library logs through the test harness; `RUST_LOG` selects the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        init_tracing();
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn write(&self, name: &str, bytes: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).expect("write input");
        path
    }

    fn collection_path(&self) -> PathBuf {
        self.dir.path().join("collection.json")
    }

    fn collection(&self) -> JsonCollection {
        JsonCollection::create(self.collection_path()).expect("new collection")
    }

    /// A second, separately named collection in the same directory.
    fn collection_in(&self, name: &str) -> JsonCollection {
        JsonCollection::create(self.dir.path().join(format!("{name}.json")))
            .expect("new collection")
    }

    fn reopen(&self) -> JsonCollection {
        JsonCollection::open(self.collection_path()).expect("reopen collection")
    }
}

fn completed(outcome: ImportOutcome) -> flashcard_import::ImportReport {
    match outcome {
        ImportOutcome::Completed(r) => r,
        other => panic!("expected completed import, got {other:?}"),
    }
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[test]
fn imports_two_cards_into_two_field_template() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "  #flashcard Q1\nA1 #flashcard Q2\nA2");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Chinese");

    let report = completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(report.candidates, 2);
    assert_eq!(report.imported, 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.note_type, "Basic");
    assert_eq!(report.encoding, SourceEncoding::Utf8);
    assert_eq!(host.confirmed_count, Some(2));
    assert_eq!(
        host.messages.last().map(String::as_str),
        Some("Imported 2 card(s) into deck 'Chinese'")
    );

    let saved = ws.reopen();
    let deck = saved
        .deck_list()
        .iter()
        .find(|d| d.name == "Chinese")
        .expect("deck created")
        .id;
    let fields: Vec<Vec<String>> = saved
        .notes()
        .iter()
        .map(|n| n.note.fields().to_vec())
        .collect();
    assert_eq!(
        fields,
        vec![
            vec!["Q1<br>A1".to_string(), String::new()],
            vec!["Q2<br>A2".to_string(), String::new()],
        ]
    );
    assert!(saved.notes().iter().all(|n| n.note.deck() == Some(deck)));
}

#[test]
fn import_selects_deck_and_remembers_note_type() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "q");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Vocab");
    host.template = TemplateAnswer::Named("Cloze");

    completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    let saved = ws.reopen();
    let cloze = saved.find_template("Cloze");
    let vocab = saved
        .deck_list()
        .iter()
        .find(|d| d.name == "Vocab")
        .expect("deck created");
    assert_eq!(saved.current_deck(), Some(vocab.id));
    assert_eq!(vocab.default_note_type, cloze);
    let default = saved.deck_list().iter().find(|d| d.name == "Default").unwrap();
    assert_eq!(default.default_note_type, None);
}

#[test]
fn preselects_basic_from_sorted_templates() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "one");
    let mut col = ws.collection();
    col.add_note_type("Alpha", &["Front"]);
    let mut host = ScriptedHost::new(&input, "Default");

    completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(
        host.offered_templates,
        vec!["Alpha", "Basic", "Basic (and reversed card)", "Cloze"]
    );
    assert_eq!(host.preselected, Some(1));
    assert!(host.offered_decks.contains(&"Default".to_string()));
}

#[test]
fn formatting_and_tags_reach_the_note() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "#flashcard a  b\tc\nd");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");
    let config = ImportConfig::builder().tag("bulk").build().unwrap();

    completed(run_import(&mut host, &mut col, &config).unwrap());

    let saved = ws.reopen();
    let note = &saved.notes()[0].note;
    assert_eq!(
        note.fields()[0],
        "a &nbsp;b&nbsp;&nbsp;&nbsp;&nbsp;c<br>d"
    );
    assert_eq!(note.tags, vec!["bulk"]);
}

#[test]
fn single_field_template_gets_only_first_field() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "front only");
    let mut col = ws.collection();
    col.add_note_type("Single", &["Text"]);
    let mut host = ScriptedHost::new(&input, "Default");
    host.template = TemplateAnswer::Named("Single");

    let report = completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(report.imported, 1);
    assert_eq!(ws.reopen().notes()[0].note.fields(), &["front only".to_string()]);
}

#[test]
fn gbk_file_is_decoded() {
    let ws = Workspace::new();
    let (bytes, _, had_errors) = encoding_rs::GBK.encode("问题#flashcard答案");
    assert!(!had_errors);
    assert!(std::str::from_utf8(&bytes).is_err());
    let input = ws.write("gbk.txt", &bytes);
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");

    let report = completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(report.encoding, SourceEncoding::Gbk);
    let saved = ws.reopen();
    let fronts: Vec<&str> = saved
        .notes()
        .iter()
        .map(|n| n.note.fields()[0].as_str())
        .collect();
    assert_eq!(fronts, vec!["问题", "答案"]);
}

#[test]
fn utf16_file_is_decoded() {
    let ws = Workspace::new();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "Q#flashcardA".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let input = ws.write("utf16.txt", &bytes);
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");

    let report = completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(report.encoding, SourceEncoding::Utf16);
    assert_eq!(report.imported, 2);
}

// ── Per-note failures ────────────────────────────────────────────────────────

#[test]
fn failed_note_is_skipped_and_batch_persists_once() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "one#flashcardtwo#flashcardthree");
    let mut sink = FlakySink {
        inner: ws.collection(),
        fail_on_add: 2,
        adds: 0,
        persists: 0,
    };
    let mut host = ScriptedHost::new(&input, "Default");

    let report = completed(run_import(&mut host, &mut sink, &ImportConfig::default()).unwrap());

    assert_eq!(report.candidates, 3);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].card(), 2);
    assert_eq!(sink.persists, 1);

    let fronts: Vec<String> = ws
        .reopen()
        .notes()
        .iter()
        .map(|n| n.note.fields()[0].clone())
        .collect();
    assert_eq!(fronts, vec!["one", "three"]);
}

#[test]
fn template_without_fields_imports_nothing_but_completes() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "a#flashcardb");
    let mut col = ws.collection();
    col.add_note_type("Empty", &[]);
    let mut host = ScriptedHost::new(&input, "Default");
    host.template = TemplateAnswer::Named("Empty");

    let report = completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());

    assert_eq!(report.candidates, 2);
    assert_eq!(report.imported, 0);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(
        host.messages.last().map(String::as_str),
        Some("Imported 0 card(s) into deck 'Default'")
    );
}

#[test]
fn progress_callback_sees_every_card() {
    #[derive(Default)]
    struct Counts {
        added: AtomicUsize,
        errors: AtomicUsize,
        done: AtomicUsize,
    }
    impl ImportProgressCallback for Counts {
        fn on_note_added(&self, _card: usize, _total: usize) {
            self.added.fetch_add(1, Ordering::SeqCst);
        }
        fn on_note_error(&self, _card: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_import_complete(&self, _total: usize, imported: usize) {
            self.done.store(imported, Ordering::SeqCst);
        }
    }

    let ws = Workspace::new();
    let input = ws.write("cards.txt", "1#flashcard2#flashcard3");
    let mut sink = FlakySink {
        inner: ws.collection(),
        fail_on_add: 3,
        adds: 0,
        persists: 0,
    };
    let counts = Arc::new(Counts::default());
    let config = ImportConfig::builder()
        .progress_callback(counts.clone())
        .build()
        .unwrap();
    let mut host = ScriptedHost::new(&input, "Default");

    completed(run_import(&mut host, &mut sink, &config).unwrap());

    assert_eq!(counts.added.load(Ordering::SeqCst), 2);
    assert_eq!(counts.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counts.done.load(Ordering::SeqCst), 2);
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[test]
fn whitespace_only_file_aborts_before_any_picker() {
    let ws = Workspace::new();
    let input = ws.write("blank.txt", "   \n\t  \n");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");

    let err = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap_err();

    assert!(matches!(err, ImportError::NoCards { .. }));
    assert_eq!(host.deck_prompts, 0);
    assert!(host.messages[0].contains("No cards found"));
    assert!(!ws.collection_path().exists());
}

#[test]
fn empty_file_is_reported() {
    let ws = Workspace::new();
    let input = ws.write("empty.txt", "");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");

    let err = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap_err();

    assert!(matches!(err, ImportError::EmptyInput { .. }));
    assert_eq!(host.messages.len(), 1);
}

#[test]
fn bom_only_files_are_empty() {
    let ws = Workspace::new();
    let bom_files: [(&str, &[u8]); 2] = [
        ("utf8-bom.txt", b"\xEF\xBB\xBF"),
        ("utf16-bom.txt", &[0xFF, 0xFE]),
    ];

    for (name, bytes) in bom_files {
        let input = ws.write(name, bytes);
        let mut col = ws.collection_in(name);
        let mut host = ScriptedHost::new(&input, "Default");

        let err = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap_err();

        assert!(matches!(err, ImportError::EmptyInput { .. }), "{name}: {err:?}");
        assert_eq!(host.deck_prompts, 0, "{name}");
        assert!(col.notes().is_empty(), "{name}");
    }
}

#[test]
fn missing_file_is_unreadable() {
    let ws = Workspace::new();
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&ws.dir.path().join("nope.txt"), "Default");

    let err = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap_err();

    assert!(matches!(err, ImportError::Unreadable { .. }));
    assert!(host.messages[0].contains("nope.txt"));
}

#[test]
fn unknown_template_is_fatal_and_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "q");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");
    host.template = TemplateAnswer::Named("Gone");

    let err = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap_err();

    assert!(matches!(err, ImportError::TemplateNotFound { ref name } if name == "Gone"));
    assert!(host.messages[0].contains("Gone"));
    assert!(col.notes().is_empty());
    assert!(!ws.collection_path().exists());
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[test]
fn no_file_chosen_cancels_silently() {
    let ws = Workspace::new();
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(Path::new("unused"), "Default");
    host.file = None;

    let outcome = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap();

    assert!(matches!(
        outcome,
        ImportOutcome::Cancelled {
            reason: Cancellation::NoFileChosen
        }
    ));
    assert!(host.messages.is_empty());
    assert_eq!(host.deck_prompts, 0);
}

#[test]
fn no_deck_chosen_cancels_silently() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "q");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");
    host.deck = None;

    let outcome = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap();

    assert!(matches!(
        outcome,
        ImportOutcome::Cancelled {
            reason: Cancellation::NoDeckChosen
        }
    ));
    assert!(host.messages.is_empty());
    assert!(host.preselected.is_none());
}

#[test]
fn no_template_chosen_cancels_silently() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "q");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "Default");
    host.template = TemplateAnswer::Cancel;

    let outcome = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap();

    assert!(outcome.is_cancelled());
    assert!(host.confirmed_count.is_none());
}

#[test]
fn declining_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "a#flashcardb#flashcardc");
    let mut col = ws.collection();
    let mut host = ScriptedHost::new(&input, "New Deck");
    host.confirm = false;

    let outcome = run_import(&mut host, &mut col, &ImportConfig::default()).unwrap();

    assert!(matches!(
        outcome,
        ImportOutcome::Cancelled {
            reason: Cancellation::Declined
        }
    ));
    assert_eq!(host.confirmed_count, Some(3));
    assert!(col.notes().is_empty());
    assert!(!col.deck_list().iter().any(|d| d.name == "New Deck"));
    assert!(!ws.collection_path().exists());
}

#[test]
fn running_twice_duplicates_notes() {
    let ws = Workspace::new();
    let input = ws.write("cards.txt", "a#flashcardb");
    let mut col = ws.collection();

    for _ in 0..2 {
        let mut host = ScriptedHost::new(&input, "Default");
        completed(run_import(&mut host, &mut col, &ImportConfig::default()).unwrap());
    }

    assert_eq!(ws.reopen().notes().len(), 4);
}
