//! Session controller behaviour driven through a scripted shell
//!
//! The shell answers prompts from a script and records everything rendered;
//! the store counts saves and can be told to fail.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use teachbot::knowledge::{self, JsonFileStore, KnowledgeBase, KnowledgeEntry, KnowledgeStore, StorageError};
use teachbot::matcher::Matcher;
use teachbot::session::{SessionController, SessionState, TurnOutcome, LEARNED_ACK, TEACH_PROMPT};
use teachbot::shell::{Shell, ShellEvent};

#[derive(Default)]
struct ScriptedShell {
    yes_no: VecDeque<bool>,
    texts: VecDeque<Option<String>>,
    user_lines: Vec<String>,
    bot_lines: Vec<String>,
    warnings: Vec<String>,
    yes_no_asked: Vec<String>,
    text_asked: usize,
    clears: usize,
}

impl ScriptedShell {
    fn new() -> Self {
        Self::default()
    }

    fn will_teach(mut self, answer: &str) -> Self {
        self.yes_no.push_back(true);
        self.texts.push_back(Some(answer.to_string()));
        self
    }

    fn will_decline(mut self) -> Self {
        self.yes_no.push_back(false);
        self
    }

    fn will_cancel_answer(mut self) -> Self {
        self.yes_no.push_back(true);
        self.texts.push_back(None);
        self
    }
}

impl Shell for ScriptedShell {
    fn next_event(&mut self) -> ShellEvent {
        ShellEvent::Closed
    }

    fn render_user_line(&mut self, text: &str) {
        self.user_lines.push(text.to_string());
    }

    fn render_bot_line(&mut self, text: &str) {
        self.bot_lines.push(text.to_string());
    }

    fn render_warning(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }

    fn prompt_yes_no(&mut self, _title: &str, message: &str) -> bool {
        self.yes_no_asked.push(message.to_string());
        self.yes_no.pop_front().expect("unexpected yes/no prompt")
    }

    fn prompt_text(&mut self, _title: &str, _message: &str) -> Option<String> {
        self.text_asked += 1;
        self.texts.pop_front().expect("unexpected text prompt")
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// In-memory store that counts saves and can simulate a failing disk
#[derive(Default)]
struct CountingStore {
    initial: KnowledgeBase,
    saved: RefCell<Option<KnowledgeBase>>,
    saves: Cell<usize>,
    fail_saves: bool,
}

impl CountingStore {
    fn with(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            initial: KnowledgeBase::from_entries(entries),
            ..Default::default()
        }
    }

    fn failing(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            fail_saves: true,
            ..Self::with(entries)
        }
    }
}

impl KnowledgeStore for CountingStore {
    fn load(&self) -> Result<KnowledgeBase, StorageError> {
        Ok(self.initial.clone())
    }

    fn save(&self, base: &KnowledgeBase) -> Result<(), StorageError> {
        self.saves.set(self.saves.get() + 1);
        if self.fail_saves {
            return Err(StorageError::Io {
                path: "memory.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        *self.saved.borrow_mut() = Some(base.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

fn controller(entries: Vec<KnowledgeEntry>) -> SessionController<CountingStore> {
    SessionController::new(CountingStore::with(entries), Matcher::default()).unwrap()
}

#[test]
fn test_fuzzy_hit_returns_exact_answer() {
    let mut session = controller(vec![KnowledgeEntry::new("hi there", "hello!")]);
    let mut shell = ScriptedShell::new();

    let outcome = session.handle_input("hii there", &mut shell);

    assert_eq!(
        outcome,
        TurnOutcome::Answered {
            question: "hi there".to_string(),
            answer: "hello!".to_string(),
        }
    );
    assert_eq!(shell.user_lines, vec!["hii there"]);
    assert_eq!(shell.bot_lines, vec!["hello!"]);
    assert!(shell.yes_no_asked.is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_miss_on_empty_base_triggers_teach_prompt() {
    let mut session = controller(vec![]);
    let mut shell = ScriptedShell::new().will_decline();

    let outcome = session.handle_input("anything", &mut shell);

    assert_eq!(outcome, TurnOutcome::Declined);
    assert_eq!(shell.yes_no_asked, vec![TEACH_PROMPT]);
}

#[test]
fn test_quit_ends_session_without_changes() {
    let mut session = controller(vec![KnowledgeEntry::new("hi", "hello!")]);
    let mut shell = ScriptedShell::new();

    assert_eq!(session.handle_input("  QUIT ", &mut shell), TurnOutcome::Terminated);
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(session.is_terminated());
    assert_eq!(session.knowledge().len(), 1);
    assert_eq!(session.store().saves.get(), 0);
    assert!(shell.user_lines.is_empty());
    assert!(session.transcript().is_empty());

    // nothing further is processed
    assert_eq!(session.handle_input("hi", &mut shell), TurnOutcome::Terminated);
    assert!(shell.bot_lines.is_empty());
}

#[test]
fn test_custom_quit_command() {
    let mut session = controller(vec![]).with_quit_command("bye");
    let mut shell = ScriptedShell::new().will_decline();

    assert_eq!(session.handle_input("quit", &mut shell), TurnOutcome::Declined);
    assert_eq!(session.handle_input("Bye", &mut shell), TurnOutcome::Terminated);
}

#[test]
fn test_teach_appends_saves_and_answers_next_time() {
    let mut session = controller(vec![KnowledgeEntry::new("hi there", "hello!")]);
    let mut shell = ScriptedShell::new().will_teach("42");

    assert_eq!(session.handle_input("meaning of life", &mut shell), TurnOutcome::Learned);
    assert_eq!(shell.text_asked, 1);
    assert_eq!(shell.bot_lines, vec![LEARNED_ACK]);

    let entries = session.knowledge().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1], KnowledgeEntry::new("meaning of life", "42"));

    assert_eq!(session.store().saves.get(), 1);
    assert_eq!(
        session.store().saved.borrow().as_ref(),
        Some(session.knowledge())
    );

    let outcome = session.handle_input("meaning of life", &mut shell);
    assert_eq!(
        outcome,
        TurnOutcome::Answered {
            question: "meaning of life".to_string(),
            answer: "42".to_string(),
        }
    );
    assert_eq!(shell.yes_no_asked.len(), 1);
}

#[test]
fn test_declined_teach_leaves_base_untouched() {
    let mut session = controller(vec![KnowledgeEntry::new("hi", "hello!")]);
    let before = session.knowledge().clone();
    let mut shell = ScriptedShell::new().will_decline();

    assert_eq!(session.handle_input("what time is it", &mut shell), TurnOutcome::Declined);
    assert_eq!(session.knowledge(), &before);
    assert_eq!(session.store().saves.get(), 0);
    assert_eq!(shell.text_asked, 0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_cancelled_or_blank_answer_is_discarded() {
    let mut session = controller(vec![]);
    let mut shell = ScriptedShell::new().will_cancel_answer().will_teach("   ");

    assert_eq!(session.handle_input("first", &mut shell), TurnOutcome::Discarded);
    assert_eq!(session.handle_input("second", &mut shell), TurnOutcome::Discarded);
    assert!(session.knowledge().is_empty());
    assert_eq!(session.store().saves.get(), 0);
}

#[test]
fn test_taught_answer_is_stored_as_typed() {
    let mut session = controller(vec![]);
    let mut shell = ScriptedShell::new().will_teach("  blue, mostly ");

    session.handle_input("  favourite colour ", &mut shell);
    assert_eq!(
        session.knowledge().entries(),
        &[KnowledgeEntry::new("favourite colour", "  blue, mostly ")]
    );
    assert_eq!(
        session.lookup("favourite colour").map(|e| e.answer),
        Some("  blue, mostly ".to_string())
    );
}

#[test]
fn test_blank_input_is_ignored() {
    let mut session = controller(vec![KnowledgeEntry::new("hi", "hello!")]);
    let mut shell = ScriptedShell::new();

    assert_eq!(session.handle_input("   \t", &mut shell), TurnOutcome::Ignored);
    assert!(session.transcript().is_empty());
    assert!(shell.user_lines.is_empty());
    assert!(shell.yes_no_asked.is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_save_failure_warns_and_keeps_entry() {
    let store = CountingStore::failing(vec![]);
    let mut session = SessionController::new(store, Matcher::default()).unwrap();
    let mut shell = ScriptedShell::new().will_teach("42");

    let outcome = session.handle_input("meaning of life", &mut shell);

    match outcome {
        TurnOutcome::LearnedUnsaved { error } => assert!(error.contains("read-only"), "{}", error),
        other => panic!("expected LearnedUnsaved, got {:?}", other),
    }
    assert_eq!(shell.warnings.len(), 1);
    assert!(shell.warnings[0].contains("could not save"));
    assert!(shell.bot_lines.is_empty());

    // still remembered for this session
    assert_eq!(session.knowledge().len(), 1);
    assert_eq!(
        session.handle_input("meaning of life", &mut shell),
        TurnOutcome::Answered {
            question: "meaning of life".to_string(),
            answer: "42".to_string(),
        }
    );
}

#[test]
fn test_same_question_twice_same_answer() {
    let mut session = controller(vec![
        KnowledgeEntry::new("how are you", "fine"),
        KnowledgeEntry::new("who are you", "a bot"),
    ]);
    let mut shell = ScriptedShell::new();

    let first = session.handle_input("how are you?", &mut shell);
    let second = session.handle_input("how are you?", &mut shell);
    assert_eq!(first, second);
    assert_eq!(shell.bot_lines, vec!["fine", "fine"]);
}

#[test]
fn test_duplicate_questions_answer_from_first() {
    let mut session = controller(vec![
        KnowledgeEntry::new("hi", "first"),
        KnowledgeEntry::new("hi", "second"),
    ]);
    let mut shell = ScriptedShell::new();

    assert_eq!(
        session.handle_input("hi", &mut shell),
        TurnOutcome::Answered {
            question: "hi".to_string(),
            answer: "first".to_string(),
        }
    );
}

#[test]
fn test_threshold_is_configurable() {
    let store = CountingStore::with(vec![KnowledgeEntry::new("hi there", "hello!")]);
    let mut strict = SessionController::new(store, Matcher::new(0.95).unwrap()).unwrap();
    let mut shell = ScriptedShell::new().will_decline();

    assert_eq!(strict.handle_input("hii there", &mut shell), TurnOutcome::Declined);
    assert_eq!(strict.matcher().threshold(), 0.95);
}

#[test]
fn test_transcript_and_clear() {
    let mut session = controller(vec![KnowledgeEntry::new("hi there", "hello!")]);
    let mut shell = ScriptedShell::new();

    session.handle_input("hi there", &mut shell);
    assert_eq!(session.transcript().render(), "You: hi there\nBot: hello!");

    session.clear_history(&mut shell);
    assert!(session.transcript().is_empty());
    assert_eq!(shell.clears, 1);
    assert_eq!(session.knowledge().len(), 1);
}

#[test]
fn test_lookup_without_a_turn() {
    let session = controller(vec![KnowledgeEntry::new("hi there", "hello!")]);
    assert_eq!(
        session.lookup("hi ther"),
        Some(KnowledgeEntry::new("hi there", "hello!"))
    );
    assert_eq!(session.lookup("completely different"), None);
    assert!(session.transcript().is_empty());
}

#[test]
fn test_missing_questions_key_prevents_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.json");
    std::fs::write(&path, r#"{"faq": [{"question": "hi", "answer": "hello!"}]}"#).unwrap();

    let result = SessionController::new(JsonFileStore::new(&path), Matcher::default());
    assert!(matches!(result, Err(StorageError::Malformed { .. })));
}

#[test]
fn test_missing_file_prevents_session() {
    let dir = tempfile::tempdir().unwrap();
    let result = SessionController::new(
        JsonFileStore::new(dir.path().join("absent.json")),
        Matcher::default(),
    );
    assert!(matches!(result, Err(StorageError::NotFound { .. })));
}

#[test]
fn test_teaching_persists_to_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.json");
    knowledge::save(&path, &KnowledgeBase::from_entries(vec![KnowledgeEntry::new("hi", "hello!")])).unwrap();

    let mut session = SessionController::new(JsonFileStore::new(&path), Matcher::default()).unwrap();
    let mut shell = ScriptedShell::new().will_teach("42");
    assert_eq!(session.handle_input("meaning of life", &mut shell), TurnOutcome::Learned);

    let reloaded = knowledge::load(&path).unwrap();
    assert_eq!(
        reloaded.entries(),
        &[
            KnowledgeEntry::new("hi", "hello!"),
            KnowledgeEntry::new("meaning of life", "42"),
        ]
    );
}

#[test]
fn test_file_roundtrip_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.json");
    std::fs::write(
        &path,
        r#"{"questions": [{"question": "b", "answer": "2"}, {"question": "a", "answer": "1"}, {"question": "b", "answer": "3"}]}"#,
    )
    .unwrap();

    let first = knowledge::load(&path).unwrap();
    knowledge::save(&path, &first).unwrap();
    let second = knowledge::load(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.questions(), vec!["b", "a", "b"]);
}
