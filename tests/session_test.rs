//! End-to-end tests for the session dispatch loop.

use spellbee::{
    Dictionary, Event, FeedbackKind, Phase, Puzzle, PuzzleCatalog, Session,
    SessionHandle, Snapshot, ValidationError, ValidationPort, WordListDictionary,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

fn catalog() -> Arc<PuzzleCatalog> {
    Arc::new(
        PuzzleCatalog::new(vec![
            Puzzle::new("racking".chars(), 'k').expect("valid puzzle"),
            Puzzle::new("doublet".chars(), 'b').expect("valid puzzle"),
        ])
        .expect("valid catalog"),
    )
}

fn submit_word(word: &str) -> Event {
    Event::SubmitWord {
        word: word.to_string(),
    }
}

/// Dictionary double that counts lookups and answers yes.
#[derive(Debug, Default)]
struct CountingDictionary {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Dictionary for CountingDictionary {
    async fn contains(&self, _word: &str) -> Result<bool, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Dictionary double that parks each lookup until the test releases it.
#[derive(Debug)]
struct GatedDictionary {
    words: HashSet<String>,
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

impl GatedDictionary {
    fn new<const N: usize>(words: [&str; N]) -> (Self, Arc<Notify>, Arc<AtomicUsize>) {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let dictionary = Self {
            words: words.iter().map(|w| w.to_string()).collect(),
            gate: gate.clone(),
            calls: calls.clone(),
        };
        (dictionary, gate, calls)
    }
}

#[async_trait::async_trait]
impl Dictionary for GatedDictionary {
    async fn contains(&self, word: &str) -> Result<bool, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.words.contains(word))
    }
}

/// Dictionary double whose lookups always fail.
#[derive(Debug)]
struct BrokenDictionary;

#[async_trait::async_trait]
impl Dictionary for BrokenDictionary {
    async fn contains(&self, _word: &str) -> Result<bool, ValidationError> {
        Err(ValidationError::new("dictionary service unreachable"))
    }
}

async fn wait_for_phase(handle: &SessionHandle, phase: Phase) -> Snapshot {
    let mut rx = handle.subscribe();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if *snapshot.phase() == phase {
            return snapshot;
        }
        rx.changed().await.expect("session alive");
    }
}

#[tokio::test]
async fn test_accepted_word_updates_snapshot() {
    // Scenario: letters racking, required k, submit "rack".
    let dictionary = Arc::new(WordListDictionary::from_words(["rack"]));
    let handle = Session::spawn(catalog(), ValidationPort::standard(dictionary));

    let snapshot = handle
        .submit_and_settle(submit_word("rack"))
        .await
        .expect("session alive");

    assert_eq!(*snapshot.phase(), Phase::Accepting);
    assert_eq!(snapshot.context().accepted_words(), &["rack".to_string()]);
    assert_eq!(*snapshot.context().tally(), 1);
    assert_eq!(*snapshot.context().feedback().kind(), FeedbackKind::Success);
    assert_eq!(snapshot.context().pending_input(), "");
}

#[tokio::test]
async fn test_rule_rejection_never_reaches_dictionary() {
    // Scenario: "rain" is missing the required k.
    let dictionary = Arc::new(CountingDictionary::default());
    let handle = Session::spawn(catalog(), ValidationPort::standard(dictionary.clone()));

    let snapshot = handle
        .submit_and_settle(submit_word("rain"))
        .await
        .expect("session alive");

    assert_eq!(snapshot.context().pending_input(), "");
    assert_eq!(*snapshot.context().feedback().kind(), FeedbackKind::Error);
    assert!(snapshot.context().accepted_words().is_empty());
    assert_eq!(*snapshot.context().tally(), 0);
    assert_eq!(dictionary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_word_is_rejected() {
    let dictionary = Arc::new(WordListDictionary::from_words(["rack"]));
    let handle = Session::spawn(catalog(), ValidationPort::standard(dictionary));

    handle
        .submit_and_settle(submit_word("rack"))
        .await
        .expect("session alive");
    let snapshot = handle
        .submit_and_settle(submit_word("rack"))
        .await
        .expect("session alive");

    assert_eq!(snapshot.context().feedback().text(), "already found");
    assert_eq!(*snapshot.context().feedback().kind(), FeedbackKind::Error);
    assert_eq!(snapshot.context().accepted_words(), &["rack".to_string()]);
    assert_eq!(*snapshot.context().tally(), 1);
}

#[tokio::test]
async fn test_lookup_failure_reports_generic_feedback() {
    // Port failure is a distinct path from a semantic rejection.
    let handle = Session::spawn(catalog(), ValidationPort::standard(Arc::new(BrokenDictionary)));

    let snapshot = handle
        .submit_and_settle(submit_word("rack"))
        .await
        .expect("session alive");

    assert_eq!(snapshot.context().feedback().text(), "validation failed");
    assert_eq!(*snapshot.context().feedback().kind(), FeedbackKind::Error);
    assert!(snapshot.context().accepted_words().is_empty());
    assert_eq!(*snapshot.context().tally(), 0);
}

#[tokio::test]
async fn test_events_dropped_while_resolving() {
    let (dictionary, gate, calls) = GatedDictionary::new(["rack"]);
    let handle = Session::spawn(catalog(), ValidationPort::standard(Arc::new(dictionary)));

    handle.submit(submit_word("rack")).expect("session alive");
    wait_for_phase(&handle, Phase::Resolving).await;

    // None of these may touch the context while the validation is out.
    handle
        .submit(Event::AddSymbol { symbol: 'r' })
        .expect("session alive");
    handle.submit(Event::Submit).expect("session alive");
    handle.submit(Event::ClearInput).expect("session alive");

    gate.notify_one();
    let snapshot = handle.settled().await.expect("session alive");

    assert_eq!(snapshot.context().accepted_words(), &["rack".to_string()]);
    assert_eq!(*snapshot.context().tally(), 1);
    assert_eq!(snapshot.context().pending_input(), "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_single_validation_in_flight() {
    let (dictionary, gate, calls) = GatedDictionary::new(["rack", "acing"]);
    let handle = Session::spawn(catalog(), ValidationPort::standard(Arc::new(dictionary)));

    handle.submit(submit_word("rack")).expect("session alive");
    wait_for_phase(&handle, Phase::Resolving).await;

    // A second submission while resolving is absorbed, not queued.
    handle.submit(submit_word("acing")).expect("session alive");

    gate.notify_one();
    let snapshot = handle.settled().await.expect("session alive");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot.context().accepted_words(), &["rack".to_string()]);
}

#[tokio::test]
async fn test_advance_discards_outstanding_validation() {
    // Scenario: advance the puzzle while "rack" is still being validated.
    let (dictionary, gate, _calls) = GatedDictionary::new(["rack"]);
    let handle = Session::spawn(catalog(), ValidationPort::standard(Arc::new(dictionary)));

    handle.submit(submit_word("rack")).expect("session alive");
    wait_for_phase(&handle, Phase::Resolving).await;

    let snapshot = handle
        .submit_and_settle(Event::AdvancePuzzle)
        .await
        .expect("session alive");

    assert_eq!(*snapshot.context().puzzle_index(), 1);
    assert_eq!(*snapshot.context().required(), 'b');
    assert_eq!(*snapshot.context().tally(), 0);
    assert!(snapshot.context().accepted_words().is_empty());

    // Release the (cancelled) lookup; a late completion must not land.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = handle.snapshot();
    assert_eq!(*snapshot.phase(), Phase::Accepting);
    assert_eq!(*snapshot.context().puzzle_index(), 1);
    assert_eq!(*snapshot.context().tally(), 0);
    assert!(snapshot.context().accepted_words().is_empty());
}

#[tokio::test]
async fn test_tally_resets_only_on_advance() {
    let dictionary = Arc::new(WordListDictionary::from_words(["rack", "raking", "bout"]));
    let handle = Session::spawn(catalog(), ValidationPort::standard(dictionary));

    let mut last_tally = 0;
    for word in ["rack", "rain", "raking", "rak"] {
        let snapshot = handle
            .submit_and_settle(submit_word(word))
            .await
            .expect("session alive");
        assert!(
            *snapshot.context().tally() >= last_tally,
            "tally decreased within a puzzle instance"
        );
        last_tally = *snapshot.context().tally();
    }
    assert_eq!(last_tally, 7);

    let snapshot = handle
        .submit_and_settle(Event::AdvancePuzzle)
        .await
        .expect("session alive");
    assert_eq!(*snapshot.context().tally(), 0);

    let snapshot = handle
        .submit_and_settle(submit_word("bout"))
        .await
        .expect("session alive");
    assert_eq!(*snapshot.context().tally(), 1);
}

#[tokio::test]
async fn test_subscribers_see_every_settled_state() {
    let dictionary = Arc::new(WordListDictionary::from_words(["rack"]));
    let handle = Session::spawn(catalog(), ValidationPort::standard(dictionary));
    let mut rx = handle.subscribe();

    handle
        .submit(Event::AddSymbol { symbol: 'r' })
        .expect("session alive");

    rx.changed().await.expect("session alive");
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.context().pending_input(), "r");
    assert_eq!(*snapshot.seq(), 1);
}

#[tokio::test]
async fn test_handles_are_cloneable_across_callers() {
    // The UI and the agent share one session through cloned handles.
    let dictionary = Arc::new(WordListDictionary::from_words(["rack"]));
    let ui = Session::spawn(catalog(), ValidationPort::standard(dictionary));
    let agent = ui.clone();

    ui.submit(Event::AddSymbol { symbol: 'r' }).expect("session alive");
    let snapshot = agent
        .submit_and_settle(submit_word("rack"))
        .await
        .expect("session alive");

    assert_eq!(snapshot.context().accepted_words(), &["rack".to_string()]);
    assert_eq!(*agent.snapshot().context().tally(), 1);
}
