use super::*;

use std::{
    collections::{HashSet, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use shared::error::UnavailableReason;
use tokio::sync::{Barrier, Mutex, Notify};

struct TestJokeSource {
    kind: SourceKind,
    label: &'static str,
    script: Mutex<VecDeque<Option<String>>>,
    fail_with: Option<UnavailableReason>,
    gate: Option<Arc<Barrier>>,
    release: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl TestJokeSource {
    fn ok(kind: SourceKind, texts: &[&str]) -> Self {
        Self {
            kind,
            label: label_for(kind),
            script: Mutex::new(texts.iter().map(|t| Some(t.to_string())).collect()),
            fail_with: None,
            gate: None,
            release: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(kind: SourceKind, reason: UnavailableReason) -> Self {
        Self {
            fail_with: Some(reason),
            ..Self::ok(kind, &[])
        }
    }

    /// Plays `pattern` one item per call; `None` fails the call.
    fn scripted(kind: SourceKind, pattern: &[Option<&str>]) -> Self {
        Self {
            script: Mutex::new(pattern.iter().map(|p| p.map(str::to_string)).collect()),
            ..Self::ok(kind, &[])
        }
    }

    fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn with_release(mut self, release: Arc<Notify>) -> Self {
        self.release = Some(release);
        self
    }
}

fn label_for(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Primary => "Official Joke API",
        SourceKind::Secondary => "JokeAPI.dev",
    }
}

#[async_trait]
impl JokeSource for TestJokeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn label(&self) -> &str {
        self.label
    }

    async fn fetch(&self) -> Result<NormalizedJoke, SourceUnavailable> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(release) = &self.release {
            release.notified().await;
        }
        if let Some(reason) = &self.fail_with {
            return Err(SourceUnavailable::new(self.kind, reason.clone()));
        }

        let next = self.script.lock().await.pop_front();
        match next {
            Some(Some(text)) => Ok(NormalizedJoke::new(self.kind, self.label, text)),
            Some(None) => Err(SourceUnavailable::new(
                self.kind,
                UnavailableReason::Status(500),
            )),
            None => Ok(NormalizedJoke::new(
                self.kind,
                self.label,
                format!("{} joke {call}", self.kind),
            )),
        }
    }
}

fn board_with(primary: TestJokeSource, secondary: TestJokeSource) -> (JokeBoard, Arc<HistoryStore>) {
    let history = Arc::new(HistoryStore::new());
    let board = JokeBoard::new(Arc::new(primary), Arc::new(secondary), Arc::clone(&history));
    (board, history)
}

#[tokio::test]
async fn both_sources_succeeding_write_two_entries() {
    let (board, history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &["What's brown and sticky?\n\nA stick."]),
        TestJokeSource::ok(SourceKind::Secondary, &["I told a chemistry joke. No reaction."]),
    );

    let outcome = board.refresh().await;

    assert!(outcome.succeeded(SourceKind::Primary));
    assert!(outcome.succeeded(SourceKind::Secondary));
    assert_eq!(outcome.notice, None);
    assert_eq!(outcome.entries_written().len(), 2);

    let listed = history.list().await;
    assert_eq!(listed.len(), 2);
    let kinds: HashSet<SourceKind> = listed.iter().map(|e| e.source_kind).collect();
    assert_eq!(kinds, HashSet::from(SourceKind::ALL));

    assert_eq!(
        board.slot(SourceKind::Primary).text(),
        Some("What's brown and sticky?\n\nA stick.")
    );
    assert_eq!(
        board.slot(SourceKind::Secondary).text(),
        Some("I told a chemistry joke. No reaction.")
    );
    assert!(!board.loading());
}

#[tokio::test]
async fn primary_failure_leaves_secondary_independent() {
    let (board, history) = board_with(
        TestJokeSource::failing(SourceKind::Primary, UnavailableReason::Timeout),
        TestJokeSource::ok(SourceKind::Secondary, &["Single-line joke."]),
    );
    let mut events = board.subscribe_events();

    let outcome = board.refresh().await;

    assert!(!outcome.succeeded(SourceKind::Primary));
    assert!(outcome.succeeded(SourceKind::Secondary));
    assert_eq!(outcome.notice, None);

    let listed = history.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].source_kind, SourceKind::Secondary);
    assert_eq!(listed[0].text, "Single-line joke.");

    assert!(board.slot(SourceKind::Primary).is_unavailable());
    assert_eq!(board.slot(SourceKind::Secondary).text(), Some("Single-line joke."));

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, BoardEvent::Notice(_)), "unexpected notice");
    }
}

#[tokio::test]
async fn secondary_failure_leaves_primary_independent() {
    let (board, history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &["Setup\n\nPunchline"]),
        TestJokeSource::failing(
            SourceKind::Secondary,
            UnavailableReason::Malformed("missing field `delivery`".into()),
        ),
    );

    let outcome = board.refresh().await;

    assert_eq!(outcome.entries_written().len(), 1);
    assert_eq!(outcome.notice, None);
    assert_eq!(history.len().await, 1);
    assert_eq!(board.slot(SourceKind::Primary).text(), Some("Setup\n\nPunchline"));
    assert!(board.slot(SourceKind::Secondary).is_unavailable());
}

#[tokio::test]
async fn total_failure_fires_one_notice_and_writes_nothing() {
    let (board, history) = board_with(
        TestJokeSource::failing(
            SourceKind::Primary,
            UnavailableReason::Transport("connection refused".into()),
        ),
        TestJokeSource::failing(SourceKind::Secondary, UnavailableReason::Status(502)),
    );
    let mut events = board.subscribe_events();

    let outcome = board.refresh().await;

    assert_eq!(outcome.notice, Some(LoadNotice::AllSourcesFailed));
    assert!(outcome.entries_written().is_empty());
    assert!(history.is_empty().await);

    let mut notices = 0;
    while let Ok(event) = events.try_recv() {
        if let BoardEvent::Notice(notice) = event {
            assert_eq!(notice.message(), ALL_SOURCES_FAILED_MESSAGE);
            notices += 1;
        }
    }
    assert_eq!(notices, 1);
    assert!(!board.loading());
}

#[tokio::test]
async fn notice_fires_once_per_failed_refresh() {
    let (board, _history) = board_with(
        TestJokeSource::failing(SourceKind::Primary, UnavailableReason::Timeout),
        TestJokeSource::failing(SourceKind::Secondary, UnavailableReason::Timeout),
    );
    let mut events = board.subscribe_events();

    board.refresh().await;
    board.refresh().await;

    let mut notices = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, BoardEvent::Notice(LoadNotice::AllSourcesFailed)) {
            notices += 1;
        }
    }
    assert_eq!(notices, 2);
}

#[tokio::test]
async fn successful_slot_never_keeps_stale_content() {
    let (board, history) = board_with(
        TestJokeSource::scripted(SourceKind::Primary, &[Some("first primary"), None]),
        TestJokeSource::scripted(
            SourceKind::Secondary,
            &[Some("first secondary"), Some("second secondary")],
        ),
    );

    board.refresh().await;
    board.refresh().await;

    assert!(board.slot(SourceKind::Primary).is_unavailable());
    assert_eq!(
        board.slot(SourceKind::Secondary).text(),
        Some("second secondary")
    );

    let texts: Vec<String> = history.list().await.into_iter().map(|e| e.text).collect();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], "second secondary");
    assert!(texts.contains(&"first primary".to_string()));
    assert!(texts.contains(&"first secondary".to_string()));
}

#[tokio::test]
async fn overlapping_refreshes_write_four_distinct_entries() {
    // All four fetches must be in flight before any of them completes.
    let gate = Arc::new(Barrier::new(4));
    let (board, history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &[]).with_gate(Arc::clone(&gate)),
        TestJokeSource::ok(SourceKind::Secondary, &[]).with_gate(gate),
    );

    let (first, second) = tokio::join!(board.refresh(), board.refresh());

    assert_eq!(first.entries_written().len(), 2);
    assert_eq!(second.entries_written().len(), 2);

    let listed = history.list().await;
    assert_eq!(listed.len(), 4);
    let ids: HashSet<_> = listed.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), 4);
    assert!(!board.loading());
}

#[tokio::test]
async fn loading_flag_is_raised_while_a_source_is_pending() {
    let release = Arc::new(Notify::new());
    let history = Arc::new(HistoryStore::new());
    let board = Arc::new(JokeBoard::new(
        Arc::new(
            TestJokeSource::ok(SourceKind::Primary, &["slow"]).with_release(Arc::clone(&release)),
        ),
        Arc::new(TestJokeSource::ok(SourceKind::Secondary, &["fast"])),
        Arc::clone(&history),
    ));
    let mut loading = board.watch_loading();

    let task = {
        let board = Arc::clone(&board);
        tokio::spawn(async move { board.refresh().await })
    };

    loading
        .wait_for(|loading| *loading)
        .await
        .expect("loading raised");
    assert!(board.loading());
    assert!(history.is_empty().await, "no entries before both settle");

    release.notify_one();
    let outcome = task.await.expect("refresh task");

    assert_eq!(outcome.entries_written().len(), 2);
    assert!(!board.loading());
    assert_eq!(history.len().await, 2);
}

#[tokio::test]
async fn slot_watchers_see_each_update() {
    let (board, _history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &["p"]),
        TestJokeSource::ok(SourceKind::Secondary, &["s"]),
    );
    let mut slots = board.watch_slots();

    board.refresh().await;

    assert!(slots.has_changed().expect("sender alive"));
    let current = slots.borrow_and_update().clone();
    assert_eq!(current.get(SourceKind::Primary).text(), Some("p"));
    assert_eq!(current.get(SourceKind::Secondary).text(), Some("s"));
    assert_eq!(current, board.slots());
}

#[tokio::test]
async fn loading_events_bracket_a_refresh() {
    let (board, _history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &["p"]),
        TestJokeSource::ok(SourceKind::Secondary, &["s"]),
    );
    let mut events = board.subscribe_events();

    board.refresh().await;

    let mut loading_changes = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let BoardEvent::LoadingChanged(loading) = event {
            loading_changes.push(loading);
        }
    }
    assert_eq!(loading_changes, vec![true, false]);
}

#[tokio::test]
async fn clear_through_board_history_keeps_ids_fresh() {
    let (board, _history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &[]),
        TestJokeSource::ok(SourceKind::Secondary, &[]),
    );

    let first = board.refresh().await;
    let issued: HashSet<_> = first
        .entries_written()
        .into_iter()
        .map(|e| e.id.clone())
        .collect();

    board.history().clear().await;
    assert!(board.history().list().await.is_empty());

    let second = board.refresh().await;
    for entry in second.entries_written() {
        assert!(!issued.contains(&entry.id));
    }
    assert_eq!(board.history().len().await, 2);
}

#[test]
fn source_labels_come_from_the_sources() {
    let (board, _history) = board_with(
        TestJokeSource::ok(SourceKind::Primary, &[]),
        TestJokeSource::ok(SourceKind::Secondary, &[]),
    );
    assert_eq!(board.source_label(SourceKind::Primary), "Official Joke API");
    assert_eq!(board.source_label(SourceKind::Secondary), "JokeAPI.dev");
    assert_eq!(board.slot(SourceKind::Primary), DisplaySlot::Empty);
}

#[test]
fn builds_from_default_settings() {
    let settings = ClientSettings::default();
    let history = Arc::new(HistoryStore::with_capacity(settings.history_capacity));
    let board = JokeBoard::from_settings(&settings, history).expect("board");
    assert_eq!(board.source_label(SourceKind::Primary), "Official Joke API");
    assert_eq!(board.source_label(SourceKind::Secondary), "JokeAPI.dev");
    assert_eq!(board.history().capacity(), 100);
}
