//! Dual-source fetch orchestration and the display state it drives.

use std::sync::Arc;

use shared::{
    domain::{HistoryEntry, NormalizedJoke, SourceKind},
    error::SourceUnavailable,
};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    error::ClientError,
    history::HistoryStore,
    sources::{build_http_client, JokeApiClient, OfficialJokeClient},
    JokeSource,
};

pub const ALL_SOURCES_FAILED_MESSAGE: &str =
    "Failed to load jokes. Please check your internet connection.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplaySlot {
    #[default]
    Empty,
    Loaded(NormalizedJoke),
    Unavailable,
}

impl DisplaySlot {
    pub fn text(&self) -> Option<&str> {
        match self {
            DisplaySlot::Loaded(joke) => Some(&joke.text),
            DisplaySlot::Empty | DisplaySlot::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DisplaySlot::Unavailable)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySlots {
    pub primary: DisplaySlot,
    pub secondary: DisplaySlot,
}

impl DisplaySlots {
    pub fn get(&self, kind: SourceKind) -> &DisplaySlot {
        match kind {
            SourceKind::Primary => &self.primary,
            SourceKind::Secondary => &self.secondary,
        }
    }

    fn set(&mut self, kind: SourceKind, slot: DisplaySlot) {
        match kind {
            SourceKind::Primary => self.primary = slot,
            SourceKind::Secondary => self.secondary = slot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadNotice {
    AllSourcesFailed,
}

impl LoadNotice {
    pub fn message(self) -> &'static str {
        match self {
            LoadNotice::AllSourcesFailed => ALL_SOURCES_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    LoadingChanged(bool),
    SlotUpdated {
        kind: SourceKind,
        slot: DisplaySlot,
    },
    Notice(LoadNotice),
}

/// Result of one [`JokeBoard::refresh`]. Each side carries either the history
/// entry written for it or the reason it produced nothing.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub primary: Result<HistoryEntry, SourceUnavailable>,
    pub secondary: Result<HistoryEntry, SourceUnavailable>,
    pub notice: Option<LoadNotice>,
}

impl RefreshOutcome {
    pub fn get(&self, kind: SourceKind) -> &Result<HistoryEntry, SourceUnavailable> {
        match kind {
            SourceKind::Primary => &self.primary,
            SourceKind::Secondary => &self.secondary,
        }
    }

    pub fn succeeded(&self, kind: SourceKind) -> bool {
        self.get(kind).is_ok()
    }

    pub fn entries_written(&self) -> Vec<&HistoryEntry> {
        [&self.primary, &self.secondary]
            .into_iter()
            .filter_map(|result| result.as_ref().ok())
            .collect()
    }
}

pub struct JokeBoard {
    primary: Arc<dyn JokeSource>,
    secondary: Arc<dyn JokeSource>,
    history: Arc<HistoryStore>,
    loading: watch::Sender<bool>,
    slots: watch::Sender<DisplaySlots>,
    events: broadcast::Sender<BoardEvent>,
}

impl JokeBoard {
    pub fn new(
        primary: Arc<dyn JokeSource>,
        secondary: Arc<dyn JokeSource>,
        history: Arc<HistoryStore>,
    ) -> Self {
        let (loading, _) = watch::channel(false);
        let (slots, _) = watch::channel(DisplaySlots::default());
        let (events, _) = broadcast::channel(64);
        Self {
            primary,
            secondary,
            history,
            loading,
            slots,
            events,
        }
    }

    /// Wires the Official Joke API and JokeAPI.dev clients from settings.
    pub fn from_settings(
        settings: &ClientSettings,
        history: Arc<HistoryStore>,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(settings.request_timeout())?;
        let primary = OfficialJokeClient::new(http.clone(), &settings.official_joke_url)?;
        let secondary = JokeApiClient::new(http, &settings.joke_api_url)?;
        Ok(Self::new(Arc::new(primary), Arc::new(secondary), history))
    }

    /// Fetches from both sources concurrently and waits for both to settle.
    ///
    /// Never fails: an unavailable source leaves its slot in
    /// [`DisplaySlot::Unavailable`] and writes no history. Overlapping calls
    /// are allowed; the loading flag reflects whichever call settles last.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.set_loading(true);

        let (primary, secondary) = tokio::join!(self.primary.fetch(), self.secondary.fetch());
        let primary = self.settle(SourceKind::Primary, primary).await;
        let secondary = self.settle(SourceKind::Secondary, secondary).await;

        let notice = if primary.is_err() && secondary.is_err() {
            warn!("jokes: both sources unavailable");
            let _ = self
                .events
                .send(BoardEvent::Notice(LoadNotice::AllSourcesFailed));
            Some(LoadNotice::AllSourcesFailed)
        } else {
            None
        };

        info!(
            primary_ok = primary.is_ok(),
            secondary_ok = secondary.is_ok(),
            "jokes: refresh settled"
        );
        self.set_loading(false);

        RefreshOutcome {
            primary,
            secondary,
            notice,
        }
    }

    async fn settle(
        &self,
        kind: SourceKind,
        result: Result<NormalizedJoke, SourceUnavailable>,
    ) -> Result<HistoryEntry, SourceUnavailable> {
        match result {
            Ok(joke) => {
                self.update_slot(kind, DisplaySlot::Loaded(joke.clone()));
                Ok(self.history.append(joke).await)
            }
            Err(err) => {
                warn!(source = %kind, error = %err, "jokes: source unavailable");
                self.update_slot(kind, DisplaySlot::Unavailable);
                Err(err)
            }
        }
    }

    fn set_loading(&self, loading: bool) {
        self.loading.send_replace(loading);
        let _ = self.events.send(BoardEvent::LoadingChanged(loading));
    }

    fn update_slot(&self, kind: SourceKind, slot: DisplaySlot) {
        self.slots.send_modify(|slots| slots.set(kind, slot.clone()));
        let _ = self.events.send(BoardEvent::SlotUpdated { kind, slot });
    }

    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn slot(&self, kind: SourceKind) -> DisplaySlot {
        self.slots.borrow().get(kind).clone()
    }

    pub fn slots(&self) -> DisplaySlots {
        self.slots.borrow().clone()
    }

    pub fn watch_slots(&self) -> watch::Receiver<DisplaySlots> {
        self.slots.subscribe()
    }

    pub fn source_label(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Primary => self.primary.label(),
            SourceKind::Secondary => self.secondary.label(),
        }
    }

    pub fn history(&self) -> Arc<HistoryStore> {
        Arc::clone(&self.history)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
