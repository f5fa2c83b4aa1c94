use async_trait::async_trait;
use shared::{
    domain::{NormalizedJoke, SourceKind},
    error::SourceUnavailable,
};

pub mod board;
pub mod config;
pub mod error;
pub mod history;
pub mod sources;

pub use board::{
    BoardEvent, DisplaySlot, DisplaySlots, JokeBoard, LoadNotice, RefreshOutcome,
    ALL_SOURCES_FAILED_MESSAGE,
};
pub use config::{load_settings, ClientSettings};
pub use error::ClientError;
pub use history::{HistoryEvent, HistoryStore, DEFAULT_HISTORY_CAPACITY};
pub use sources::{build_http_client, JokeApiClient, OfficialJokeClient};

/// One upstream joke provider. Every failure mode collapses into
/// [`SourceUnavailable`]; implementations never retry.
#[async_trait]
pub trait JokeSource: Send + Sync {
    fn kind(&self) -> SourceKind;
    fn label(&self) -> &str;
    async fn fetch(&self) -> Result<NormalizedJoke, SourceUnavailable>;
}
