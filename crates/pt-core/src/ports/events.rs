use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::HistoryServiceError;

/// Push notifications from the history service.
///
/// `HistoryChanged` carries no payload: it is a cue to refetch, never delta data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HistoryEvent {
    HistoryChanged,
    KeepWindowOpenChanged { keep: bool },
}

/// A live subscription. The channel closing means the subscription was lost.
#[derive(Debug)]
pub struct HistorySubscription {
    pub events: mpsc::Receiver<HistoryEvent>,
}

impl HistorySubscription {
    pub fn new(events: mpsc::Receiver<HistoryEvent>) -> Self {
        Self { events }
    }
}

/// Port for the history service push channel.
#[async_trait]
pub trait HistoryEventsPort: Send + Sync {
    async fn subscribe(&self) -> Result<HistorySubscription, HistoryServiceError>;
}
