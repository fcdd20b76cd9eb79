//! Ports: contracts with the external Clipboard History Service.
//! 端口：与外部剪贴板历史服务的契约。

pub mod clock;
pub mod errors;
pub mod events;
pub mod history;

pub use clock::ClockPort;
pub use errors::HistoryServiceError;
pub use events::{HistoryEvent, HistoryEventsPort, HistorySubscription};
pub use history::ClipHistoryPort;

#[cfg(test)]
mod tests;
