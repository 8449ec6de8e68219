pub mod history;
pub mod shared;

pub use history::{HistoryStore, RecordStatus, TickEntry, TickSink};
pub use shared::{HistoryReader, SharedHistory};
