//! Import map ingestion: the ordered merge queue and the resolver-facing gate

pub mod queue;
pub mod trigger;

pub use queue::{IngestionQueue, PayloadFuture, QueueStats};
pub use trigger::ImportTrigger;
