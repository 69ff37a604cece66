// ── Reactive record store ──
//
// Concurrent record storage with push-based change notification.

mod collection;
mod ingest;
mod record_store;

pub use record_store::RecordStore;
