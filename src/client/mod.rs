//! List client core
//!
//! Everything a user-list screen needs apart from rendering: the table
//! state to URL translation, a debounced list synchronizer that discards
//! stale responses, the HTTP transport, and the create/edit/delete dialog
//! state machine.

pub mod debounce;
pub mod dialog;
pub mod error;
pub mod fetcher;
pub mod sync;
pub mod translator;

#[cfg(test)]
mod testing;

pub use debounce::Debouncer;
pub use dialog::{DialogEvent, DialogState, Notice, NoticeKind, SubmitOutcome, Submission, UserDialogs};
pub use error::ClientError;
pub use fetcher::{HttpUserClient, ListFetcher, MemoryHistory, Navigator, UserMutations};
pub use sync::{ListHandle, ListSynchronizer, ListView, SyncConfig, TableEvent};
pub use translator::{request_url, Pagination, TableState};
