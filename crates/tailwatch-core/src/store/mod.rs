// ── Engine state stores ──

pub mod following;
pub mod history;
pub mod lists;

pub use following::FollowingSet;
pub use history::HistoryStore;
pub use lists::{ListStore, ListStores, ListUpdate};
