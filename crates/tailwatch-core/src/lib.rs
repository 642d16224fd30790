//! Device presence tracking and following detection for tailwatch.
//!
//! This crate owns the classification engine, its state, and the domain
//! model shared with the CLI:
//!
//! - **[`ClassificationService`]** — Owned facade over all engine state.
//!   [`analyze()`](ClassificationService::analyze) reads the latest capture
//!   snapshot, records every sighting, and returns a [`SurveillanceReport`].
//!   [`spawn_watch()`](ClassificationService::spawn_watch) repeats that on an
//!   interval until [`shutdown()`](ClassificationService::shutdown).
//!
//! - **[`Classifier`]** — The per-pass rules: a device is persistent after
//!   enough appearances or one long sighting, and a persistent device seen
//!   recently is a following candidate.
//!
//! - **Snapshot sources** ([`snapshot`]) — [`KismetSource`] reads Kismet's
//!   SQLite capture database; [`MemorySource`] serves rows held in memory.
//!
//! - **Stores** ([`store`]) — Per-device sighting history, the following set,
//!   and the persisted allow/deny lists.
//!
//! - **Geolocation** ([`geo`]) — [`GeoCache`] in front of a [`GeoResolver`],
//!   with [`WigleResolver`] talking to the WiGLE API via `tailwatch-api`.

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod geo;
pub mod model;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod vendor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::Classifier;
pub use config::{ServiceConfig, Thresholds};
pub use error::CoreError;
pub use extract::extract;
pub use geo::{GeoCache, GeoResolver, WigleResolver};
pub use service::{AutoDenyOutcome, ClassificationService};
pub use snapshot::kismet::KismetLocation;
pub use snapshot::{CaptureRecord, KismetSource, MemorySource, SnapshotSource};
pub use store::{ListUpdate, ListStores};

pub use model::{
    ClassifiedDevice, DeviceIdentity, DeviceProfile, ExtractedProfile, GeoLocation, HistoryEntry,
    NearbyNetwork, ProfileField, SurveillanceReport, TrackPoint, TransportClass,
};
