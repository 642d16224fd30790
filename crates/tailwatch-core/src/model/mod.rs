// ── Domain model ──
//
// Canonical types shared by the extractor, the stores, the classifier,
// and every consumer of the engine's reports.

pub mod geo;
pub mod identity;
pub mod profile;
pub mod report;

pub use geo::{GeoLocation, NearbyNetwork, TrackPoint};
pub use identity::DeviceIdentity;
pub use profile::{DeviceProfile, ExtractedProfile, ProfileField, TransportClass};
pub use report::{ClassifiedDevice, HistoryEntry, SurveillanceReport};
