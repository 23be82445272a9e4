// ── Domain model ──
//
// Raw per-access-point observations (`HostEntry`) and the merged
// per-MAC record (`Device`) built from them each poll.

pub mod device;
pub mod host;
pub mod mac;

pub use device::{
    Device, PLACEHOLDER_PREFIX, PresenceState, TrackerAttributes, WIRELESS, is_placeholder,
};
pub use host::HostEntry;
pub use mac::MacAddress;
