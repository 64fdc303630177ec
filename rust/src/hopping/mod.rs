//! Site residency and hopping detection.
//!
//! This module provides:
//! - assign_sites: hysteresis state machine turning per-candidate distances
//!   into one bound site (or "unbound") per frame
//! - reduce_episodes_and_frequency: residency episodes, closest-approach
//!   frames and hopping frequency
//! - extract_hop_events: cooldown-debounced hop-in / hop-out frames
//!
//! Both reducers consume the same `AssignmentSequence`.

pub mod assignment;
pub mod events;
pub mod residency;

pub use assignment::{assign_sites, AssignmentSequence, SiteState, UNBOUND};
pub use events::{extract_hop_events, HopEvents};
pub use residency::{reduce_episodes_and_frequency, HoppingSummary, ResidencyEpisode};
