//! Site residency and hopping detection for a mobile ion in an MD trajectory.
//!
//! For one reference atom (e.g. a Li⁺ ion) the crate turns per-frame distances
//! to every nearby candidate atom into:
//! - the bound site at each frame, via a two-threshold hysteresis state machine
//! - residency episodes with their closest-approach frame, and a hopping frequency
//! - cooldown-debounced hop-in / hop-out events
//!
//! Pipeline: `trajectory` (two-pass distance collection) → `smoothing`
//! → `hopping::assign_sites` → `hopping::reduce_episodes_and_frequency`
//! and `hopping::extract_hop_events`. `analysis` wires these together.
//!
//! With the `python` feature the crate also builds the `ionhop_rust`
//! extension module.

pub mod analysis;
pub mod distance;
pub mod error;
pub mod frames;
pub mod hopping;
pub mod smoothing;
pub mod trajectory;

#[cfg(feature = "python")]
mod python;

pub use analysis::{analyze, hop_events, site_residency, HoppingConfig, HoppingReport, SmoothingConfig};
pub use error::{HoppingError, Result};
pub use frames::{AtomId, FrameSource, FrameStack};
pub use hopping::{
    assign_sites, extract_hop_events, reduce_episodes_and_frequency, AssignmentSequence,
    HopEvents, HoppingSummary, ResidencyEpisode, SiteState, UNBOUND,
};
pub use smoothing::{NoSmoothing, SavitzkyGolay, Smoother};
pub use trajectory::{build_distance_trajectory, DistanceTrajectory, TrajectoryBuilder, SENTINEL_DISTANCE};
