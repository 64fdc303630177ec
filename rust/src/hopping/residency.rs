//! Residency episodes and hopping frequency.
//!
//! An episode is a maximal run of frames over which the most recent bound
//! site does not change. Unbound frames inside the run neither end it nor
//! count toward its closest approach.

use serde::{Deserialize, Serialize};

use super::assignment::{AssignmentSequence, UNBOUND};
use crate::error::{ensure_positive, HoppingError, Result};
use crate::frames::AtomId;

/// One residency episode on a single site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResidencyEpisode {
    /// Bound site.
    pub site: AtomId,
    /// First frame bound to `site`.
    pub first_frame: usize,
    /// Last frame bound to `site` before the next site took over.
    pub last_frame: usize,
    /// Frame with the smallest recorded distance (earliest on ties).
    pub closest_frame: usize,
    /// Distance at `closest_frame`.
    pub closest_distance: f64,
}

impl ResidencyEpisode {
    fn open(site: AtomId, frame: usize, distance: f64) -> Self {
        Self {
            site,
            first_frame: frame,
            last_frame: frame,
            closest_frame: frame,
            closest_distance: distance,
        }
    }
}

/// Episodes plus hop statistics for one assignment sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoppingSummary {
    /// Episodes in encounter order.
    pub episodes: Vec<ResidencyEpisode>,
    /// Site changes between consecutive bound frames, unbound frames removed.
    pub hop_count: usize,
    /// `hop_count / (n_frames * time_step)`.
    pub frequency: f64,
}

impl HoppingSummary {
    /// Closest-approach frame of each episode.
    pub fn closest_frames(&self) -> Vec<usize> {
        self.episodes.iter().map(|e| e.closest_frame).collect()
    }
}

/// Number of site changes once unbound frames are dropped.
pub fn count_hops(sites: &[AtomId]) -> usize {
    let mut bound = sites.iter().filter(|&&s| s != UNBOUND);
    let mut previous = match bound.next() {
        Some(&s) => s,
        None => return 0,
    };
    let mut hops = 0;
    for &site in bound {
        if site != previous {
            hops += 1;
            previous = site;
        }
    }
    hops
}

/// Split a sequence into residency episodes and compute the hopping frequency.
///
/// # Arguments
/// * `sequence` - Output of `assign_sites`
/// * `time_step` - Physical time per frame
///
/// # Returns
/// Episodes, hop count and hops per unit of total observed time
pub fn reduce_episodes_and_frequency(
    sequence: &AssignmentSequence,
    time_step: f64,
) -> Result<HoppingSummary> {
    ensure_positive("time_step", time_step)?;
    if sequence.is_empty() {
        return Err(HoppingError::degenerate("assignment sequence has no frames"));
    }

    let mut episodes = Vec::new();
    let mut current: Option<ResidencyEpisode> = None;

    for (frame, (site, distance)) in sequence.iter().enumerate() {
        if site == UNBOUND {
            continue;
        }
        if let Some(episode) = current.as_mut() {
            if episode.site == site {
                episode.last_frame = frame;
                if distance < episode.closest_distance {
                    episode.closest_frame = frame;
                    episode.closest_distance = distance;
                }
                continue;
            }
        }
        if let Some(done) = current.replace(ResidencyEpisode::open(site, frame, distance)) {
            episodes.push(done);
        }
    }
    episodes.extend(current);

    let hop_count = count_hops(sequence.sites());
    let frequency = hop_count as f64 / (sequence.len() as f64 * time_step);

    log::info!(
        "{} residency episodes, {} hops over {} frames ({} unbound)",
        episodes.len(),
        hop_count,
        sequence.len(),
        sequence.n_unbound()
    );

    Ok(HoppingSummary {
        episodes,
        hop_count,
        frequency,
    })
}
