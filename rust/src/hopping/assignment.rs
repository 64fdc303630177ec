//! Hysteresis site assignment.
//!
//! Two thresholds drive the state machine:
//! - `binding_cutoff` (D_bind): a newly found nearest candidate is accepted
//!   as the site only if it is at most this far away
//! - `hopping_cutoff` (D_hop ≥ D_bind): the current site is kept, without
//!   searching, as long as it stays at most this far away
//!
//! Frame 0 is bound to the nearest candidate with no threshold check.
//! Unbound frames record the trajectory's sentinel distance.

use crate::error::{HoppingError, Result};
use crate::frames::AtomId;
use crate::trajectory::DistanceTrajectory;

/// Site label meaning "no tracked site".
pub const UNBOUND: AtomId = 0;

/// Binding state of the reference atom at one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteState {
    Bound(AtomId),
    Unbound,
}

impl SiteState {
    /// State for a site label (`UNBOUND` maps to `Unbound`).
    pub fn from_site(site: AtomId) -> Self {
        if site == UNBOUND {
            SiteState::Unbound
        } else {
            SiteState::Bound(site)
        }
    }

    /// Site label (`UNBOUND` for `Unbound`).
    pub fn site(self) -> AtomId {
        match self {
            SiteState::Bound(id) => id,
            SiteState::Unbound => UNBOUND,
        }
    }
}

/// One (site, distance) pair per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentSequence {
    sites: Vec<AtomId>,
    distances: Vec<f64>,
    sentinel: f64,
}

impl AssignmentSequence {
    /// Assemble a sequence from parallel site / distance vectors.
    ///
    /// Every `UNBOUND` frame must carry exactly `sentinel` as its distance.
    pub fn from_parts(sites: Vec<AtomId>, distances: Vec<f64>, sentinel: f64) -> Result<Self> {
        if sites.len() != distances.len() {
            return Err(HoppingError::shape(format!(
                "{} sites for {} distances",
                sites.len(),
                distances.len()
            )));
        }
        if let Some(t) = sites
            .iter()
            .zip(&distances)
            .position(|(&s, &d)| s == UNBOUND && d != sentinel)
        {
            return Err(HoppingError::parameter(format!(
                "unbound frame {} carries distance {} instead of sentinel {}",
                t, distances[t], sentinel
            )));
        }
        Ok(Self {
            sites,
            distances,
            sentinel,
        })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// True for a zero-frame sequence.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site label per frame.
    pub fn sites(&self) -> &[AtomId] {
        &self.sites
    }

    /// Distance to the bound site per frame (sentinel when unbound).
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Distance recorded on unbound frames.
    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    /// State at `frame`, or `None` past the end.
    pub fn state(&self, frame: usize) -> Option<SiteState> {
        self.sites.get(frame).copied().map(SiteState::from_site)
    }

    /// Iterate `(site, distance)` pairs in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (AtomId, f64)> + '_ {
        self.sites.iter().copied().zip(self.distances.iter().copied())
    }

    /// Number of frames spent unbound.
    pub fn n_unbound(&self) -> usize {
        self.sites.iter().filter(|&&s| s == UNBOUND).count()
    }
}

/// Row-level tracker; rows index the trajectory, not atom ids.
struct SiteTracker<'a> {
    traj: &'a DistanceTrajectory,
    binding_cutoff: f64,
    hopping_cutoff: f64,
    bound_row: Option<usize>,
}

impl<'a> SiteTracker<'a> {
    /// Advance to `frame`, returning the recorded distance.
    fn step(&mut self, frame: usize) -> f64 {
        let current = match self.bound_row {
            Some(row) => self.traj.distance_at(row, frame),
            None => self.traj.sentinel(),
        };

        if current <= self.hopping_cutoff {
            return current;
        }

        match self.traj.nearest(frame) {
            Some((row, d)) if d <= self.binding_cutoff => {
                self.bound_row = Some(row);
                d
            }
            _ => {
                self.bound_row = None;
                self.traj.sentinel()
            }
        }
    }

    fn site(&self) -> AtomId {
        self.bound_row
            .map(|row| self.traj.id_at(row))
            .unwrap_or(UNBOUND)
    }
}

/// Assign one site (or `UNBOUND`) to every frame of `traj`.
///
/// # Arguments
/// * `traj` - Distance trajectory, already smoothed if smoothing is wanted
/// * `binding_cutoff` - Maximum distance to accept a new site
/// * `hopping_cutoff` - Maximum distance to stay on the current site
///
/// # Returns
/// Sequence of length `traj.n_frames()`
pub fn assign_sites(
    traj: &DistanceTrajectory,
    binding_cutoff: f64,
    hopping_cutoff: f64,
) -> Result<AssignmentSequence> {
    if !(binding_cutoff.is_finite() && binding_cutoff >= 0.0) {
        return Err(HoppingError::parameter(format!(
            "binding cutoff must be finite and non-negative, got {}",
            binding_cutoff
        )));
    }
    if !(hopping_cutoff.is_finite() && hopping_cutoff >= binding_cutoff) {
        return Err(HoppingError::parameter(format!(
            "hopping cutoff {} must be finite and at least the binding cutoff {}",
            hopping_cutoff, binding_cutoff
        )));
    }

    let n_frames = traj.n_frames();
    if n_frames == 0 {
        return Err(HoppingError::degenerate("trajectory has no frames"));
    }
    let (first_row, first_distance) = traj
        .nearest(0)
        .ok_or_else(|| HoppingError::degenerate("no candidate at frame 0"))?;

    let mut tracker = SiteTracker {
        traj,
        binding_cutoff,
        hopping_cutoff,
        bound_row: Some(first_row),
    };

    let mut sites = Vec::with_capacity(n_frames);
    let mut distances = Vec::with_capacity(n_frames);
    sites.push(tracker.site());
    distances.push(first_distance);

    for frame in 1..n_frames {
        let d = tracker.step(frame);
        sites.push(tracker.site());
        distances.push(d);
    }

    Ok(AssignmentSequence {
        sites,
        distances,
        sentinel: traj.sentinel(),
    })
}
