//! One-call site hopping analysis for a single reference atom.
//!
//! smoothing → hysteresis assignment → (residency summary, hop events)

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, HoppingError, Result};
use crate::hopping::{
    assign_sites, extract_hop_events, reduce_episodes_and_frequency, AssignmentSequence,
    HopEvents, HoppingSummary,
};
use crate::smoothing::{NoSmoothing, SavitzkyGolay, Smoother};
use crate::trajectory::DistanceTrajectory;

/// Savitzky–Golay parameters. Default: window 51, order 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub window: usize,
    pub polyorder: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: 51,
            polyorder: 2,
        }
    }
}

impl SmoothingConfig {
    /// Build the filter described by this config.
    pub fn filter(&self) -> Result<SavitzkyGolay> {
        SavitzkyGolay::new(self.window, self.polyorder)
    }
}

/// Parameters for one hopping analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoppingConfig {
    /// Maximum distance to accept a new binding site (D_bind).
    pub binding_cutoff: f64,
    /// Maximum distance to remain on the current site (D_hop).
    pub hopping_cutoff: f64,
    /// Physical time per frame. Default: 1.0
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Smoothing applied before assignment; `None` uses distances as-is.
    #[serde(default = "default_smoothing")]
    pub smoothing: Option<SmoothingConfig>,
    /// Cooldown window for hop events, in frames. Default: 20
    #[serde(default = "default_cool")]
    pub cool: usize,
}

fn default_time_step() -> f64 {
    1.0
}

fn default_smoothing() -> Option<SmoothingConfig> {
    Some(SmoothingConfig::default())
}

fn default_cool() -> usize {
    20
}

impl HoppingConfig {
    /// Config with the given cutoffs and default everything else.
    pub fn new(binding_cutoff: f64, hopping_cutoff: f64) -> Self {
        Self {
            binding_cutoff,
            hopping_cutoff,
            time_step: default_time_step(),
            smoothing: default_smoothing(),
            cool: default_cool(),
        }
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_smoothing(mut self, smoothing: Option<SmoothingConfig>) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_cool(mut self, cool: usize) -> Self {
        self.cool = cool;
        self
    }

    /// Check every scalar before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !(self.binding_cutoff.is_finite() && self.binding_cutoff >= 0.0) {
            return Err(HoppingError::parameter(format!(
                "binding cutoff must be finite and non-negative, got {}",
                self.binding_cutoff
            )));
        }
        if !(self.hopping_cutoff.is_finite() && self.hopping_cutoff >= self.binding_cutoff) {
            return Err(HoppingError::parameter(format!(
                "hopping cutoff {} must be finite and at least the binding cutoff {}",
                self.hopping_cutoff, self.binding_cutoff
            )));
        }
        ensure_positive("time_step", self.time_step)?;
        if let Some(smoothing) = &self.smoothing {
            smoothing.filter()?;
        }
        Ok(())
    }

    fn smoother(&self) -> Result<Box<dyn Smoother>> {
        let smoother: Box<dyn Smoother> = match &self.smoothing {
            Some(smoothing) => Box::new(smoothing.filter()?),
            None => Box::new(NoSmoothing),
        };
        Ok(smoother)
    }
}

/// Everything derived from one reference atom's trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct HoppingReport {
    pub assignment: AssignmentSequence,
    pub summary: HoppingSummary,
    pub events: HopEvents,
}

/// Smooth `traj` (if configured) and assign sites. The input is left untouched.
pub fn smoothed_assignment(
    traj: &DistanceTrajectory,
    config: &HoppingConfig,
) -> Result<AssignmentSequence> {
    config.validate()?;
    let smoother = config.smoother()?;
    let smoothed = traj.smoothed(smoother.as_ref())?;
    assign_sites(&smoothed, config.binding_cutoff, config.hopping_cutoff)
}

/// Site per frame, residency episodes and hopping frequency.
pub fn site_residency(
    traj: &DistanceTrajectory,
    config: &HoppingConfig,
) -> Result<(AssignmentSequence, HoppingSummary)> {
    let assignment = smoothed_assignment(traj, config)?;
    let summary = reduce_episodes_and_frequency(&assignment, config.time_step)?;
    Ok((assignment, summary))
}

/// Debounced hop-in / hop-out frames.
pub fn hop_events(traj: &DistanceTrajectory, config: &HoppingConfig) -> Result<HopEvents> {
    let assignment = smoothed_assignment(traj, config)?;
    Ok(extract_hop_events(assignment.sites(), config.cool))
}

/// Full analysis: one smoothing and assignment pass feeding both reducers.
pub fn analyze(traj: &DistanceTrajectory, config: &HoppingConfig) -> Result<HoppingReport> {
    let assignment = smoothed_assignment(traj, config)?;
    let summary = reduce_episodes_and_frequency(&assignment, config.time_step)?;
    let events = extract_hop_events(assignment.sites(), config.cool);
    Ok(HoppingReport {
        assignment,
        summary,
        events,
    })
}
