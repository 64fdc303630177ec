//! Python bindings (`ionhop_rust` extension module).

use std::collections::HashMap;

use numpy::{PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::wrap_pyfunction;

use crate::analysis::{self, HoppingConfig, SmoothingConfig};
use crate::distance;
use crate::error::HoppingError;
use crate::frames::{AtomId, FrameStack};
use crate::hopping;
use crate::smoothing::{SavitzkyGolay, Smoother};
use crate::trajectory::{DistanceTrajectory, TrajectoryBuilder};

impl From<HoppingError> for PyErr {
    fn from(err: HoppingError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn trajectory_from_numpy(
    candidate_ids: Vec<AtomId>,
    distances: PyReadonlyArray2<f64>,
) -> PyResult<DistanceTrajectory> {
    Ok(DistanceTrajectory::new(
        candidate_ids,
        distances.as_array().to_owned(),
    )?)
}

fn smoothing_config(smooth: Option<usize>, polyorder: usize) -> Option<SmoothingConfig> {
    smooth.map(|window| SmoothingConfig { window, polyorder })
}

/// Build per-candidate distance series around one reference atom.
///
/// # Arguments
/// * `coords` - (n_frames, n_atoms, 3) wrapped coordinates
/// * `boxes` - (n_frames, 3) orthorhombic box lengths
/// * `reference` - 1-based id of the reference atom
/// * `run_start`, `run_end` - Frame window `[run_start, run_end)`
/// * `species` - Key into `selection_dict`
/// * `selection_dict` - Species name -> list of 1-based atom ids
/// * `capture_radius` - Broad radius deciding which candidates are tracked
///
/// # Returns
/// * (candidate_ids, (n_candidates, n_frames) distances)
#[pyfunction]
#[pyo3(signature = (coords, boxes, reference, run_start, run_end, species, selection_dict, capture_radius, sentinel=100.0))]
fn distance_trajectory<'py>(
    py: Python<'py>,
    coords: PyReadonlyArray3<f64>,
    boxes: PyReadonlyArray2<f64>,
    reference: AtomId,
    run_start: usize,
    run_end: usize,
    species: &str,
    selection_dict: &PyDict,
    capture_radius: f64,
    sentinel: f64,
) -> PyResult<(&'py PyArray1<AtomId>, &'py PyArray2<f64>)> {
    let selections: HashMap<String, Vec<AtomId>> = selection_dict
        .iter()
        .map(|(k, v)| Ok((k.extract::<String>()?, v.extract::<Vec<AtomId>>()?)))
        .collect::<PyResult<_>>()?;

    let stack = FrameStack::new(coords.as_array().to_owned(), boxes.as_array().to_owned())?;
    let traj = TrajectoryBuilder::new(capture_radius)
        .with_sentinel(sentinel)
        .build(&stack, reference, run_start, run_end, species, &selections)?;

    Ok((
        PyArray1::from_slice(py, traj.ids()),
        PyArray2::from_owned_array(py, traj.distances().to_owned()),
    ))
}

/// Savitzky–Golay smoothing of one series.
#[pyfunction]
#[pyo3(signature = (series, window=51, polyorder=2))]
fn smooth_series<'py>(
    py: Python<'py>,
    series: PyReadonlyArray1<f64>,
    window: usize,
    polyorder: usize,
) -> PyResult<&'py PyArray1<f64>> {
    let filter = SavitzkyGolay::new(window, polyorder)?;
    let smoothed = filter.smooth(series.as_array())?;
    Ok(PyArray1::from_owned_array(py, smoothed))
}

/// Hysteresis site assignment on (optionally smoothed) distances.
///
/// # Returns
/// * (sites, distances) per frame; site 0 means unbound
#[pyfunction]
#[pyo3(signature = (candidate_ids, distances, binding_cutoff, hopping_cutoff, smooth=Some(51), polyorder=2))]
fn assign_sites<'py>(
    py: Python<'py>,
    candidate_ids: Vec<AtomId>,
    distances: PyReadonlyArray2<f64>,
    binding_cutoff: f64,
    hopping_cutoff: f64,
    smooth: Option<usize>,
    polyorder: usize,
) -> PyResult<(&'py PyArray1<AtomId>, &'py PyArray1<f64>)> {
    let traj = trajectory_from_numpy(candidate_ids, distances)?;
    let config = HoppingConfig::new(binding_cutoff, hopping_cutoff)
        .with_smoothing(smoothing_config(smooth, polyorder));
    let seq = analysis::smoothed_assignment(&traj, &config)?;

    Ok((
        PyArray1::from_slice(py, seq.sites()),
        PyArray1::from_slice(py, seq.distances()),
    ))
}

/// Sites per frame, hopping frequency and closest-approach frame per episode.
///
/// # Returns
/// * (sites, frequency, closest_frames)
#[pyfunction]
#[pyo3(signature = (candidate_ids, distances, time_step, binding_cutoff, hopping_cutoff, smooth=Some(51), polyorder=2))]
fn site_residency<'py>(
    py: Python<'py>,
    candidate_ids: Vec<AtomId>,
    distances: PyReadonlyArray2<f64>,
    time_step: f64,
    binding_cutoff: f64,
    hopping_cutoff: f64,
    smooth: Option<usize>,
    polyorder: usize,
) -> PyResult<(&'py PyArray1<AtomId>, f64, Vec<usize>)> {
    let traj = trajectory_from_numpy(candidate_ids, distances)?;
    let config = HoppingConfig::new(binding_cutoff, hopping_cutoff)
        .with_time_step(time_step)
        .with_smoothing(smoothing_config(smooth, polyorder));
    let (seq, summary) = analysis::site_residency(&traj, &config)?;

    Ok((
        PyArray1::from_slice(py, seq.sites()),
        summary.frequency,
        summary.closest_frames(),
    ))
}

/// Cooldown-debounced hop-in and hop-out frames.
///
/// # Returns
/// * (hop_in, hop_out)
#[pyfunction]
#[pyo3(signature = (candidate_ids, distances, binding_cutoff, hopping_cutoff, smooth=Some(51), polyorder=2, cool=20))]
fn hop_events(
    candidate_ids: Vec<AtomId>,
    distances: PyReadonlyArray2<f64>,
    binding_cutoff: f64,
    hopping_cutoff: f64,
    smooth: Option<usize>,
    polyorder: usize,
    cool: usize,
) -> PyResult<(Vec<usize>, Vec<usize>)> {
    let traj = trajectory_from_numpy(candidate_ids, distances)?;
    let config = HoppingConfig::new(binding_cutoff, hopping_cutoff)
        .with_smoothing(smoothing_config(smooth, polyorder))
        .with_cool(cool);
    let events = analysis::hop_events(&traj, &config)?;
    Ok((events.hop_in, events.hop_out))
}

/// Full analysis in one pass.
///
/// # Returns
/// * Dict with keys "sites", "distances", "hop_count", "frequency",
///   "episodes" (list of dicts), "hop_in", "hop_out"
#[pyfunction]
#[pyo3(signature = (candidate_ids, distances, time_step, binding_cutoff, hopping_cutoff, smooth=Some(51), polyorder=2, cool=20))]
fn analyze_site_hopping<'py>(
    py: Python<'py>,
    candidate_ids: Vec<AtomId>,
    distances: PyReadonlyArray2<f64>,
    time_step: f64,
    binding_cutoff: f64,
    hopping_cutoff: f64,
    smooth: Option<usize>,
    polyorder: usize,
    cool: usize,
) -> PyResult<PyObject> {
    let traj = trajectory_from_numpy(candidate_ids, distances)?;
    let config = HoppingConfig::new(binding_cutoff, hopping_cutoff)
        .with_time_step(time_step)
        .with_smoothing(smoothing_config(smooth, polyorder))
        .with_cool(cool);
    let report = analysis::analyze(&traj, &config)?;

    let result = PyDict::new(py);
    result.set_item("sites", PyArray1::from_slice(py, report.assignment.sites()))?;
    result.set_item("distances", PyArray1::from_slice(py, report.assignment.distances()))?;
    result.set_item("hop_count", report.summary.hop_count)?;
    result.set_item("frequency", report.summary.frequency)?;

    let episodes: Vec<PyObject> = report
        .summary
        .episodes
        .iter()
        .map(|e| {
            let dict = PyDict::new(py);
            dict.set_item("site", e.site)?;
            dict.set_item("first_frame", e.first_frame)?;
            dict.set_item("last_frame", e.last_frame)?;
            dict.set_item("closest_frame", e.closest_frame)?;
            dict.set_item("closest_distance", e.closest_distance)?;
            Ok(dict.into())
        })
        .collect::<PyResult<_>>()?;
    result.set_item("episodes", episodes)?;
    result.set_item("hop_in", report.events.hop_in)?;
    result.set_item("hop_out", report.events.hop_out)?;

    Ok(result.into())
}

/// Hop events from an existing site sequence (0 = unbound).
#[pyfunction]
#[pyo3(signature = (sites, cool=20))]
fn hop_events_from_sites(sites: Vec<AtomId>, cool: usize) -> (Vec<usize>, Vec<usize>) {
    let events = hopping::extract_hop_events(&sites, cool);
    (events.hop_in, events.hop_out)
}

/// Minimum-image distance between two positions in an orthorhombic box.
#[pyfunction]
fn min_image_distance(a: [f64; 3], b: [f64; 3], dimensions: [f64; 3]) -> f64 {
    distance::min_image_distance(a, b, dimensions)
}

/// Python module definition
#[pymodule]
fn ionhop_rust(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(distance_trajectory, m)?)?;
    m.add_function(wrap_pyfunction!(smooth_series, m)?)?;
    m.add_function(wrap_pyfunction!(assign_sites, m)?)?;
    m.add_function(wrap_pyfunction!(site_residency, m)?)?;
    m.add_function(wrap_pyfunction!(hop_events, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_site_hopping, m)?)?;
    m.add_function(wrap_pyfunction!(hop_events_from_sites, m)?)?;
    m.add_function(wrap_pyfunction!(min_image_distance, m)?)?;
    Ok(())
}
