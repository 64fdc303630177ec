//! Per-candidate distance trajectories around one reference atom.
//!
//! A `DistanceTrajectory` stores candidate ids in ascending order next to a
//! (candidates × frames) distance buffer. Rows are looked up through an
//! id → row table. Frames where a candidate was never captured hold the
//! sentinel distance, so every row has the same length.

use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

use crate::distance::distances_to_reference;
use crate::error::{ensure_positive, HoppingError, Result};
use crate::frames::{AtomId, FrameSource};
use crate::smoothing::Smoother;

/// Distance recorded for frames where a candidate is absent or the ion is unbound.
pub const SENTINEL_DISTANCE: f64 = 100.0;

/// Distances from a reference atom to every tracked candidate at every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTrajectory {
    ids: Vec<AtomId>,
    row_of_id: HashMap<AtomId, usize>,
    distances: Array2<f64>,
    sentinel: f64,
}

impl DistanceTrajectory {
    /// Build from candidate ids and a matching (candidates × frames) buffer,
    /// using the default sentinel.
    pub fn new(ids: Vec<AtomId>, distances: Array2<f64>) -> Result<Self> {
        Self::with_sentinel(ids, distances, SENTINEL_DISTANCE)
    }

    /// Build with an explicit sentinel distance.
    ///
    /// Rows are reordered so ids are ascending. Ids must be unique and nonzero.
    pub fn with_sentinel(ids: Vec<AtomId>, distances: Array2<f64>, sentinel: f64) -> Result<Self> {
        ensure_positive("sentinel", sentinel)?;

        if ids.len() != distances.nrows() {
            return Err(HoppingError::shape(format!(
                "{} candidate ids for {} distance rows",
                ids.len(),
                distances.nrows()
            )));
        }

        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by_key(|&i| ids[i]);

        let mut sorted_ids = Vec::with_capacity(ids.len());
        let mut row_of_id = HashMap::with_capacity(ids.len());
        for (row, &i) in order.iter().enumerate() {
            let id = ids[i];
            if id == 0 || row_of_id.insert(id, row).is_some() {
                return Err(HoppingError::InvalidCandidate(id));
            }
            sorted_ids.push(id);
        }

        let distances = if order.iter().enumerate().all(|(row, &i)| row == i) {
            distances
        } else {
            distances.select(Axis(0), &order)
        };

        Ok(Self {
            ids: sorted_ids,
            row_of_id,
            distances,
            sentinel,
        })
    }

    /// Build from `(id, series)` pairs; every series must have the same length.
    pub fn from_series<I>(series: I) -> Result<Self>
    where
        I: IntoIterator<Item = (AtomId, Vec<f64>)>,
    {
        let series: Vec<(AtomId, Vec<f64>)> = series.into_iter().collect();
        let n_frames = series.first().map(|(_, s)| s.len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(series.len());
        let mut flat = Vec::with_capacity(series.len() * n_frames);
        for (id, values) in series {
            if values.len() != n_frames {
                return Err(HoppingError::shape(format!(
                    "candidate {} has {} frames, expected {}",
                    id,
                    values.len(),
                    n_frames
                )));
            }
            ids.push(id);
            flat.extend(values);
        }

        let distances = Array2::from_shape_vec((ids.len(), n_frames), flat)
            .map_err(|e| HoppingError::shape(e.to_string()))?;
        Self::new(ids, distances)
    }

    /// Candidate ids, ascending.
    pub fn ids(&self) -> &[AtomId] {
        &self.ids
    }

    /// Number of tracked candidates.
    pub fn n_candidates(&self) -> usize {
        self.ids.len()
    }

    /// Number of frames (T).
    pub fn n_frames(&self) -> usize {
        self.distances.ncols()
    }

    /// True when no candidate is tracked.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sentinel distance used for absent candidates and unbound frames.
    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    /// The full (candidates × frames) buffer, rows in `ids()` order.
    pub fn distances(&self) -> ArrayView2<f64> {
        self.distances.view()
    }

    /// Row index of a candidate id.
    pub fn row_of(&self, id: AtomId) -> Option<usize> {
        self.row_of_id.get(&id).copied()
    }

    /// Distance series of one candidate.
    pub fn series(&self, id: AtomId) -> Option<ArrayView1<f64>> {
        self.row_of(id).map(|row| self.distances.row(row))
    }

    #[inline]
    pub(crate) fn id_at(&self, row: usize) -> AtomId {
        self.ids[row]
    }

    #[inline]
    pub(crate) fn distance_at(&self, row: usize, frame: usize) -> f64 {
        self.distances[[row, frame]]
    }

    /// Row and distance of the nearest candidate at `frame`.
    ///
    /// Exact ties go to the lowest id. NaN distances sort after every number.
    pub fn nearest(&self, frame: usize) -> Option<(usize, f64)> {
        self.distances
            .column(frame)
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Apply `smoother` to every candidate's series, returning a new trajectory.
    pub fn smoothed<S: Smoother + ?Sized>(&self, smoother: &S) -> Result<Self> {
        let n_frames = self.n_frames();

        let rows = (0..self.n_candidates())
            .into_par_iter()
            .map(|row| smoother.smooth(self.distances.row(row)))
            .collect::<Result<Vec<_>>>()?;

        let mut distances = Array2::<f64>::zeros((self.n_candidates(), n_frames));
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_frames {
                return Err(HoppingError::shape(format!(
                    "smoother returned {} values for a {}-frame series",
                    values.len(),
                    n_frames
                )));
            }
            distances.row_mut(row).assign(values);
        }

        log::debug!(
            "Smoothed {} candidate series over {} frames",
            self.n_candidates(),
            n_frames
        );

        Ok(Self {
            ids: self.ids.clone(),
            row_of_id: self.row_of_id.clone(),
            distances,
            sentinel: self.sentinel,
        })
    }
}

/// Two-pass builder of a `DistanceTrajectory` from a frame source.
#[derive(Clone, Debug)]
pub struct TrajectoryBuilder {
    /// Broad radius deciding which candidates get a series at all.
    pub capture_radius: f64,
    /// Distance stored where a candidate is not observed.
    pub sentinel: f64,
}

impl TrajectoryBuilder {
    /// Builder with the default sentinel.
    pub fn new(capture_radius: f64) -> Self {
        Self {
            capture_radius,
            sentinel: SENTINEL_DISTANCE,
        }
    }

    /// Override the sentinel distance.
    pub fn with_sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Collect distances from `reference` to every `species` candidate that
    /// comes within the capture radius at any frame of `[run_start, run_end)`.
    ///
    /// Pass 1 scans all frames to fix the candidate set. Pass 2 fills in the
    /// minimum-image distance of every candidate at every frame.
    pub fn build<F: FrameSource>(
        &self,
        source: &F,
        reference: AtomId,
        run_start: usize,
        run_end: usize,
        species: &str,
        selections: &HashMap<String, F::Selection>,
    ) -> Result<DistanceTrajectory> {
        let selection = match selections.get(species) {
            Some(selection) => selection,
            None => {
                log::warn!("Invalid species selection '{}'", species);
                let mut known: Vec<String> = selections.keys().cloned().collect();
                known.sort();
                return Err(HoppingError::InvalidSpecies {
                    species: species.to_string(),
                    known,
                });
            }
        };

        ensure_positive("sentinel", self.sentinel)?;
        ensure_positive("capture_radius", self.capture_radius)?;
        if self.capture_radius >= self.sentinel {
            return Err(HoppingError::parameter(format!(
                "capture radius {} must be below the sentinel distance {}",
                self.capture_radius, self.sentinel
            )));
        }

        let n_total = source.n_frames();
        if run_start >= run_end || run_end > n_total {
            return Err(HoppingError::FrameRange {
                start: run_start,
                end: run_end,
                n_frames: n_total,
            });
        }
        let n_frames = run_end - run_start;

        let mut captured = BTreeSet::new();
        for frame in run_start..run_end {
            let shell = source.select_within(frame, reference, self.capture_radius, selection)?;
            captured.extend(shell);
        }
        let ids: Vec<AtomId> = captured.into_iter().collect();

        log::debug!(
            "Captured {} '{}' candidates around atom {} over {} frames",
            ids.len(),
            species,
            reference,
            n_frames
        );

        let mut distances = Array2::from_elem((ids.len(), n_frames), self.sentinel);
        let mut positions = Array2::<f64>::zeros((ids.len(), 3));
        for (t, frame) in (run_start..run_end).enumerate() {
            let dims = source.box_dimensions(frame)?;
            let center = source.position(frame, reference)?;
            for (row, &id) in ids.iter().enumerate() {
                let pos = source.position(frame, id)?;
                positions.row_mut(row).assign(&ArrayView1::from(&pos));
            }
            let frame_distances =
                distances_to_reference(ArrayView1::from(&center), positions.view(), dims);
            distances.column_mut(t).assign(&frame_distances);
        }

        DistanceTrajectory::with_sentinel(ids, distances, self.sentinel)
    }
}

/// Build a distance trajectory with the default sentinel.
pub fn build_distance_trajectory<F: FrameSource>(
    source: &F,
    reference: AtomId,
    run_start: usize,
    run_end: usize,
    species: &str,
    selections: &HashMap<String, F::Selection>,
    capture_radius: f64,
) -> Result<DistanceTrajectory> {
    TrajectoryBuilder::new(capture_radius).build(
        source,
        reference,
        run_start,
        run_end,
        species,
        selections,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameStack;
    use ndarray::{array, Array2, Array3};

    /// Reference atom 1 fixed at the origin corner; atom 2 drifts away along x,
    /// atom 3 drifts in; atom 4 never comes close; atom 5 is a different species.
    fn drifting_stack() -> FrameStack {
        let n_frames = 4;
        let n_atoms = 5;
        let mut coords = Array3::<f64>::zeros((n_frames, n_atoms, 3));
        for t in 0..n_frames {
            let tf = t as f64;
            coords[[t, 0, 0]] = 1.0;
            coords[[t, 1, 0]] = 2.0 + 2.0 * tf; // 1, 3, 5, 7 away
            coords[[t, 2, 1]] = 8.0 - 2.0 * tf; // far, then close
            coords[[t, 2, 0]] = 1.0;
            coords[[t, 3, 2]] = 10.0;
            coords[[t, 3, 0]] = 1.0;
            coords[[t, 4, 0]] = 1.5;
        }
        let boxes = Array2::from_elem((n_frames, 3), 20.0);
        FrameStack::new(coords, boxes).unwrap()
    }

    fn selections() -> HashMap<String, Vec<AtomId>> {
        let mut map = HashMap::new();
        map.insert("solvent".to_string(), vec![2, 3, 4]);
        map.insert("anion".to_string(), vec![5]);
        map
    }

    #[test]
    fn test_new_sorts_rows_by_id() {
        let traj = DistanceTrajectory::new(
            vec![7, 3],
            array![[7.0, 7.5], [3.0, 3.5]],
        )
        .unwrap();

        assert_eq!(traj.ids(), &[3, 7]);
        assert_eq!(traj.series(3).unwrap().to_vec(), vec![3.0, 3.5]);
        assert_eq!(traj.series(7).unwrap().to_vec(), vec![7.0, 7.5]);
        assert_eq!(traj.row_of(7), Some(1));
        assert!(traj.series(1).is_none());
    }

    #[test]
    fn test_rejects_zero_and_duplicate_ids() {
        let zero = DistanceTrajectory::new(vec![0, 1], Array2::zeros((2, 3)));
        assert_eq!(zero, Err(HoppingError::InvalidCandidate(0)));

        let dup = DistanceTrajectory::new(vec![4, 4], Array2::zeros((2, 3)));
        assert_eq!(dup, Err(HoppingError::InvalidCandidate(4)));
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let res = DistanceTrajectory::new(vec![1, 2, 3], Array2::zeros((2, 3)));
        assert!(matches!(res, Err(HoppingError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_series_requires_uniform_length() {
        let res = DistanceTrajectory::from_series(vec![(1, vec![1.0, 2.0]), (2, vec![1.0])]);
        assert!(matches!(res, Err(HoppingError::ShapeMismatch(_))));

        let ok = DistanceTrajectory::from_series(vec![(2, vec![1.0, 2.0]), (1, vec![3.0, 4.0])])
            .unwrap();
        assert_eq!(ok.n_frames(), 2);
        assert_eq!(ok.n_candidates(), 2);
    }

    #[test]
    fn test_nearest_tie_goes_to_lowest_id() {
        let traj = DistanceTrajectory::from_series(vec![
            (9, vec![2.0, 1.0]),
            (4, vec![2.0, 3.0]),
            (6, vec![5.0, 1.0]),
        ])
        .unwrap();

        let (row, d) = traj.nearest(0).unwrap();
        assert_eq!(traj.id_at(row), 4);
        assert_eq!(d, 2.0);

        let (row, d) = traj.nearest(1).unwrap();
        assert_eq!(traj.id_at(row), 6);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_nearest_skips_nan() {
        let traj = DistanceTrajectory::from_series(vec![(1, vec![f64::NAN]), (2, vec![4.0])])
            .unwrap();
        let (row, d) = traj.nearest(0).unwrap();
        assert_eq!(traj.id_at(row), 2);
        assert_eq!(d, 4.0);
    }

    #[test]
    fn test_build_two_pass_with_sentinel_fill() {
        let stack = drifting_stack();
        let traj = build_distance_trajectory(&stack, 1, 0, 4, "solvent", &selections(), 3.5)
            .unwrap();

        // atom 4 is never within 3.5, atom 2 only early, atom 3 only late
        assert_eq!(traj.ids(), &[2, 3]);
        assert_eq!(traj.n_frames(), 4);

        // once captured, every frame carries the real distance
        let a2 = traj.series(2).unwrap();
        assert!((a2[0] - 1.0).abs() < 1e-10);
        assert!((a2[3] - 7.0).abs() < 1e-10);

        let a3 = traj.series(3).unwrap();
        assert!((a3[0] - 8.0).abs() < 1e-10);
        assert!((a3[3] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_build_sub_window() {
        let stack = drifting_stack();
        let traj = build_distance_trajectory(&stack, 1, 2, 4, "solvent", &selections(), 3.5)
            .unwrap();

        assert_eq!(traj.n_frames(), 2);
        assert_eq!(traj.ids(), &[3]);
        assert!((traj.series(3).unwrap()[0] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_build_invalid_species() {
        let stack = drifting_stack();
        let res = build_distance_trajectory(&stack, 1, 0, 4, "cation", &selections(), 3.5);

        match res {
            Err(HoppingError::InvalidSpecies { species, known }) => {
                assert_eq!(species, "cation");
                assert_eq!(known, vec!["anion".to_string(), "solvent".to_string()]);
            }
            other => panic!("expected InvalidSpecies, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_capture_radius_at_sentinel() {
        let stack = drifting_stack();
        let res = TrajectoryBuilder::new(5.0)
            .with_sentinel(5.0)
            .build(&stack, 1, 0, 4, "solvent", &selections());
        assert!(matches!(res, Err(HoppingError::InvalidParameter(_))));
    }

    #[test]
    fn test_build_rejects_bad_window() {
        let stack = drifting_stack();
        let res = build_distance_trajectory(&stack, 1, 3, 3, "solvent", &selections(), 3.5);
        assert!(matches!(res, Err(HoppingError::FrameRange { .. })));

        let res = build_distance_trajectory(&stack, 1, 0, 5, "solvent", &selections(), 3.5);
        assert!(matches!(res, Err(HoppingError::FrameRange { n_frames: 4, .. })));
    }

    #[test]
    fn test_build_empty_capture() {
        let stack = drifting_stack();
        let traj = build_distance_trajectory(&stack, 1, 0, 4, "solvent", &selections(), 0.5)
            .unwrap();
        assert!(traj.is_empty());
        assert_eq!(traj.n_frames(), 4);
    }
}
