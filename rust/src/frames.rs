//! Trajectory frame access.
//!
//! `FrameSource` is the seam to whatever actually reads the trajectory and
//! evaluates selections. `FrameStack` is a plain in-memory implementation
//! over a (frames × atoms × 3) coordinate array, used by the Python bindings
//! and the tests.

use ndarray::{Array2, Array3};

use crate::distance::{min_image_distance, BoxDimensions};
use crate::error::{HoppingError, Result};

/// 1-based atom identifier. `0` never names an atom; it is the unbound site.
pub type AtomId = u32;

/// Per-frame positions, box dimensions and geometric selection.
pub trait FrameSource {
    /// Selection expression understood by this source (one per species).
    type Selection;

    /// Number of frames in the trajectory.
    fn n_frames(&self) -> usize;

    /// Box edge lengths at `frame`.
    fn box_dimensions(&self, frame: usize) -> Result<BoxDimensions>;

    /// Position of `atom` at `frame`.
    fn position(&self, frame: usize, atom: AtomId) -> Result<[f64; 3]>;

    /// Atoms matched by `selection` lying within `radius` (minimum image) of
    /// `reference` at `frame`, excluding `reference` itself.
    fn select_within(
        &self,
        frame: usize,
        reference: AtomId,
        radius: f64,
        selection: &Self::Selection,
    ) -> Result<Vec<AtomId>>;
}

/// In-memory trajectory: coordinates plus an orthorhombic box per frame.
///
/// Selections are explicit atom id lists.
#[derive(Debug, Clone)]
pub struct FrameStack {
    coords: Array3<f64>,
    boxes: Array2<f64>,
}

impl FrameStack {
    /// Build from (n_frames × n_atoms × 3) coordinates and (n_frames × 3) box lengths.
    pub fn new(coords: Array3<f64>, boxes: Array2<f64>) -> Result<Self> {
        let (n_frames, _n_atoms, n_dims) = coords.dim();
        if n_dims != 3 {
            return Err(HoppingError::shape(format!(
                "coordinates must have 3 components per atom, got {}",
                n_dims
            )));
        }
        if boxes.dim() != (n_frames, 3) {
            return Err(HoppingError::shape(format!(
                "box array must be ({}, 3), got {:?}",
                n_frames,
                boxes.dim()
            )));
        }
        Ok(Self { coords, boxes })
    }

    /// Number of atoms per frame.
    pub fn n_atoms(&self) -> usize {
        self.coords.dim().1
    }

    fn atom_index(&self, atom: AtomId) -> Result<usize> {
        let idx = (atom as usize)
            .checked_sub(1)
            .ok_or(HoppingError::UnknownAtom(atom))?;
        if idx >= self.n_atoms() {
            return Err(HoppingError::UnknownAtom(atom));
        }
        Ok(idx)
    }

    fn check_frame(&self, frame: usize) -> Result<()> {
        let n_frames = self.n_frames();
        if frame >= n_frames {
            return Err(HoppingError::FrameRange {
                start: frame,
                end: frame + 1,
                n_frames,
            });
        }
        Ok(())
    }
}

impl FrameSource for FrameStack {
    type Selection = Vec<AtomId>;

    fn n_frames(&self) -> usize {
        self.coords.dim().0
    }

    fn box_dimensions(&self, frame: usize) -> Result<BoxDimensions> {
        self.check_frame(frame)?;
        let row = self.boxes.row(frame);
        Ok([row[0], row[1], row[2]])
    }

    fn position(&self, frame: usize, atom: AtomId) -> Result<[f64; 3]> {
        self.check_frame(frame)?;
        let idx = self.atom_index(atom)?;
        Ok([
            self.coords[[frame, idx, 0]],
            self.coords[[frame, idx, 1]],
            self.coords[[frame, idx, 2]],
        ])
    }

    fn select_within(
        &self,
        frame: usize,
        reference: AtomId,
        radius: f64,
        selection: &Self::Selection,
    ) -> Result<Vec<AtomId>> {
        let dims = self.box_dimensions(frame)?;
        let center = self.position(frame, reference)?;

        let mut shell = Vec::new();
        for &atom in selection {
            if atom == reference {
                continue;
            }
            let pos = self.position(frame, atom)?;
            if min_image_distance(center, pos, dims) <= radius {
                shell.push(atom);
            }
        }
        Ok(shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn two_frame_stack() -> FrameStack {
        // atom 1 at origin-ish, atom 2 close, atom 3 across the boundary
        let coords = Array3::from_shape_vec(
            (2, 3, 3),
            vec![
                0.5, 0.5, 0.5, 1.5, 0.5, 0.5, 9.0, 0.5, 0.5, // frame 0
                0.5, 0.5, 0.5, 5.5, 0.5, 0.5, 9.8, 0.5, 0.5, // frame 1
            ],
        )
        .unwrap();
        let boxes = array![[10.0, 10.0, 10.0], [10.0, 10.0, 10.0]];
        FrameStack::new(coords, boxes).unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let coords = Array3::<f64>::zeros((2, 4, 3));
        let bad_boxes = Array2::<f64>::zeros((3, 3));
        assert!(matches!(
            FrameStack::new(coords, bad_boxes),
            Err(HoppingError::ShapeMismatch(_))
        ));

        let bad_coords = Array3::<f64>::zeros((2, 4, 2));
        let boxes = Array2::<f64>::zeros((2, 3));
        assert!(FrameStack::new(bad_coords, boxes).is_err());
    }

    #[test]
    fn test_one_based_ids() {
        let stack = two_frame_stack();
        assert_eq!(stack.position(0, 2).unwrap(), [1.5, 0.5, 0.5]);
        assert_eq!(stack.position(0, 0), Err(HoppingError::UnknownAtom(0)));
        assert_eq!(stack.position(0, 4), Err(HoppingError::UnknownAtom(4)));
    }

    #[test]
    fn test_frame_out_of_range() {
        let stack = two_frame_stack();
        assert!(matches!(
            stack.box_dimensions(2),
            Err(HoppingError::FrameRange { n_frames: 2, .. })
        ));
    }

    #[test]
    fn test_select_within_is_periodic_and_excludes_reference() {
        let stack = two_frame_stack();
        let selection = vec![1, 2, 3];

        let shell = stack.select_within(0, 1, 2.0, &selection).unwrap();
        assert_eq!(shell, vec![2, 3]);

        // atom 2 moved away, atom 3 is 0.7 away through the boundary
        let shell = stack.select_within(1, 1, 2.0, &selection).unwrap();
        assert_eq!(shell, vec![3]);
    }
}
