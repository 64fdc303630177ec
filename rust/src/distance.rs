//! Periodic (minimum-image) distances for orthorhombic simulation boxes.
//!
//! Coordinates are expected to be wrapped into the primary cell, so a single
//! image shift per axis is enough to reach the nearest periodic copy.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Box edge lengths along x, y, z.
pub type BoxDimensions = [f64; 3];

/// Minimum-image displacement from `b` to `a`.
///
/// Per axis: `diff > L/2` maps to `diff - L`, `diff < -L/2` maps to `diff + L`.
/// An axis of length 0 is effectively non-periodic.
#[inline]
pub fn min_image_vector(a: [f64; 3], b: [f64; 3], dims: BoxDimensions) -> [f64; 3] {
    let mut vec = [0.0; 3];
    for axis in 0..3 {
        let diff = a[axis] - b[axis];
        let half = dims[axis] / 2.0;
        vec[axis] = if diff > half {
            diff - dims[axis]
        } else if diff < -half {
            diff + dims[axis]
        } else {
            diff
        };
    }
    vec
}

/// Minimum-image distance between two positions.
#[inline]
pub fn min_image_distance(a: [f64; 3], b: [f64; 3], dims: BoxDimensions) -> f64 {
    let v = min_image_vector(a, b, dims);
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Minimum-image distance from one reference position to every row of `positions`.
///
/// # Arguments
/// * `reference` - Reference position (length 3)
/// * `positions` - (n_atoms × 3) positions
/// * `dims` - Box edge lengths
///
/// # Returns
/// Distances, one per row of `positions`
pub fn distances_to_reference(
    reference: ArrayView1<f64>,
    positions: ArrayView2<f64>,
    dims: BoxDimensions,
) -> Array1<f64> {
    let r = [reference[0], reference[1], reference[2]];

    positions
        .outer_iter()
        .map(|row| min_image_distance(r, [row[0], row[1], row[2]], dims))
        .collect()
}
