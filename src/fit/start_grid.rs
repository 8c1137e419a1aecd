//! Start-point grid generation.
//!
//! The CSS surface of a low-order ARIMA model can have more than one basin
//! (AR and MA terms partly cancel), so refinement starts from several points:
//! a Hannan–Rissanen estimate plus a coarse, deterministic grid.

/// Largest dimension for which the full grid is generated.
///
/// Above this only the Hannan–Rissanen and zero starts are used.
pub const MAX_GRID_DIM: usize = 3;

/// Generate `steps` evenly spaced points in `[-bound, bound]` (inclusive).
pub fn linspace(bound: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 2.0 * bound / (steps as f64 - 1.0);
            (0..steps).map(|i| -bound + step * i as f64).collect()
        }
    }
}

/// Cartesian grid of coefficient vectors of length `dim`.
pub fn coefficient_grid(dim: usize, bound: f64, steps: usize) -> Vec<Vec<f64>> {
    if dim == 0 || dim > MAX_GRID_DIM {
        return Vec::new();
    }
    let axis = linspace(bound, steps);
    let mut out: Vec<Vec<f64>> = vec![Vec::with_capacity(dim)];
    for _ in 0..dim {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                axis.iter().map(move |&v| {
                    let mut next = prefix.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    out
}
