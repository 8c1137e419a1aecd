//! Derivative-free minimization (Nelder–Mead simplex).
//!
//! The CSS objective is cheap to evaluate and returns `+∞` outside the
//! admissible region, which the simplex handles naturally: infeasible
//! vertices always rank worst and get contracted away.

use std::cmp::Ordering;

/// Tuning for `nelder_mead`.
#[derive(Debug, Clone)]
pub struct NelderMeadOptions {
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values across the simplex.
    pub f_tol: f64,
    /// Absolute tolerance on the simplex diameter.
    pub x_tol: f64,
    /// Edge length of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iter: 2_000,
            f_tol: 1e-10,
            x_tol: 1e-7,
            initial_step: 0.1,
        }
    }
}

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`.
pub fn nelder_mead<F>(f: F, x0: &[f64], opts: &NelderMeadOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let dim = x0.len();
    if dim == 0 {
        return Minimum {
            x: Vec::new(),
            fx: f(x0),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex = initial_simplex(&f, x0, opts.initial_step);

    for iter in 0..opts.max_iter {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        if has_converged(&simplex, opts) {
            let (x, fx) = simplex.swap_remove(0);
            return Minimum {
                x,
                fx,
                iterations: iter,
                converged: true,
            };
        }

        let best_f = simplex[0].1;
        let second_worst_f = simplex[dim - 1].1;
        let (worst_x, worst_f) = simplex[dim].clone();

        let centroid = centroid(&simplex[..dim]);
        let reflected = along(&centroid, &worst_x, -REFLECT);
        let fr = f(&reflected);

        if fr < best_f {
            let expanded = along(&centroid, &worst_x, -REFLECT * EXPAND);
            let fe = f(&expanded);
            simplex[dim] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
            continue;
        }

        if fr < second_worst_f {
            simplex[dim] = (reflected, fr);
            continue;
        }

        let (contracted, fc) = if fr < worst_f {
            let x = along(&centroid, &worst_x, -REFLECT * CONTRACT);
            let fx = f(&x);
            (x, fx)
        } else {
            let x = along(&centroid, &worst_x, CONTRACT);
            let fx = f(&x);
            (x, fx)
        };

        if fc < fr.min(worst_f) {
            simplex[dim] = (contracted, fc);
            continue;
        }

        let best_x = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let x: Vec<f64> = best_x
                .iter()
                .zip(&vertex.0)
                .map(|(b, v)| b + SHRINK * (v - b))
                .collect();
            let fx = f(&x);
            *vertex = (x, fx);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let (x, fx) = simplex.swap_remove(0);
    Minimum {
        x,
        fx,
        iterations: opts.max_iter,
        converged: false,
    }
}

fn initial_simplex<F>(f: &F, x0: &[f64], step: f64) -> Vec<(Vec<f64>, f64)>
where
    F: Fn(&[f64]) -> f64,
{
    let mut simplex = Vec::with_capacity(x0.len() + 1);
    simplex.push((x0.to_vec(), f(x0)));
    for i in 0..x0.len() {
        let mut forward = x0.to_vec();
        forward[i] += step;
        let f_forward = f(&forward);
        if f_forward.is_finite() {
            simplex.push((forward, f_forward));
            continue;
        }
        // Near the region boundary step the other way.
        let mut backward = x0.to_vec();
        backward[i] -= step;
        let f_backward = f(&backward);
        simplex.push((backward, f_backward));
    }
    simplex
}

/// Point `centroid + t * (point - centroid)`.
fn along(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + t * (p - c))
        .collect()
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let dim = vertices[0].0.len();
    let n = vertices.len() as f64;
    let mut out = vec![0.0; dim];
    for (x, _) in vertices {
        for (acc, v) in out.iter_mut().zip(x) {
            *acc += v;
        }
    }
    out.iter_mut().for_each(|v| *v /= n);
    out
}

fn has_converged(sorted: &[(Vec<f64>, f64)], opts: &NelderMeadOptions) -> bool {
    let best = &sorted[0];
    let worst_f = sorted[sorted.len() - 1].1;
    if !(best.1.is_finite() && worst_f.is_finite()) {
        return false;
    }
    let f_spread = (worst_f - best.1).abs();
    if f_spread > opts.f_tol * (1.0 + best.1.abs()) {
        return false;
    }
    sorted[1..].iter().all(|(x, _)| {
        x.iter()
            .zip(&best.0)
            .all(|(a, b)| (a - b).abs() <= opts.x_tol)
    })
}
