//! Nelder–Mead simplex minimizer.
//!
//! The distribution fitters repeatedly minimize small (1-D or 2-D) negative
//! log-likelihoods, thousands of times per bootstrap run. The objective is smooth
//! but its gradient is awkward for the Gamma family (digamma terms), so we use a
//! derivative-free simplex search in an unconstrained parametrisation (log-shape,
//! plus location or log-scale where it is not profiled out).
//!
//! Implementation choices:
//! - standard coefficients (reflection 1, expansion 2, contraction 1/2, shrink 1/2)
//! - non-finite objective values are treated as `+∞`, which keeps the simplex out
//!   of invalid regions without explicit constraints
//! - convergence requires both a flat simplex (objective spread) and a small
//!   simplex (parameter spread)

use nalgebra::DVector;

/// Stopping rules for [`minimize`].
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub max_iters: usize,
    /// Absolute tolerance on the spread of objective values.
    pub f_tol: f64,
    /// Absolute tolerance on the spread of vertices.
    pub x_tol: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            f_tol: 1e-10,
            x_tol: 1e-8,
        }
    }
}

/// Result of a simplex search.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: DVector<f64>,
    pub f: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `f` starting at `x0` with per-coordinate initial steps `step`.
///
/// Returns `None` if the objective is not finite at the starting point.
pub fn minimize<F>(f: F, x0: &DVector<f64>, step: &DVector<f64>, opts: &SimplexOptions) -> Option<Minimum>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let dim = x0.len();
    let eval = |x: &DVector<f64>| {
        let v = f(x);
        if v.is_finite() { v } else { f64::INFINITY }
    };

    let f0 = eval(x0);
    if !f0.is_finite() {
        return None;
    }

    let mut vertices: Vec<(DVector<f64>, f64)> = Vec::with_capacity(dim + 1);
    vertices.push((x0.clone(), f0));
    for i in 0..dim {
        let mut x = x0.clone();
        x[i] += step[i];
        let fx = eval(&x);
        vertices.push((x, fx));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iters {
        vertices.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if is_converged(&vertices, opts) {
            converged = true;
            break;
        }
        iterations += 1;

        // Centroid of all but the worst vertex.
        let mut centroid = DVector::<f64>::zeros(dim);
        for (x, _) in &vertices[..dim] {
            centroid += x;
        }
        centroid /= dim as f64;

        let worst = vertices[dim].clone();
        let best_f = vertices[0].1;
        let second_worst_f = vertices[dim - 1].1;

        let reflected = &centroid + (&centroid - &worst.0);
        let f_reflected = eval(&reflected);

        if f_reflected < best_f {
            let expanded = &centroid + (&reflected - &centroid) * 2.0;
            let f_expanded = eval(&expanded);
            vertices[dim] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }

        if f_reflected < second_worst_f {
            vertices[dim] = (reflected, f_reflected);
            continue;
        }

        // Contraction: outside if the reflection improved on the worst point,
        // inside otherwise.
        let (contracted, f_contracted) = if f_reflected < worst.1 {
            let x = &centroid + (&reflected - &centroid) * 0.5;
            let fx = eval(&x);
            (x, fx)
        } else {
            let x = &centroid + (&worst.0 - &centroid) * 0.5;
            let fx = eval(&x);
            (x, fx)
        };

        if f_contracted < worst.1.min(f_reflected) {
            vertices[dim] = (contracted, f_contracted);
            continue;
        }

        // Shrink towards the best vertex.
        let best_x = vertices[0].0.clone();
        for vertex in vertices.iter_mut().skip(1) {
            let x = &best_x + (&vertex.0 - &best_x) * 0.5;
            let fx = eval(&x);
            *vertex = (x, fx);
        }
    }

    vertices.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (x, f) = vertices.swap_remove(0);
    Some(Minimum {
        x,
        f,
        iterations,
        converged,
    })
}

fn is_converged(sorted: &[(DVector<f64>, f64)], opts: &SimplexOptions) -> bool {
    let best = &sorted[0];
    let worst_f = sorted[sorted.len() - 1].1;
    if !worst_f.is_finite() {
        return false;
    }
    let f_spread = worst_f - best.1;
    let f_scale = opts.f_tol * (1.0 + best.1.abs());
    if f_spread > f_scale {
        return false;
    }

    sorted[1..]
        .iter()
        .all(|(x, _)| (x - &best.0).amax() <= opts.x_tol * (1.0 + best.0.amax()))
}
