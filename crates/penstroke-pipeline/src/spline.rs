//! Cubic spline fitting through landmark points.
//!
//! Turns an ordered sequence of interpolation points `P0..Pn` into a
//! C¹-continuous piecewise cubic Bezier curve passing through every
//! point, then samples it at a fixed density.
//!
//! For each segment `i` the inner control points `A_i` and `B_i` are
//! chosen so that first and second derivatives match at interior
//! points and vanish (second derivative) at the ends. Eliminating `B`
//! leaves one tridiagonal system in `A`:
//!
//! ```text
//! | 2 1         | |A_0    |   |P_0 + 2 P_1          |
//! | 1 4 1       | |A_1    |   |2 (2 P_1 + P_2)      |
//! |   . . .     | | .     | = | .                   |
//! |     1 4 1   | | .     |   |2 (2 P_i + P_{i+1})  |
//! |       2 7   | |A_{n-1}|   |8 P_{n-1} + P_n      |
//! ```
//!
//! and then `B_i = 2 P_{i+1} - A_{i+1}`, `B_{n-1} = (A_{n-1} + P_n) / 2`.
//!
//! A single segment is solved directly: the first and last rows would
//! both describe row 0, so it gets its own natural-end equation
//! `3 A_0 = 2 P_0 + P_1`, which puts the control points at one and two
//! thirds of the chord.

use crate::types::{Point, Polyline, SynthesisError};

/// Inner Bezier control points of one spline segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoints {
    /// Control point next to the segment's start.
    pub a: Point,
    /// Control point next to the segment's end.
    pub b: Point,
}

/// Fit a cubic spline through `points` and sample it.
///
/// Returns `n * samples_per_segment` points for `n + 1` input points.
/// Every segment but the last is sampled at `t = k / s` for
/// `k = 0..s`; the last is sampled from `t = 0` to `t = 1` inclusive,
/// so the output starts exactly at the first input point and ends
/// exactly at the last. With `s = 1` the last segment contributes only
/// its end point.
///
/// Identical input always produces bit-identical output.
///
/// # Errors
///
/// Returns [`SynthesisError::InvalidInput`] if `points` has fewer than
/// two points, contains a non-finite coordinate, `samples_per_segment`
/// is zero, or the sampled curve would have fewer than two points.
/// Returns [`SynthesisError::SingularSystem`] if the linear solve hits a
/// zero pivot.
pub fn fit_cubic_spline(
    points: &[Point],
    samples_per_segment: usize,
) -> Result<Polyline, SynthesisError> {
    if points.len() < 2 {
        return Err(SynthesisError::InvalidInput(format!(
            "spline fitting needs at least 2 points, got {}",
            points.len()
        )));
    }
    if samples_per_segment == 0 {
        return Err(SynthesisError::InvalidInput(
            "samples per segment must be at least 1".to_string(),
        ));
    }
    if let Some(i) = points.iter().position(|p| !p.is_finite()) {
        return Err(SynthesisError::InvalidInput(format!(
            "point {i} has a non-finite coordinate"
        )));
    }

    let segments = points.len() - 1;
    let total = segments * samples_per_segment;
    if total < 2 {
        return Err(SynthesisError::InvalidInput(format!(
            "{segments} segment(s) at {samples_per_segment} sample(s) each yields a single point"
        )));
    }

    let controls = control_points(points)?;

    let mut sampled = Vec::with_capacity(total);
    for (i, ctrl) in controls.iter().enumerate() {
        let (start, end) = (points[i], points[i + 1]);
        let is_last = i + 1 == segments;
        for k in 0..samples_per_segment {
            let t = sample_parameter(k, samples_per_segment, is_last);
            sampled.push(cubic_bezier(start, ctrl.a, ctrl.b, end, t));
        }
    }

    Ok(Polyline::new(sampled))
}

/// Compute the inner control points of every segment of the spline
/// through `points`.
///
/// # Errors
///
/// Returns [`SynthesisError::InvalidInput`] for fewer than two points
/// and [`SynthesisError::SingularSystem`] if the solve fails.
pub fn control_points(points: &[Point]) -> Result<Vec<ControlPoints>, SynthesisError> {
    let n = points.len().saturating_sub(1);
    if n == 0 {
        return Err(SynthesisError::InvalidInput(format!(
            "spline fitting needs at least 2 points, got {}",
            points.len()
        )));
    }

    if n == 1 {
        let a = (points[0] * 2.0 + points[1]) / 3.0;
        let b = (a + points[1]) / 2.0;
        return Ok(vec![ControlPoints { a, b }]);
    }

    let mut lower = vec![1.0; n];
    let mut diag = vec![4.0; n];
    let upper = vec![1.0; n];
    let mut rhs: Vec<Point> = (0..n)
        .map(|i| (points[i] * 2.0 + points[i + 1]) * 2.0)
        .collect();

    diag[0] = 2.0;
    rhs[0] = points[0] + points[1] * 2.0;

    lower[n - 1] = 2.0;
    diag[n - 1] = 7.0;
    rhs[n - 1] = points[n - 1] * 8.0 + points[n];

    let a = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;

    let mut controls = Vec::with_capacity(n);
    for i in 0..n - 1 {
        controls.push(ControlPoints {
            a: a[i],
            b: points[i + 1] * 2.0 - a[i + 1],
        });
    }
    controls.push(ControlPoints {
        a: a[n - 1],
        b: (a[n - 1] + points[n]) / 2.0,
    });

    Ok(controls)
}

/// Evaluate the cubic Bezier `p0, a, b, p1` at `t`.
#[must_use]
pub fn cubic_bezier(p0: Point, a: Point, b: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + a * (3.0 * mt * mt * t) + b * (3.0 * mt * t * t) + p1 * (t * t * t)
}

/// Curve parameter of sample `k` out of `samples` on one segment.
#[allow(clippy::cast_precision_loss)]
fn sample_parameter(k: usize, samples: usize, is_last: bool) -> f64 {
    if !is_last {
        k as f64 / samples as f64
    } else if samples == 1 {
        1.0
    } else {
        k as f64 / (samples - 1) as f64
    }
}

/// Solve a tridiagonal system by forward elimination and back
/// substitution.
///
/// `lower[0]` and `upper[n - 1]` are ignored. Both coordinates are
/// solved at once since the coefficients are scalar.
fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[Point],
) -> Result<Vec<Point>, SynthesisError> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![Point::new(0.0, 0.0); n];

    let mut pivot = diag[0];
    if pivot.abs() < f64::EPSILON {
        return Err(SynthesisError::SingularSystem { row: 0 });
    }
    c[0] = upper[0] / pivot;
    d[0] = rhs[0] / pivot;

    for i in 1..n {
        pivot = lower[i].mul_add(-c[i - 1], diag[i]);
        if pivot.abs() < f64::EPSILON {
            return Err(SynthesisError::SingularSystem { row: i });
        }
        c[i] = upper[i] / pivot;
        d[i] = (rhs[i] - d[i - 1] * lower[i]) / pivot;
    }

    let mut x = d;
    for i in (0..n - 1).rev() {
        x[i] = x[i] - x[i + 1] * c[i];
    }
    Ok(x)
}
