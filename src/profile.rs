use crate::density::Density;
use crate::grid::Grid;
use crate::utils::{lerp, solve};

/// Number of samples taken along a bond.
pub const LINE_SAMPLES: usize = 151;
/// Width of the smoothing window, must be odd.
pub const SMOOTHING_WINDOW: usize = 15;
/// Order of the smoothing polynomial.
pub const SMOOTHING_ORDER: usize = 3;
/// Half width, as a fraction of the bond, of the window refined by fine sampling.
pub const FINE_HALF_WIDTH: f64 = 10. / 150.;
/// Relative difference below which two samples of a line are equal.
pub const EQUAL_TOLERANCE: f64 = 1e-12;
/// Above this many voxels per cubic Angstrom automatic sampling stays rough.
pub const ROUGH_RESOLUTION: f64 = 130000.;

/// How densely the bond line is interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampling {
    /// Trilinear interpolation along the whole bond.
    Rough,
    /// Rough, then tricubic interpolation around the rough minimum.
    Fine,
    /// Rough for dense grids and fine otherwise.
    Auto,
}

impl Sampling {
    /// Replaces Auto with a concrete choice for a grid resolution.
    pub fn resolve(self, resolution: f64) -> Self {
        match self {
            Self::Auto if resolution > ROUGH_RESOLUTION => Self::Rough,
            Self::Auto => Self::Fine,
            sampling => sampling,
        }
    }
}

/// The governing minimum of a bond line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMinimum {
    /// Position along the bond, 0 at the site and 1 at the neighbour.
    pub fraction: f64,
    /// The smoothed value at the minimum.
    pub value: f64,
}

/// Samples a field at LINE_SAMPLES evenly spaced points between the fractions
/// `from` and `to` of the line start -> end. Positions are in voxel space and
/// are wrapped before evaluation.
pub fn sample_line<F>(
    grid: &Grid,
    start: [f64; 3],
    end: [f64; 3],
    from: f64,
    to: f64,
    field: F,
) -> Vec<f64>
where
    F: Fn([f64; 3]) -> f64,
{
    let steps = (LINE_SAMPLES - 1) as f64;
    (0..LINE_SAMPLES)
        .map(|i| {
            let t = from + (to - from) * i as f64 / steps;
            field(grid.wrap_position(lerp(start, end, t)))
        })
        .collect()
}

/// The Savitzky-Golay projection for a window: row i gives the weights that
/// produce the fitted value at window position i.
fn smoothing_weights(window: usize, order: usize) -> Vec<Vec<f64>> {
    let half = (window / 2) as f64;
    let rows = (0..window)
        .map(|i| {
            // scaled onto [-1, 1], the projection does not depend on the scale
            let x = (i as f64 - half) / half;
            (0..=order).map(|p| x.powi(p as i32)).collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>();
    let normal = (0..=order)
        .map(|p| {
            (0..=order)
                .map(|q| rows.iter().map(|r| r[p] * r[q]).sum())
                .collect()
        })
        .collect::<Vec<Vec<f64>>>();
    // the weight of sample m is the fitted polynomial of a unit impulse at m
    let impulse = rows
        .iter()
        .map(|r| solve(normal.clone(), r.clone()).unwrap_or_else(|| vec![0.; order + 1]))
        .collect::<Vec<_>>();
    rows.iter()
        .map(|r| {
            impulse
                .iter()
                .map(|c| r.iter().zip(c).map(|(a, b)| a * b).sum())
                .collect()
        })
        .collect()
}

/// Savitzky-Golay smoothing. The edges take the value of the polynomial fitted
/// to the first or last full window.
pub fn smooth(values: &[f64]) -> Vec<f64> {
    let w = SMOOTHING_WINDOW;
    let len = values.len();
    if len < w {
        return values.to_vec();
    }
    let h = w / 2;
    let weights = smoothing_weights(w, SMOOTHING_ORDER);
    let apply = |row: &[f64], window: &[f64]| -> f64 {
        row.iter().zip(window).map(|(a, b)| a * b).sum()
    };
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let value = if i < h {
            apply(&weights[i], &values[..w])
        } else if i >= len - h {
            apply(&weights[w - (len - i)], &values[len - w..])
        } else {
            apply(&weights[h], &values[i - h..=i + h])
        };
        out.push(value);
    }
    out
}

/// Indices that are no larger than the previous sample and strictly smaller
/// than the next. Samples closer than [`EQUAL_TOLERANCE`] of the largest
/// magnitude on the line count as equal, so smoothing noise on a flat line
/// makes no minima.
pub fn local_minima(values: &[f64]) -> Vec<usize> {
    let len = values.len();
    let tolerance = EQUAL_TOLERANCE * values.iter().fold(0f64, |m, v| m.max(v.abs()));
    (0..len)
        .filter(|&i| {
            (i == 0 || values[i] <= values[i - 1] + tolerance)
                && (i + 1 == len || values[i] < values[i + 1] - tolerance)
        })
        .collect()
}

/// The interior local minimum closest to `target`, the first one on a tie.
pub fn closest_minimum(values: &[f64], target: f64) -> Option<usize> {
    let last = values.len().checked_sub(1)?;
    let mut best: Option<(usize, f64)> = None;
    for i in local_minima(values) {
        if i == 0 || i == last {
            continue;
        }
        let distance = (i as f64 - target).abs();
        match best {
            Some((_, d)) if d <= distance => (),
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// The interior local minimum closest to the middle of the line.
pub fn governing_minimum(values: &[f64]) -> Option<usize> {
    let middle = values.len().saturating_sub(1) as f64 / 2.;
    closest_minimum(values, middle)
}

/// Smooths a full bond line and locates its governing minimum.
pub fn line_minimum(values: &[f64]) -> Option<LineMinimum> {
    let smoothed = smooth(values);
    let i = governing_minimum(&smoothed)?;
    Some(LineMinimum {
        fraction: i as f64 / (smoothed.len() - 1) as f64,
        value: smoothed[i],
    })
}

/// Finds bond minima in a field.
pub struct LineProfiler<'a> {
    density: &'a Density,
    grid: &'a Grid,
    /// Never Auto.
    pub sampling: Sampling,
}

impl<'a> LineProfiler<'a> {
    pub fn new(density: &'a Density, grid: &'a Grid, sampling: Sampling) -> Self {
        Self {
            density,
            grid,
            sampling: sampling.resolve(grid.resolution()),
        }
    }

    /// The governing minimum of the line between two voxel positions, None if
    /// the line has no interior minimum.
    pub fn profile(&self, start: [f64; 3], end: [f64; 3]) -> Option<LineMinimum> {
        let rough = sample_line(self.grid, start, end, 0., 1., |p| {
            self.density.linear(p)
        });
        let minimum = line_minimum(&rough)?;
        match self.sampling {
            Sampling::Fine => Some(self.refine(start, end, minimum)),
            _ => Some(minimum),
        }
    }

    fn refine(&self, start: [f64; 3], end: [f64; 3], rough: LineMinimum) -> LineMinimum {
        let from = (rough.fraction - FINE_HALF_WIDTH).max(0.);
        let to = (rough.fraction + FINE_HALF_WIDTH).min(1.);
        let steps = (LINE_SAMPLES - 1) as f64;
        let fine = smooth(&sample_line(self.grid, start, end, from, to, |p| {
            self.density.cubic(p)
        }));
        let target = (rough.fraction - from) / (to - from) * steps;
        match closest_minimum(&fine, target) {
            Some(i) => LineMinimum {
                fraction: from + (to - from) * i as f64 / steps,
                value: fine[i],
            },
            None => rough,
        }
    }
}
