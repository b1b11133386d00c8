//! Descriptive statistics behind the summary panel and the chart gallery.
//!
//! Conventions: sample variance (n - 1), linear-interpolated percentiles,
//! "auto" histogram bins, and Scott's rule for KDE bandwidth.

use serde::Serialize;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Pearson correlation; NaN when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(&x[..n]), mean(&y[..n]));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Pairwise Pearson matrix over columns, row-major.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = columns.len();
    let mut matrix = vec![vec![f64::NAN; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = if i == j && std_dev(&columns[i]) > 0.0 {
                1.0
            } else {
                pearson(&columns[i], &columns[j])
            };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Percentile with linear interpolation between closest ranks. `sorted` must
/// be ascending and non-empty; `q` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Five-number summary plus outliers, as drawn by a Tukey boxplot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest observation within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Largest observation within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

impl BoxStats {
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_copy(values);
        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence)
            .collect();
        let whisker_low = inside.first().copied().unwrap_or(q1);
        let whisker_high = inside.last().copied().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
            count: sorted.len(),
        })
    }
}

/// One histogram bar, `[start, end)` except the last which is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bin edges by the "auto" rule: the smaller of the Sturges and
/// Freedman-Diaconis widths, falling back to Sturges when the IQR is zero.
pub fn auto_bin_edges(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let sorted = sorted_copy(values);
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    if min == max {
        return vec![min - 0.5, max + 0.5];
    }

    let n = sorted.len() as f64;
    let range = max - min;
    let sturges = range / (n.log2() + 1.0);
    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
    let fd = 2.0 * iqr / n.cbrt();
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

    let n_bins = ((range / width).ceil() as usize).max(1);
    (0..=n_bins)
        .map(|i| min + range * i as f64 / n_bins as f64)
        .collect()
}

pub fn histogram(values: &[f64]) -> Vec<Bin> {
    let edges = auto_bin_edges(values);
    if edges.len() < 2 {
        return Vec::new();
    }
    let mut bins: Vec<Bin> = edges
        .windows(2)
        .map(|w| Bin {
            start: w[0],
            end: w[1],
            count: 0,
        })
        .collect();
    let first = edges[0];
    let last = edges[edges.len() - 1];
    let n_bins = bins.len();
    for &v in values {
        if v < first || v > last {
            continue;
        }
        let idx = if v == last {
            n_bins - 1
        } else {
            let pos = (v - first) / (last - first) * n_bins as f64;
            (pos.floor() as usize).min(n_bins - 1)
        };
        bins[idx].count += 1;
    }
    bins
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Number of points on the KDE evaluation grid.
pub const KDE_GRID_SIZE: usize = 200;

/// Gaussian KDE over the data range, scaled by `n * bin_width` so the curve
/// overlays a count histogram. Returns no points when the bandwidth is zero.
pub fn kde_curve(values: &[f64], bin_width: f64) -> Vec<Point> {
    let n = values.len();
    let sd = std_dev(values);
    if n < 2 || !(sd > 0.0) {
        return Vec::new();
    }
    // Scott's rule, one dimension.
    let bandwidth = sd * (n as f64).powf(-0.2);
    let sorted = sorted_copy(values);
    let (min, max) = (sorted[0], sorted[n - 1]);
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * n as f64);
    let scale = n as f64 * bin_width;

    (0..KDE_GRID_SIZE)
        .map(|i| {
            let x = min + (max - min) * i as f64 / (KDE_GRID_SIZE - 1) as f64;
            let density: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            Point {
                x,
                y: density * scale,
            }
        })
        .collect()
}
