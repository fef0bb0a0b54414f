//! Statistics shared by the batch classifier and the live scorers.

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation, `0.0` for an empty slice.
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}

pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Round and clamp a raw score into [0, 100].
pub fn clamp_score(raw: f32) -> f32 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.round().clamp(0.0, 100.0)
}

/// Lengths of the runs of zero values that sit between non-zero values.
///
/// Leading and trailing runs are not reported: silence before the first or
/// after the last voiced sample is not a pause.
pub fn interior_zero_runs(values: &[f32]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut seen_voiced = false;
    let mut current = 0usize;
    for &value in values {
        if value > 0.0 {
            if seen_voiced && current > 0 {
                runs.push(current);
            }
            seen_voiced = true;
            current = 0;
        } else if seen_voiced {
            current += 1;
        }
    }
    runs
}

/// Peak and valley counts from a windowed local-mean comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extrema {
    pub peaks: usize,
    pub valleys: usize,
}

impl Extrema {
    pub fn total(&self) -> usize {
        self.peaks + self.valleys
    }
}

/// Count points that stand out from the means of the `window` values before
/// and after them by more than `margin`. After a hit the scan skips ahead by
/// `window` so one inflection is counted once.
pub fn local_extrema(values: &[f32], window: usize, margin: f32) -> Extrema {
    let mut extrema = Extrema::default();
    if window == 0 || values.len() < 2 * window + 1 {
        return extrema;
    }
    let mut idx = window;
    while idx + window < values.len() {
        let value = values[idx];
        let before = mean(&values[idx - window..idx]);
        let after = mean(&values[idx + 1..=idx + window]);
        if value - before > margin && value - after > margin {
            extrema.peaks += 1;
            idx += window;
        } else if before - value > margin && after - value > margin {
            extrema.valleys += 1;
            idx += window;
        } else {
            idx += 1;
        }
    }
    extrema
}

/// Ordinary least-squares slope of `values` against their index.
pub fn ols_slope(values: &[f32]) -> Option<f32> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().map(|&v| v as f64).sum::<f64>() / n_f;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (idx, &value) in values.iter().enumerate() {
        let dx = idx as f64 - mean_x;
        covariance += dx * (value as f64 - mean_y);
        variance += dx * dx;
    }
    if variance <= f64::EPSILON {
        return None;
    }
    Some((covariance / variance) as f32)
}
