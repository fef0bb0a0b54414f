use crate::config::PitchConfig;

/// A single pitch estimate with the detector's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub frequency_hz: f32,
    /// 1 - normalized difference at the chosen lag, in [0, 1].
    pub clarity: f32,
    /// The lag cleared the absolute threshold. When false the estimate is
    /// the global minimum of the difference function.
    pub periodic: bool,
}

/// YIN difference-function pitch detector for one analysis window.
#[derive(Debug, Clone)]
pub struct YinDetector {
    sample_rate: f32,
    min_frequency_hz: f32,
    max_frequency_hz: f32,
    threshold: f32,
}

impl YinDetector {
    pub fn new(sample_rate: u32, min_frequency_hz: f32, max_frequency_hz: f32, threshold: f32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            min_frequency_hz,
            max_frequency_hz,
            threshold,
        }
    }

    pub fn from_config(config: &PitchConfig, sample_rate: u32) -> Self {
        Self::new(
            sample_rate,
            config.min_frequency_hz,
            config.max_frequency_hz,
            config.threshold,
        )
    }

    /// Estimate f0 for `window`. When no lag clears the threshold the global
    /// minimum is reported with `periodic == false`, leaving the voicing
    /// decision to the caller. `None` for flat windows and out-of-range
    /// estimates.
    pub fn detect(&self, window: &[f32]) -> Option<PitchEstimate> {
        let integration = window.len() / 2;
        if integration < 2 {
            return None;
        }
        // The search starts an octave above the admissible range so that
        // too-high tones are rejected instead of folding down an octave.
        let tau_min = ((self.sample_rate / (2.0 * self.max_frequency_hz)).floor() as usize).max(2);
        let tau_max = ((self.sample_rate / self.min_frequency_hz).ceil() as usize).min(integration);
        if tau_min + 1 >= tau_max {
            return None;
        }

        let cmnd = cumulative_mean_normalized_difference(window, integration, tau_max);
        let (best_tau, periodic) = match self.first_dip(&cmnd, tau_min, tau_max) {
            Some(tau) => (tau, true),
            None => (global_minimum(&cmnd, tau_min, tau_max)?, false),
        };
        let refined = parabolic_interpolation(&cmnd, best_tau);
        let frequency_hz = self.sample_rate / refined;

        if frequency_hz <= self.min_frequency_hz || frequency_hz >= self.max_frequency_hz {
            return None;
        }
        Some(PitchEstimate {
            frequency_hz,
            clarity: (1.0 - cmnd[best_tau]).clamp(0.0, 1.0),
            periodic,
        })
    }

    /// First lag below the threshold, walked down to the bottom of its valley.
    fn first_dip(&self, cmnd: &[f32], tau_min: usize, tau_max: usize) -> Option<usize> {
        let mut tau = tau_min;
        while tau < tau_max {
            if cmnd[tau] < self.threshold {
                while tau < tau_max && cmnd[tau + 1] < cmnd[tau] {
                    tau += 1;
                }
                return Some(tau);
            }
            tau += 1;
        }
        None
    }
}

/// Lowest difference value in the search range; flat windows have none.
fn global_minimum(cmnd: &[f32], tau_min: usize, tau_max: usize) -> Option<usize> {
    (tau_min..=tau_max)
        .filter(|&tau| cmnd[tau] < 1.0)
        .min_by(|&a, &b| cmnd[a].total_cmp(&cmnd[b]))
}

fn cumulative_mean_normalized_difference(
    window: &[f32],
    integration: usize,
    tau_max: usize,
) -> Vec<f32> {
    let mut cmnd = vec![1.0_f32; tau_max + 1];
    let mut running_sum = 0.0_f64;
    for tau in 1..=tau_max {
        let difference: f64 = window[..integration]
            .iter()
            .zip(&window[tau..tau + integration])
            .map(|(&a, &b)| {
                let delta = (a - b) as f64;
                delta * delta
            })
            .sum();
        running_sum += difference;
        cmnd[tau] = if running_sum > 0.0 {
            (difference * tau as f64 / running_sum) as f32
        } else {
            1.0
        };
    }
    cmnd
}

fn parabolic_interpolation(cmnd: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f32;
    }
    let (alpha, beta, gamma) = (cmnd[tau - 1], cmnd[tau], cmnd[tau + 1]);
    let denominator = 2.0 * (2.0 * beta - alpha - gamma);
    if denominator.abs() < 1e-12 {
        tau as f32
    } else {
        tau as f32 + (alpha - gamma) / denominator
    }
}
