use std::f32::consts::PI;

/// Single-bin DFT magnitude at `target_hz` via Goertzel's recursion.
pub fn goertzel_magnitude(samples: &[f32], target_hz: f32, sample_rate: u32) -> f32 {
    if samples.is_empty() || sample_rate == 0 {
        return 0.0;
    }
    let n = samples.len() as f32;
    let k = (0.5 + n * target_hz / sample_rate as f32).round();
    let omega = 2.0 * PI * k / n;
    let coeff = 2.0 * omega.cos();

    let (mut q1, mut q2) = (0.0_f32, 0.0_f32);
    for &sample in samples {
        let q0 = coeff * q1 - q2 + sample;
        q2 = q1;
        q1 = q0;
    }
    (q1 * q1 + q2 * q2 - q1 * q2 * coeff).max(0.0).sqrt()
}

/// Symmetric Hann taper of length `len`.
pub fn hann_window(len: usize) -> Vec<f32> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f32;
            (0..len)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / 44_100.0).sin())
            .collect()
    }

    #[test]
    fn magnitude_peaks_at_the_tone_frequency() {
        let signal = tone(500.0, 2048);
        let on_bin = goertzel_magnitude(&signal, 500.0, 44_100);
        let off_bin = goertzel_magnitude(&signal, 3000.0, 44_100);
        assert!(on_bin > 20.0 * off_bin, "on={on_bin} off={off_bin}");
    }

    #[test]
    fn silence_has_zero_magnitude() {
        assert_eq!(goertzel_magnitude(&[0.0; 512], 150.0, 44_100), 0.0);
        assert_eq!(goertzel_magnitude(&[], 150.0, 44_100), 0.0);
    }

    #[test]
    fn hann_window_tapers_to_zero() {
        let window = hann_window(2048);
        assert!(window[0].abs() < 1e-6);
        assert!(window[2047].abs() < 1e-6);
        assert!(window.iter().all(|w| (0.0..=1.0).contains(w)));
    }
}
