/// Linearly resample `samples` from `source_rate` to `target_rate`.
///
/// Both rates must be positive; callers check this before resampling.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == target_rate || source_rate == 0 || target_rate == 0 {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let last_index = samples.len() - 1;
    (0..output_len)
        .map(|i| {
            let position = i as f64 / ratio;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = (position - left as f64) as f32;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::linear_resample;

    #[test]
    fn preserves_constant_signal_when_upsampling() {
        let input = vec![0.5; 480];
        let resampled = linear_resample(&input, 22_050, 44_100);
        assert_eq!(resampled.len(), 960);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn identity_when_rates_match() {
        let input = vec![0.1, -0.2, 0.3];
        assert_eq!(linear_resample(&input, 44_100, 44_100), input);
    }

    #[test]
    fn downsampling_shortens_buffer() {
        let input = vec![0.0; 48_000];
        let len = linear_resample(&input, 48_000, 44_100).len() as i64;
        assert!((len - 44_100).abs() <= 1, "unexpected length {len}");
    }
}
