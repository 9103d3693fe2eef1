use crate::{ReciteError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Resample a whole mono clip to a new rate.
///
/// Clips are loaded once and played many times, so one-shot conversion at
/// load is cheaper than converting in the output callback.
pub fn resample_clip(samples: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == 0 || output_rate == 0 {
        return Err(ReciteError::ConfigError(
            "Sample rates must be greater than 0".into(),
        ));
    }

    if input_rate == output_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let resample_ratio = output_rate as f64 / input_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // chunk_size is the number of frames per channel
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| {
            ReciteError::AudioProcessingError(format!("Failed to create resampler: {}", e))
        })?;

    let mut output =
        Vec::with_capacity((samples.len() as f64 * resample_ratio) as usize + chunk_size);

    let mut position = 0;
    while position + chunk_size <= samples.len() {
        let chunk = vec![samples[position..position + chunk_size].to_vec()];
        let mut frames = resampler
            .process(&chunk, None)
            .map_err(|e| ReciteError::AudioProcessingError(format!("Resampling failed: {}", e)))?;
        output.append(&mut frames[0]);
        position += chunk_size;
    }

    if position < samples.len() {
        let tail = vec![samples[position..].to_vec()];
        let mut frames = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| ReciteError::AudioProcessingError(format!("Resampling failed: {}", e)))?;
        output.append(&mut frames[0]);
    }

    // Drain the filter delay so the clip keeps its tail.
    let flush: Option<&[Vec<f32>]> = None;
    let mut frames = resampler
        .process_partial(flush, None)
        .map_err(|e| ReciteError::AudioProcessingError(format!("Resampling failed: {}", e)))?;
    output.append(&mut frames[0]);

    debug!(
        "Resampled clip: {} samples @ {} Hz -> {} samples @ {} Hz",
        samples.len(),
        input_rate,
        output.len(),
        output_rate
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        let output = resample_clip(&samples, 16000, 16000).unwrap();
        assert_eq!(output, samples);
    }

    #[test]
    fn test_empty_clip() {
        let output = resample_clip(&[], 16000, 48000).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_upsample_length() {
        let samples: Vec<f32> = (0..1600).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resample_clip(&samples, 16000, 48000).unwrap();
        assert!(!output.is_empty());
        // Roughly 3x as long, give or take filter delay.
        assert!(output.len() >= 4000);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let result = resample_clip(&[0.0], 0, 48000);
        assert!(matches!(result, Err(ReciteError::ConfigError(_))));
    }
}
