use crate::{ReciteError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Write audio samples to a WAV file
///
/// # Arguments
/// * `path` - Path to the output WAV file
/// * `samples` - Audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| ReciteError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    // Convert f32 samples to i16
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| ReciteError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ReciteError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    debug!("Wrote {} samples to {:?}", samples.len(), path.as_ref());
    Ok(())
}

/// Read audio samples from a WAV file
///
/// # Returns
/// * Tuple of (interleaved samples, sample_rate, channels)
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| ReciteError::AudioDecodeError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;

    debug!(
        "Reading WAV file: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples: Result<Vec<f32>> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| ReciteError::AudioDecodeError(format!("Bad sample: {}", e))))
            .collect(),
        SampleFormat::Int => {
            let max = match spec.bits_per_sample {
                16 => i16::MAX as f32,
                24 => 8_388_607.0,
                32 => i32::MAX as f32,
                bits => {
                    return Err(ReciteError::AudioDecodeError(format!(
                        "Unsupported bit depth: {}",
                        bits
                    )))
                }
            };
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|sample| sample as f32 / max)
                        .map_err(|e| ReciteError::AudioDecodeError(format!("Bad sample: {}", e)))
                })
                .collect()
        }
    };

    Ok((samples?, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_wav_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_wav_write_then_read() {
        let path = temp_wav_path("recite_test_roundtrip.wav");
        let samples: Vec<f32> = (0..16000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 0.5)
            .collect();

        write_wav(&path, &samples, 16000, 1).unwrap();
        let (read_samples, sample_rate, channels) = read_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(sample_rate, 16000);
        assert_eq!(channels, 1);
        assert_eq!(read_samples.len(), samples.len());
        // 16-bit quantization loses precision; stay within one step.
        for (a, b) in read_samples.iter().zip(samples.iter()) {
            assert!((a - b).abs() < 1.0 / i16::MAX as f32 * 2.0);
        }
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_wav("/nonexistent/recite.wav");
        assert!(matches!(result, Err(ReciteError::AudioDecodeError(_))));
    }
}
