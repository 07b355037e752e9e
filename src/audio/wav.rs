use super::downmix;
use crate::{ParleyError, Result};
use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read audio samples from a WAV file
///
/// # Returns
/// * Tuple of (interleaved samples, sample_rate, channels)
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32, u16)> {
    let reader = WavReader::open(path.as_ref())
        .map_err(|e| ParleyError::Io(format!("Failed to open WAV file: {}", e)))?;
    decode(reader)
}

/// Read a WAV file and mix it down to mono
pub fn read_wav_mono<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let (samples, rate, channels) = read_wav(path)?;
    Ok((downmix(&samples, channels as usize), rate))
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<(Vec<f32>, u32, u16)> {
    let spec = reader.spec();
    debug!(
        "Reading WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let read_err = |e: hound::Error| ParleyError::Io(format!("Failed to read sample: {}", e));
    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0)) // 2^23
            .collect::<std::result::Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(read_err)?,
        (SampleFormat::Int, bits) => {
            return Err(ParleyError::AudioProcessing(format!(
                "Unsupported bit depth: {}",
                bits
            )));
        }
    };

    Ok((samples, spec.sample_rate, spec.channels))
}
