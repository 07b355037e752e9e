use super::InputDevice;
use crate::profile::Profile;
use crate::Result;
use tracing::info;

/// Voice activity detection over capture chunks
pub trait VoiceActivityDetector {
    /// Whether the mono chunk contains speech
    fn is_speech(&mut self, chunk: &[f32]) -> Result<bool>;

    /// Forget any adaptive state
    fn reset(&mut self);
}

/// Signal-to-noise ratio detector
///
/// Tracks the background level from non-speech chunks and flags a chunk as
/// speech when its level exceeds the background by `threshold_db`.
pub struct SnrVad {
    threshold_db: f32,
    initial_noise: f32,
    noise_floor: f32,
    adapt_rate: f32,
}

impl SnrVad {
    pub fn new(threshold_db: f32, noise_floor: f32) -> Self {
        let noise_floor = noise_floor.max(1e-6);
        Self {
            threshold_db,
            initial_noise: noise_floor,
            noise_floor,
            adapt_rate: 0.1,
        }
    }

    pub fn from_profile(input: &InputDevice, profile: &Profile) -> Self {
        let threshold_db = profile.get_or(&["snr_vad", "threshold"], 15.0f32);
        let noise_floor = profile.get_or(&["snr_vad", "noise_floor"], 0.01f32);
        info!(
            "SNR VAD on '{}': threshold {} dB, initial noise floor {}",
            input.slug(),
            threshold_db,
            noise_floor
        );
        Self::new(threshold_db, noise_floor)
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }
}

fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt()
}

impl VoiceActivityDetector for SnrVad {
    fn is_speech(&mut self, chunk: &[f32]) -> Result<bool> {
        let level = rms(chunk);
        if level <= f32::EPSILON {
            return Ok(false);
        }
        let snr = 20.0 * (level / self.noise_floor).log10();
        let speech = snr > self.threshold_db;
        if !speech {
            self.noise_floor =
                (self.noise_floor * (1.0 - self.adapt_rate) + level * self.adapt_rate).max(1e-6);
        }
        Ok(speech)
    }

    fn reset(&mut self) {
        self.noise_floor = self.initial_noise;
    }
}

#[cfg(feature = "silero")]
pub use silero::SileroVad;

#[cfg(feature = "silero")]
mod silero {
    use super::VoiceActivityDetector;
    use crate::{ParleyError, Result};
    use tracing::info;
    use voice_activity_detector::VoiceActivityDetector as Detector;

    /// Voice Activity Detection using Silero VAD
    pub struct SileroVad {
        detector: Detector,
        threshold: f32,
    }

    impl SileroVad {
        /// # Arguments
        /// * `sample_rate` - Sample rate of the audio (8000 or 16000)
        /// * `threshold` - Probability threshold for speech detection (0.0-1.0)
        pub fn new(sample_rate: u32, threshold: f32) -> Result<Self> {
            let chunk_size: usize = match sample_rate {
                8000 => 256,
                16000 => 512,
                _ => {
                    return Err(ParleyError::AudioProcessing(format!(
                        "Invalid sample rate: {}. Must be 8000 or 16000",
                        sample_rate
                    )))
                }
            };

            let detector = Detector::builder()
                .sample_rate(sample_rate as i32)
                .chunk_size(chunk_size)
                .build()
                .map_err(|e| {
                    ParleyError::AudioProcessing(format!("Failed to create VAD: {:?}", e))
                })?;

            info!("Initialized Silero VAD with sample rate: {}, threshold: {}", sample_rate, threshold);

            Ok(Self {
                detector,
                threshold: threshold.clamp(0.0, 1.0),
            })
        }
    }

    impl VoiceActivityDetector for SileroVad {
        fn is_speech(&mut self, chunk: &[f32]) -> Result<bool> {
            Ok(self.detector.predict(chunk.iter().copied()) >= self.threshold)
        }

        fn reset(&mut self) {
            self.detector.reset();
        }
    }
}
