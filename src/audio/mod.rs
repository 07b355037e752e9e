//! Audio devices and engines
//!
//! An [`AudioEngine`] enumerates devices and moves samples in and out of
//! them. Devices are plain values; the negotiator pairs a chosen device with
//! its direction parameters in a [`NegotiatedDevice`].

#[cfg(feature = "audio-io")]
pub mod cpal_engine;
pub mod negotiate;
pub mod null_engine;
pub mod resampler;
pub mod vad;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use cpal_engine::CpalEngine;
pub use negotiate::{negotiate_input, negotiate_output};
pub use null_engine::StaticAudioEngine;
pub use resampler::{resample_audio, AudioResampler};
pub use vad::{SnrVad, VoiceActivityDetector};
pub use wav::{read_wav, read_wav_mono};

use crate::Result;
use std::fmt;

/// Direction a device can be used in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceCapability {
    Input,
    Output,
}

impl DeviceCapability {
    /// Profile key under `[audio]` naming the device for this direction
    pub fn profile_key(&self) -> &'static str {
        match self {
            DeviceCapability::Input => "input_device",
            DeviceCapability::Output => "output_device",
        }
    }
}

impl fmt::Display for DeviceCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCapability::Input => write!(f, "input"),
            DeviceCapability::Output => write!(f, "output"),
        }
    }
}

/// A device as reported by an audio engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub slug: String,
    pub label: String,
    pub capabilities: Vec<DeviceCapability>,
}

impl Device {
    pub fn new(
        slug: impl Into<String>,
        label: impl Into<String>,
        capabilities: &[DeviceCapability],
    ) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            capabilities: capabilities.to_vec(),
        }
    }

    pub fn supports(&self, capability: DeviceCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// One-line description for device listings
    pub fn describe(&self) -> String {
        let caps: Vec<String> = self.capabilities.iter().map(|c| c.to_string()).collect();
        format!("{} ({}) [{}]", self.slug, self.label, caps.join(", "))
    }
}

/// Capture parameters for an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputParams {
    pub sample_rate: u32,
    pub bits: u16,
    pub channels: u16,
    pub chunk_size: usize,
}

impl Default for InputParams {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            bits: 16,
            channels: 1,
            chunk_size: 1024,
        }
    }
}

/// Playback parameters for an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputParams {
    pub chunk_size: usize,
    pub padding: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            padding: false,
        }
    }
}

/// A selected device together with the parameters it will be driven with
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedDevice<P> {
    pub base: Device,
    pub params: P,
}

impl<P> NegotiatedDevice<P> {
    pub fn slug(&self) -> &str {
        &self.base.slug
    }
}

pub type InputDevice = NegotiatedDevice<InputParams>;
pub type OutputDevice = NegotiatedDevice<OutputParams>;

/// Stream of mono capture chunks from an input device
pub trait AudioSource {
    /// Block until the next chunk of `chunk_size` mono frames is available
    fn next_chunk(&mut self) -> Result<Vec<f32>>;
}

/// Device enumeration and I/O backend
pub trait AudioEngine {
    /// Devices supporting `capability`
    fn devices(&self, capability: DeviceCapability) -> Result<Vec<Device>>;

    /// Every device regardless of direction
    fn all_devices(&self) -> Result<Vec<Device>>;

    /// The system default device for `capability`
    fn default_device(&self, capability: DeviceCapability) -> Result<Device>;

    /// Resolve a slug to a device, failing with `DeviceNotFound`
    fn device(&self, slug: &str) -> Result<Device>;

    /// Start capturing from a negotiated input device
    fn open_input(&self, device: &InputDevice) -> Result<Box<dyn AudioSource>>;

    /// Play mono samples on a negotiated output device, blocking until done
    fn play(&self, device: &OutputDevice, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Mix interleaved frames down to mono
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Split mono samples into output chunks, zero-padding the last one when asked
pub fn output_chunks(samples: &[f32], params: &OutputParams) -> Vec<Vec<f32>> {
    let size = params.chunk_size.max(1);
    samples
        .chunks(size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            if params.padding && chunk.len() < size {
                chunk.resize(size, 0.0);
            }
            chunk
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_capabilities() {
        let mic = Device::new("mic0", "USB Microphone", &[DeviceCapability::Input]);
        assert!(mic.supports(DeviceCapability::Input));
        assert!(!mic.supports(DeviceCapability::Output));
        assert_eq!(mic.describe(), "mic0 (USB Microphone) [input]");
    }

    #[test]
    fn test_downmix_stereo() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }

    #[test]
    fn test_output_padding() {
        let samples = vec![0.1f32; 5];
        let unpadded = output_chunks(&samples, &OutputParams { chunk_size: 4, padding: false });
        assert_eq!(unpadded.last().map(Vec::len), Some(1));

        let padded = output_chunks(&samples, &OutputParams { chunk_size: 4, padding: true });
        assert_eq!(padded.len(), 2);
        assert_eq!(padded[1], vec![0.1, 0.0, 0.0, 0.0]);
    }
}
