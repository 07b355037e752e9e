//! Fixed-device audio engine
//!
//! Backs the `null` audio engine plugin: devices come from a fixed list,
//! capture yields a scripted sequence of chunks (or silence paced like a real
//! device) and playback is recorded instead of reaching hardware.

use super::{
    AudioEngine, AudioSource, Device, DeviceCapability, InputDevice, OutputDevice,
};
use crate::{ParleyError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

pub struct StaticAudioEngine {
    devices: Vec<Device>,
    default_input: Option<String>,
    default_output: Option<String>,
    capture: Option<Vec<Vec<f32>>>,
    played: Arc<Mutex<Vec<f32>>>,
}

impl StaticAudioEngine {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            default_input: None,
            default_output: None,
            capture: None,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A single full-duplex `null` device
    pub fn null() -> Self {
        Self::new(vec![Device::new(
            "null",
            "Null device",
            &[DeviceCapability::Input, DeviceCapability::Output],
        )])
    }

    pub fn with_defaults(mut self, input: &str, output: &str) -> Self {
        self.default_input = Some(input.to_string());
        self.default_output = Some(output.to_string());
        self
    }

    /// Chunks handed out by every capture, in order; capture fails once drained
    pub fn with_capture(mut self, chunks: Vec<Vec<f32>>) -> Self {
        self.capture = Some(chunks);
        self
    }

    /// Handle to everything played so far
    pub fn played(&self) -> Arc<Mutex<Vec<f32>>> {
        Arc::clone(&self.played)
    }
}

impl AudioEngine for StaticAudioEngine {
    fn devices(&self, capability: DeviceCapability) -> Result<Vec<Device>> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.supports(capability))
            .cloned()
            .collect())
    }

    fn all_devices(&self) -> Result<Vec<Device>> {
        Ok(self.devices.clone())
    }

    fn default_device(&self, capability: DeviceCapability) -> Result<Device> {
        let configured = match capability {
            DeviceCapability::Input => self.default_input.as_deref(),
            DeviceCapability::Output => self.default_output.as_deref(),
        };
        match configured {
            Some(slug) => self.device(slug),
            None => self
                .devices
                .iter()
                .find(|d| d.supports(capability))
                .cloned()
                .ok_or(ParleyError::NoDevices(capability)),
        }
    }

    fn device(&self, slug: &str) -> Result<Device> {
        self.devices
            .iter()
            .find(|d| d.slug == slug)
            .cloned()
            .ok_or_else(|| ParleyError::DeviceNotFound {
                slug: slug.to_string(),
                available: self.devices.iter().map(|d| d.slug.clone()).collect(),
            })
    }

    fn open_input(&self, device: &InputDevice) -> Result<Box<dyn AudioSource>> {
        debug!("Opening capture on '{}'", device.slug());
        let rate = device.params.sample_rate.max(1);
        Ok(Box::new(StaticSource {
            chunks: self.capture.clone().map(VecDeque::from),
            chunk_size: device.params.chunk_size,
            chunk_duration: Duration::from_secs_f64(device.params.chunk_size as f64 / rate as f64),
        }))
    }

    fn play(&self, device: &OutputDevice, samples: &[f32], sample_rate: u32) -> Result<()> {
        debug!(
            "Discarding {} samples at {} Hz on '{}'",
            samples.len(),
            sample_rate,
            device.slug()
        );
        self.played.lock().extend_from_slice(samples);
        Ok(())
    }
}

struct StaticSource {
    chunks: Option<VecDeque<Vec<f32>>>,
    chunk_size: usize,
    chunk_duration: Duration,
}

impl AudioSource for StaticSource {
    fn next_chunk(&mut self) -> Result<Vec<f32>> {
        match &mut self.chunks {
            None => {
                thread::sleep(self.chunk_duration);
                Ok(vec![0.0; self.chunk_size])
            }
            Some(chunks) => chunks
                .pop_front()
                .ok_or_else(|| ParleyError::Channel("Capture ended".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{InputParams, NegotiatedDevice, OutputParams};

    #[test]
    fn test_defaults_fall_back_to_first_capable_device() {
        let engine = StaticAudioEngine::new(vec![
            Device::new("spk0", "Speakers", &[DeviceCapability::Output]),
            Device::new("mic0", "Microphone", &[DeviceCapability::Input]),
        ]);
        assert_eq!(engine.default_device(DeviceCapability::Input).unwrap().slug, "mic0");
        assert_eq!(engine.default_device(DeviceCapability::Output).unwrap().slug, "spk0");
    }

    #[test]
    fn test_scripted_capture_then_end() {
        let engine = StaticAudioEngine::null().with_capture(vec![vec![0.5; 4]]);
        let input = NegotiatedDevice {
            base: engine.device("null").unwrap(),
            params: InputParams::default(),
        };
        let mut source = engine.open_input(&input).unwrap();
        assert_eq!(source.next_chunk().unwrap(), vec![0.5; 4]);
        assert!(source.next_chunk().is_err());
    }

    #[test]
    fn test_playback_is_recorded() {
        let engine = StaticAudioEngine::null();
        let output = NegotiatedDevice {
            base: engine.device("null").unwrap(),
            params: OutputParams::default(),
        };
        engine.play(&output, &[0.1, 0.2], 16000).unwrap();
        assert_eq!(*engine.played().lock(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_silence_arrives_in_real_time() {
        let engine = StaticAudioEngine::null();
        let input = NegotiatedDevice {
            base: engine.device("null").unwrap(),
            params: InputParams {
                chunk_size: 160,
                ..InputParams::default()
            },
        };
        let mut source = engine.open_input(&input).unwrap();
        let started = std::time::Instant::now();
        for _ in 0..5 {
            assert_eq!(source.next_chunk().unwrap(), vec![0.0; 160]);
        }
        // Five 10 ms chunks at 16 kHz
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
