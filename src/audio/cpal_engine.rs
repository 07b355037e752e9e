use super::{
    downmix, output_chunks, resample_audio, AudioEngine, AudioSource, Device, DeviceCapability,
    InputDevice, OutputDevice,
};
use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Audio engine backed by the platform's default cpal host
pub struct CpalEngine {
    host: cpal::Host,
}

impl CpalEngine {
    pub fn new() -> Self {
        let host = cpal::default_host();
        info!("Using audio host: {:?}", host.id());
        Self { host }
    }

    fn describe(device: &cpal::Device) -> Option<Device> {
        let name = device.name().ok()?;
        let mut capabilities = Vec::new();
        if device
            .supported_input_configs()
            .map(|mut c| c.next().is_some())
            .unwrap_or(false)
        {
            capabilities.push(DeviceCapability::Input);
        }
        if device
            .supported_output_configs()
            .map(|mut c| c.next().is_some())
            .unwrap_or(false)
        {
            capabilities.push(DeviceCapability::Output);
        }
        Some(Device::new(slugify(&name), name, &capabilities))
    }

    fn find(&self, slug: &str) -> Result<cpal::Device> {
        let devices = self
            .host
            .devices()
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to list devices: {}", e)))?;
        for device in devices {
            if device.name().map(|n| slugify(&n) == slug).unwrap_or(false) {
                return Ok(device);
            }
        }
        Err(ParleyError::DeviceNotFound {
            slug: slug.to_string(),
            available: Vec::new(),
        })
    }
}

impl Default for CpalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for CpalEngine {
    fn devices(&self, capability: DeviceCapability) -> Result<Vec<Device>> {
        Ok(self
            .all_devices()?
            .into_iter()
            .filter(|d| d.supports(capability))
            .collect())
    }

    fn all_devices(&self) -> Result<Vec<Device>> {
        let devices = self
            .host
            .devices()
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to list devices: {}", e)))?;
        Ok(devices.filter_map(|d| Self::describe(&d)).collect())
    }

    fn default_device(&self, capability: DeviceCapability) -> Result<Device> {
        let device = match capability {
            DeviceCapability::Input => self.host.default_input_device(),
            DeviceCapability::Output => self.host.default_output_device(),
        };
        device
            .as_ref()
            .and_then(Self::describe)
            .ok_or(ParleyError::NoDevices(capability))
    }

    fn device(&self, slug: &str) -> Result<Device> {
        let device = self.find(slug)?;
        Self::describe(&device).ok_or_else(|| {
            ParleyError::AudioDevice(format!("Device '{}' disappeared", slug))
        })
    }

    fn open_input(&self, device: &InputDevice) -> Result<Box<dyn AudioSource>> {
        let handle = self.find(device.slug())?;
        let params = device.params;
        let config = StreamConfig {
            channels: params.channels,
            sample_rate: SampleRate(params.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (tx, rx) = bounded::<Vec<f32>>(64);
        let err_fn = |err| error!("Audio input stream error: {}", err);

        let stream = if params.bits == 16 {
            handle.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples = data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    if let Err(e) = tx.try_send(samples) {
                        debug!("Dropping capture data: {}", e);
                    }
                },
                err_fn,
                None,
            )
        } else {
            handle.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Err(e) = tx.try_send(data.to_vec()) {
                        debug!("Dropping capture data: {}", e);
                    }
                },
                err_fn,
                None,
            )
        }
        .map_err(|e| ParleyError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

        info!("Started capture on '{}'", device.slug());
        Ok(Box::new(CpalCapture {
            _stream: stream,
            rx,
            pending: Vec::new(),
            channels: params.channels as usize,
            chunk_size: params.chunk_size,
        }))
    }

    fn play(&self, device: &OutputDevice, samples: &[f32], sample_rate: u32) -> Result<()> {
        let handle = self.find(device.slug())?;
        let supported = handle
            .default_output_config()
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to get output config: {}", e)))?;
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;

        let samples = resample_audio(samples, sample_rate, config.sample_rate.0)?;
        let queue: VecDeque<f32> = output_chunks(&samples, &device.params)
            .into_iter()
            .flatten()
            .collect();
        let queue = Arc::new(Mutex::new(queue));
        let feed = Arc::clone(&queue);

        let stream = handle
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut buf = feed.lock();
                    for frame in data.chunks_mut(channels) {
                        let sample = buf.pop_front().unwrap_or(0.0);
                        frame.fill(sample);
                    }
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ParleyError::AudioDevice(format!("Failed to start output stream: {}", e)))?;

        while !queue.lock().is_empty() {
            std::thread::sleep(Duration::from_millis(10));
        }
        // Let the device drain its own buffer
        std::thread::sleep(Duration::from_millis(100));
        Ok(())
    }
}

struct CpalCapture {
    _stream: Stream,
    rx: Receiver<Vec<f32>>,
    pending: Vec<f32>,
    channels: usize,
    chunk_size: usize,
}

impl AudioSource for CpalCapture {
    fn next_chunk(&mut self) -> Result<Vec<f32>> {
        let needed = self.chunk_size * self.channels.max(1);
        while self.pending.len() < needed {
            let data = self
                .rx
                .recv_timeout(CAPTURE_TIMEOUT)
                .map_err(|e| ParleyError::Channel(format!("Capture stalled: {}", e)))?;
            self.pending.extend_from_slice(&data);
        }
        let chunk: Vec<f32> = self.pending.drain(..needed).collect();
        Ok(downmix(&chunk, self.channels))
    }
}

/// Stable device slug derived from its display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("HDA Intel PCH: ALC3246 Analog (hw:0,0)"), "hda-intel-pch-alc3246-analog-hw-0-0");
        assert_eq!(slugify("default"), "default");
    }

    #[test]
    fn test_enumeration() {
        // Might find nothing in CI environments without audio devices
        let engine = CpalEngine::new();
        if let Ok(devices) = engine.devices(DeviceCapability::Input) {
            for device in devices {
                assert!(device.supports(DeviceCapability::Input));
                assert!(!device.slug.is_empty());
            }
        }
    }
}
