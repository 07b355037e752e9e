//! Device negotiation
//!
//! Picks a concrete device for each direction: explicit profile choice first,
//! engine default second. The chosen device is validated against the
//! requested capability and paired with its parameters exactly once.

use super::{
    AudioEngine, Device, DeviceCapability, InputDevice, InputParams, NegotiatedDevice,
    OutputDevice, OutputParams,
};
use crate::profile::Profile;
use crate::{ParleyError, Result};
use tracing::{debug, error, warn};

/// Negotiate the capture device and its parameters
pub fn negotiate_input(engine: &dyn AudioEngine, profile: &Profile) -> Result<InputDevice> {
    let base = select_device(engine, profile, DeviceCapability::Input)?;
    let defaults = InputParams::default();
    let params = InputParams {
        sample_rate: profile.get_or(&["audio", "input_samplerate"], defaults.sample_rate),
        bits: profile.get_or(&["audio", "input_samplewidth"], defaults.bits),
        channels: profile.get_or(&["audio", "input_channels"], defaults.channels),
        chunk_size: profile.get_or(&["audio", "input_chunksize"], defaults.chunk_size),
    };

    debug!("Input sample rate: {} Hz", params.sample_rate);
    debug!("Input sample width: {} bit", params.bits);
    debug!("Input channels: {}", params.channels);
    debug!("Input chunksize: {} frames", params.chunk_size);

    Ok(NegotiatedDevice { base, params })
}

/// Negotiate the playback device and its parameters
pub fn negotiate_output(engine: &dyn AudioEngine, profile: &Profile) -> Result<OutputDevice> {
    let base = select_device(engine, profile, DeviceCapability::Output)?;
    let defaults = OutputParams::default();
    let params = OutputParams {
        chunk_size: profile.get_or(&["audio", "output_chunksize"], defaults.chunk_size),
        padding: profile.get_flag(&["audio", "output_padding"], defaults.padding),
    };

    debug!("Output chunksize: {} frames", params.chunk_size);
    debug!("Output padding: {}", if params.padding { "yes" } else { "no" });

    Ok(NegotiatedDevice { base, params })
}

/// Enumerate, select and validate a device for one direction
fn select_device(
    engine: &dyn AudioEngine,
    profile: &Profile,
    capability: DeviceCapability,
) -> Result<Device> {
    let valid: Vec<String> = engine
        .devices(capability)?
        .into_iter()
        .map(|d| d.slug)
        .collect();
    if valid.is_empty() {
        error!("Audio engine reports no {} devices", capability);
        return Err(ParleyError::NoDevices(capability));
    }

    let key = capability.profile_key();
    let slug = match profile.get_str(&["audio", key]) {
        Some(slug) => slug,
        None => {
            let slug = engine.default_device(capability)?.slug;
            warn!(
                "{} not specified in profile, defaulting to '{}' (Possible values: {})",
                key,
                slug,
                valid.join(", ")
            );
            slug
        }
    };

    let resolved = match engine.device(&slug) {
        Ok(device) if device.supports(capability) => Ok(device),
        Ok(device) => Err(ParleyError::UnsupportedCapability {
            slug: device.slug,
            capability,
            available: valid.clone(),
        }),
        Err(ParleyError::DeviceNotFound { slug, .. }) => Err(ParleyError::DeviceNotFound {
            slug,
            available: valid.clone(),
        }),
        Err(e) => Err(e),
    };

    resolved.map_err(|e| {
        error!("{}", e);
        warn!("Valid {} devices: {}", capability, valid.join(", "));
        e
    })
}
