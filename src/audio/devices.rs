use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, Device, Host, StreamConfig};

use crate::config::BUFFER_SIZE;
use crate::error::{Error, Result};

/// Names of every available input device, in enumeration order.
pub fn list_input_devices(host: &Host) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for device in host.input_devices()? {
        match device.name() {
            Ok(name) => names.push(name),
            Err(err) => log::warn!("skipping unnamed input device: {}", err),
        }
    }

    Ok(names)
}

/// Index of the host's default input device within `names`, if present.
pub fn default_input_index(host: &Host, names: &[String]) -> Option<usize> {
    let default = host.default_input_device()?;
    let default_name = default.name().ok()?;

    names.iter().position(|name| name == &default_name)
}

pub fn get_input_device(host: &Host, names: &[String], index: usize) -> Result<Device> {
    let device_name = names
        .get(index)
        .ok_or_else(|| Error::InvalidInput(format!("no input device at index {}", index)))?;

    for device in host.input_devices()? {
        if let Ok(name) = device.name() {
            if &name == device_name {
                return Ok(device);
            }
        }
    }

    Err(Error::InvalidInput(format!(
        "input device \"{}\" is no longer available",
        device_name
    )))
}

pub fn create_stream_config(channels: u16, sample_rate: cpal::SampleRate) -> StreamConfig {
    StreamConfig {
        channels,
        sample_rate,
        buffer_size: BufferSize::Fixed(BUFFER_SIZE as u32),
    }
}
