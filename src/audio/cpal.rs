// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, fmt, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use tracing::{error, info, span, warn, Level};

use crate::audio::mixer::AudioMixer;
use crate::audio::Output as AudioOutput;

/// Device name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("no output device found with name {0}")]
    NoDevice(String),

    #[error("device {device} does not support {sample_rate}Hz output")]
    UnsupportedRate { device: String, sample_rate: u32 },

    #[error("output stream error: {0}")]
    Stream(String),
}

/// A running cpal output stream that pulls from an [`AudioMixer`].
///
/// cpal streams are not `Send` on every platform, so the stream lives on its
/// own thread for as long as this value does.
pub struct Device {
    /// The name of the device.
    name: String,
    /// Dropping (or sending on) this stops the output thread.
    shutdown_tx: Option<Sender<()>>,
    /// Handle to the output thread (keeps the stream alive).
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cpal)", self.name)
    }
}

impl Device {
    /// Opens the named device and starts streaming the mixer to it.
    /// `buffer_target` is the requested device buffer duration.
    pub fn start(
        mixer: AudioMixer,
        device_name: &str,
        buffer_target: Duration,
    ) -> Result<Device, OutputError> {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<String, OutputError>>(1);
        let device_name = device_name.to_string();

        let output_thread = thread::spawn(move || {
            let span = span!(Level::INFO, "audio output (cpal)");
            let _enter = span.enter();

            let stream = match open_stream(mixer, &device_name, buffer_target) {
                Ok((name, stream)) => {
                    let _ = ready_tx.send(Ok(name));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Keep the stream alive until shutdown is requested or the
            // sender is dropped.
            let _ = shutdown_rx.recv();
            drop(stream);
            info!("CPAL output stream stopped");
        });

        let name = match ready_rx.recv() {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                let _ = output_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = output_thread.join();
                return Err(OutputError::Stream(
                    "output thread exited before the stream started".to_string(),
                ));
            }
        };

        Ok(Device {
            name,
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }

    /// Lists the names of all output devices known to cpal.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut names = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                if let Ok(name) = device.name() {
                    names.push(name);
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }
}

impl AudioOutput for Device {
    fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.try_send(());
        }
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Finds a device by name across all hosts. "default" selects the default
/// host's default output device.
fn find_device(name: &str) -> Result<cpal::Device, OutputError> {
    if name == DEFAULT_DEVICE {
        return cpal::default_host()
            .default_output_device()
            .ok_or_else(|| OutputError::NoDevice(name.to_string()));
    }

    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else {
            continue;
        };
        let Ok(devices) = host.output_devices() else {
            continue;
        };
        for device in devices {
            if device.name().is_ok_and(|n| n.trim() == name) {
                return Ok(device);
            }
        }
    }

    Err(OutputError::NoDevice(name.to_string()))
}

/// Opens the device, picks a stream configuration at the mixer's sample rate
/// and starts playing. Returns the device name with the stream.
fn open_stream(
    mixer: AudioMixer,
    device_name: &str,
    buffer_target: Duration,
) -> Result<(String, cpal::Stream), OutputError> {
    let device = find_device(device_name)?;
    let name = device.name().unwrap_or_else(|_| device_name.to_string());
    let sample_rate = cpal::SampleRate(mixer.sample_rate());

    let supported = device
        .supported_output_configs()
        .map_err(|e| OutputError::Stream(e.to_string()))?
        .filter(|range| {
            range.min_sample_rate() <= sample_rate && range.max_sample_rate() >= sample_rate
        })
        .min_by_key(|range| format_preference(range.sample_format()))
        .ok_or_else(|| OutputError::UnsupportedRate {
            device: name.clone(),
            sample_rate: sample_rate.0,
        })?
        .with_sample_rate(sample_rate);

    let mut config = supported.config();
    let target_frames = (buffer_target.as_secs_f64() * sample_rate.0 as f64) as u32;
    config.buffer_size = match supported.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } if target_frames > 0 => {
            cpal::BufferSize::Fixed(target_frames.clamp(*min, *max))
        }
        _ => cpal::BufferSize::Default,
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer),
        other => {
            return Err(OutputError::Stream(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| OutputError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| OutputError::Stream(e.to_string()))?;

    info!(
        device = name,
        sample_rate = sample_rate.0,
        channels = config.channels,
        buffer = ?config.buffer_size,
        "CPAL output stream started successfully"
    );
    Ok((name, stream))
}

/// Lower is better.
fn format_preference(format: cpal::SampleFormat) -> u8 {
    match format {
        cpal::SampleFormat::F32 => 0,
        cpal::SampleFormat::I16 => 1,
        cpal::SampleFormat::I32 => 2,
        cpal::SampleFormat::U16 => 3,
        _ => u8::MAX,
    }
}

/// Builds an output stream that renders the mono mix and copies it to every
/// device channel.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: AudioMixer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let initial_frames = match config.buffer_size {
        cpal::BufferSize::Fixed(frames) => frames as usize,
        cpal::BufferSize::Default => 4096,
    };
    let mut mono = vec![0.0f32; initial_frames];

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            if mono.len() < frames {
                warn!(
                    frames,
                    "Output callback larger than expected, growing mix buffer"
                );
                mono.resize(frames, 0.0);
            }

            mixer.render(&mut mono[..frames]);

            for (frame, sample) in data.chunks_mut(channels).zip(mono.iter()) {
                frame.fill(T::from_sample(*sample));
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}
