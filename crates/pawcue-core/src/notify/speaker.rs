//! Sine tones through the default output device via cpal.
//!
//! The device is opened once per process, on first use, and shared by every
//! [`SpeakerTone`]. Each tone plays on its own short-lived thread so the
//! caller never waits for audio.

use std::f32::consts::TAU;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info};

use super::ToneOutput;
use crate::error::NotifyError;

const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

struct OutputDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

static OUTPUT: OnceLock<Mutex<Option<OutputDevice>>> = OnceLock::new();

/// Handle to the process-wide speaker output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeakerTone;

impl ToneOutput for SpeakerTone {
    fn play_tone(&self, frequency_hz: f32, duration: Duration) -> Result<(), NotifyError> {
        let (device, config) = shared_output()?;
        std::thread::spawn(move || {
            if let Err(e) = play_blocking(&device, &config, frequency_hz, duration) {
                debug!(error = %e, "tone playback failed");
            }
        });
        Ok(())
    }

    fn unlock(&self) -> Result<(), NotifyError> {
        shared_output().map(|_| ())
    }
}

fn shared_output() -> Result<(cpal::Device, cpal::StreamConfig), NotifyError> {
    let slot = OUTPUT.get_or_init(|| Mutex::new(None));
    let mut guard = slot
        .lock()
        .map_err(|_| NotifyError::Audio("audio handle lock poisoned".into()))?;

    if let Some(out) = guard.as_ref() {
        return Ok((out.device.clone(), out.config.clone()));
    }

    let out = open_output()?;
    let handle = (out.device.clone(), out.config.clone());
    *guard = Some(out);
    Ok(handle)
}

fn open_output() -> Result<OutputDevice, NotifyError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| NotifyError::Audio("no default output device".into()))?;

    let supported = device
        .default_output_config()
        .map_err(|e| NotifyError::Audio(format!("no default output config: {e}")))?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(NotifyError::Audio(format!(
            "tone output requires f32 samples (got {:?})",
            supported.sample_format()
        )));
    }

    let config: cpal::StreamConfig = supported.into();
    info!(sample_rate = config.sample_rate, channels = config.channels, "opened audio output");
    Ok(OutputDevice { device, config })
}

fn play_blocking(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frequency_hz: f32,
    duration: Duration,
) -> Result<(), NotifyError> {
    let rate = config.sample_rate as f32;
    let channels = usize::from(config.channels).max(1);
    let length = duration.as_secs_f32();
    let total_frames = (rate * length) as u64;
    let mut frame: u64 = 0;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                for out in data.chunks_mut(channels) {
                    let value = if frame < total_frames {
                        let t = frame as f32 / rate;
                        // Exponential fade so the tone ends without a click.
                        let gain = START_GAIN * (END_GAIN / START_GAIN).powf(t / length);
                        gain * (TAU * frequency_hz * t).sin()
                    } else {
                        0.0
                    };
                    out.fill(value);
                    frame += 1;
                }
            },
            move |err| {
                debug!("tone output stream error: {err}");
            },
            None,
        )
        .map_err(|e| NotifyError::Audio(format!("failed to build output stream: {e}")))?;

    stream
        .play()
        .map_err(|e| NotifyError::Audio(format!("failed to start output stream: {e}")))?;
    std::thread::sleep(duration + Duration::from_millis(50));
    drop(stream);
    Ok(())
}
