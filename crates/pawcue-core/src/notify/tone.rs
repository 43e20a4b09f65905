use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Something that can emit a short tone.
pub trait ToneOutput {
    fn play_tone(&self, frequency_hz: f32, duration: Duration) -> Result<(), NotifyError>;

    fn unlock(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr. Pitch and length are up to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl ToneOutput for TerminalBell {
    fn play_tone(&self, _frequency_hz: f32, _duration: Duration) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneBackendKind {
    #[default]
    Bell,
    Speaker,
    Silent,
}

/// Tone output selected at runtime from config.
#[derive(Debug, Clone)]
pub enum ToneBackend {
    Bell(TerminalBell),
    #[cfg(feature = "audio")]
    Speaker(super::SpeakerTone),
    Silent,
}

impl ToneBackend {
    pub fn from_kind(kind: ToneBackendKind) -> Self {
        match kind {
            ToneBackendKind::Bell => ToneBackend::Bell(TerminalBell),
            #[cfg(feature = "audio")]
            ToneBackendKind::Speaker => ToneBackend::Speaker(super::SpeakerTone),
            #[cfg(not(feature = "audio"))]
            ToneBackendKind::Speaker => {
                tracing::warn!("built without the `audio` feature, falling back to the terminal bell");
                ToneBackend::Bell(TerminalBell)
            }
            ToneBackendKind::Silent => ToneBackend::Silent,
        }
    }
}

impl ToneOutput for ToneBackend {
    fn play_tone(&self, frequency_hz: f32, duration: Duration) -> Result<(), NotifyError> {
        match self {
            ToneBackend::Bell(bell) => bell.play_tone(frequency_hz, duration),
            #[cfg(feature = "audio")]
            ToneBackend::Speaker(speaker) => speaker.play_tone(frequency_hz, duration),
            ToneBackend::Silent => Ok(()),
        }
    }

    fn unlock(&self) -> Result<(), NotifyError> {
        match self {
            ToneBackend::Bell(bell) => bell.unlock(),
            #[cfg(feature = "audio")]
            ToneBackend::Speaker(speaker) => speaker.unlock(),
            ToneBackend::Silent => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_lowercase() {
        let kind: ToneBackendKind = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(kind, ToneBackendKind::Silent);
        assert_eq!(ToneBackendKind::default(), ToneBackendKind::Bell);
    }

    #[test]
    fn silent_backend_always_succeeds() {
        let backend = ToneBackend::from_kind(ToneBackendKind::Silent);
        assert!(backend.play_tone(880.0, Duration::from_millis(200)).is_ok());
        assert!(backend.unlock().is_ok());
    }
}
