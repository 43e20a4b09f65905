//! Audible and haptic phase-change signals.
//!
//! The reminder engine only sees the [`Notifier`] trait. Concrete delivery
//! (tones, vibration) lives here and never reports failure upward: a missing
//! audio device or vibration motor must not stop a running countdown.

mod tone;
#[cfg(feature = "audio")]
mod speaker;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NotifyError;
use crate::storage::NotificationsConfig;

pub use tone::{TerminalBell, ToneBackend, ToneBackendKind, ToneOutput};
#[cfg(feature = "audio")]
pub use speaker::SpeakerTone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    /// A behavior phase became active.
    Start,
    /// An interval phase became active, or the run finished.
    Stop,
}

impl NotifyKind {
    /// Vibration pattern in milliseconds, alternating on/off.
    pub fn vibration_pattern(self) -> &'static [u64] {
        match self {
            NotifyKind::Start => &[100, 50, 100],
            NotifyKind::Stop => &[200],
        }
    }
}

pub trait Notifier {
    fn notify(&self, kind: NotifyKind);

    /// Prepare outputs that some platforms only open from a user action.
    fn unlock(&self) {}
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _kind: NotifyKind) {}
}

pub trait Vibrator {
    fn vibrate(&self, pattern_ms: &[u64]) -> Result<(), NotifyError>;
}

/// For hosts without a vibration motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVibration;

impl Vibrator for NoVibration {
    fn vibrate(&self, _pattern_ms: &[u64]) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported("vibration"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration: Duration,
}

impl ToneSpec {
    pub const START: ToneSpec = ToneSpec {
        frequency_hz: 880.0,
        duration: Duration::from_millis(200),
    };
    pub const END: ToneSpec = ToneSpec {
        frequency_hz: 440.0,
        duration: Duration::from_millis(300),
    };
}

/// Tone plus vibration per notification: high and short for a start, low and
/// longer for an end.
#[derive(Debug, Clone)]
pub struct SignalNotifier<T, V = NoVibration> {
    tone: T,
    vibrator: V,
    start_tone: ToneSpec,
    end_tone: ToneSpec,
    vibration: bool,
    enabled: bool,
}

impl<T: ToneOutput, V: Vibrator> SignalNotifier<T, V> {
    pub fn new(tone: T, vibrator: V) -> Self {
        Self {
            tone,
            vibrator,
            start_tone: ToneSpec::START,
            end_tone: ToneSpec::END,
            vibration: true,
            enabled: true,
        }
    }

    pub fn with_tones(mut self, start: ToneSpec, end: ToneSpec) -> Self {
        self.start_tone = start;
        self.end_tone = end;
        self
    }

    pub fn tone_for(&self, kind: NotifyKind) -> ToneSpec {
        match kind {
            NotifyKind::Start => self.start_tone,
            NotifyKind::Stop => self.end_tone,
        }
    }
}

impl<V: Vibrator> SignalNotifier<ToneBackend, V> {
    /// Build from the `[notifications]` config section.
    pub fn from_config(config: &NotificationsConfig, vibrator: V) -> Self {
        let mut notifier = Self::new(ToneBackend::from_kind(config.tone_backend), vibrator)
            .with_tones(
                ToneSpec {
                    frequency_hz: config.start_tone_hz,
                    duration: Duration::from_millis(config.start_tone_ms),
                },
                ToneSpec {
                    frequency_hz: config.end_tone_hz,
                    duration: Duration::from_millis(config.end_tone_ms),
                },
            );
        notifier.vibration = config.vibration;
        notifier.enabled = config.enabled;
        notifier
    }
}

impl<T: ToneOutput, V: Vibrator> Notifier for SignalNotifier<T, V> {
    fn notify(&self, kind: NotifyKind) {
        if !self.enabled {
            return;
        }
        let spec = self.tone_for(kind);
        if let Err(e) = self.tone.play_tone(spec.frequency_hz, spec.duration) {
            debug!(?kind, error = %e, "tone not delivered");
        }
        if self.vibration {
            if let Err(e) = self.vibrator.vibrate(kind.vibration_pattern()) {
                debug!(?kind, error = %e, "vibration not delivered");
            }
        }
    }

    fn unlock(&self) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.tone.unlock() {
            debug!(error = %e, "audio output could not be unlocked");
        }
    }
}
