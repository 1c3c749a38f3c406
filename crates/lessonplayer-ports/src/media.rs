use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Single player; speed and pitch share one playback rate.
    Basic,
    /// Native backend with independent rate, pitch and equalizer.
    PitchDecoupled,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Basic => "Basic",
            BackendKind::PitchDecoupled => "Decoupled",
        }
    }
}

/// Named equalizer presets understood by the pitch-decoupled backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EqProfile {
    LowSpeedClarity,
}

impl EqProfile {
    pub fn name(self) -> &'static str {
        match self {
            EqProfile::LowSpeedClarity => "low_speed_clarity",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("media not found: {0}")]
    MediaNotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Position subscription handle: close (or drop) unsubscribes.
pub trait PositionSubscription: Send {
    fn close(self: Box<Self>);
}

pub type PositionCallback = Arc<dyn Fn(PositionMs) + Send + Sync + 'static>;

/// The basic player. In pitch-decoupled mode it is kept as the video surface
/// and stays the source of position updates.
pub trait BasicPlaybackPort: Send {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError>;

    fn play(&self) -> Result<(), MediaError>;
    fn pause(&self) -> Result<(), MediaError>;
    fn stop(&self) -> Result<(), MediaError>;

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError>;
    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError>;
    fn position_ms(&self) -> PositionMs;
    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError>;

    /// Implementations may invoke cb from any thread.
    fn subscribe_position(
        &self,
        cb: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, MediaError>;
}

pub trait PitchDecoupledPort: Send {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError>;

    fn play(&self) -> Result<(), MediaError>;
    fn pause(&self) -> Result<(), MediaError>;
    fn stop(&self) -> Result<(), MediaError>;

    fn set_rate(&self, rate: f64) -> Result<(), MediaError>;
    fn set_pitch_semitones(&self, semitones: i32) -> Result<(), MediaError>;
    fn set_eq_profile(&self, profile: Option<EqProfile>) -> Result<(), MediaError>;
    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError>;
    fn position_ms(&self) -> PositionMs;
    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError>;
}

pub trait MediaProvider: Send + Sync {
    fn open_basic(&self) -> Result<Box<dyn BasicPlaybackPort>, MediaError>;

    /// Fails with `MediaError::Unavailable` when the native backend cannot start.
    fn open_pitch_decoupled(&self) -> Result<Box<dyn PitchDecoupledPort>, MediaError>;

    fn probe_pitch_decoupled(&self) -> bool {
        self.open_pitch_decoupled().is_ok()
    }
}
