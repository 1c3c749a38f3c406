use crate::loop_ab::LoopAb;
use crate::rate_pitch::{RateInput, RatePlan};
use lessonplayer_ports::media::BackendKind;
use lessonplayer_ports::storage::SettingsDto;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPEED: f64 = 1.0;
pub const MIN_SPEED_PERCENT: u32 = 50;
pub const MAX_SPEED_PERCENT: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    Stopped,
    CountingIn,
    Playing,
    Paused,
}

/// Backend selection and feature flags, fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub backend_preference: BackendKind,
    pub low_speed_eq_enabled: bool,
    pub count_in_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_preference: BackendKind::PitchDecoupled,
            low_speed_eq_enabled: false,
            count_in_enabled: false,
        }
    }
}

impl From<&SettingsDto> for SessionConfig {
    fn from(settings: &SettingsDto) -> Self {
        Self {
            backend_preference: if settings.use_pitch_decoupled_backend {
                BackendKind::PitchDecoupled
            } else {
                BackendKind::Basic
            },
            low_speed_eq_enabled: settings.low_speed_eq_enabled,
            count_in_enabled: settings.count_in_enabled,
        }
    }
}

/// Per-item playback state. Not persisted; a fresh one is built for every
/// opened item and only a saved practice preset carries values over.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_speed: f64,
    pub transpose_steps: i32,
    pub loop_ab: LoopAb,
    pub backend_kind: BackendKind,
    pub eq_profile_active: bool,
}

impl PlaybackState {
    pub fn new(backend_kind: BackendKind) -> Self {
        Self {
            current_speed: DEFAULT_SPEED,
            transpose_steps: 0,
            loop_ab: LoopAb::new(),
            backend_kind,
            eq_profile_active: false,
        }
    }

    pub fn rate_input(&self, low_speed_eq_enabled: bool) -> RateInput {
        RateInput {
            speed: self.current_speed,
            transpose_steps: self.transpose_steps,
            backend_kind: self.backend_kind,
            low_speed_eq_enabled,
        }
    }

    pub(crate) fn record_plan(&mut self, plan: &RatePlan) {
        self.eq_profile_active = plan.eq_profile_active();
    }
}
