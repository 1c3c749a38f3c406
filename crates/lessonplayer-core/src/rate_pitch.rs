use lessonplayer_ports::media::{BackendKind, EqProfile};

/// Equal-tempered semitone ratio, 2^(1/12).
pub const SEMITONE_RATIO: f64 = 1.059_463_094_359_295_3;

/// Speeds strictly below this get the clarity equalizer when enabled.
pub const LOW_SPEED_EQ_THRESHOLD: f64 = 0.75;

pub fn pitch_factor(steps: i32) -> f64 {
    SEMITONE_RATIO.powi(steps)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateInput {
    pub speed: f64,
    pub transpose_steps: i32,
    pub backend_kind: BackendKind,
    pub low_speed_eq_enabled: bool,
}

/// Concrete values to push to the active backend(s).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RatePlan {
    /// One rate carries both speed and transposition.
    Coupled { rate: f64 },
    /// `rate` goes to the video surface and the audio backend; pitch and
    /// equalizer go to the audio backend only. `None` clears the equalizer.
    Decoupled {
        rate: f64,
        pitch_semitones: i32,
        eq_profile: Option<EqProfile>,
    },
}

impl RatePlan {
    pub fn rate(&self) -> f64 {
        match *self {
            RatePlan::Coupled { rate } | RatePlan::Decoupled { rate, .. } => rate,
        }
    }

    pub fn eq_profile_active(&self) -> bool {
        matches!(
            self,
            RatePlan::Decoupled {
                eq_profile: Some(_),
                ..
            }
        )
    }
}

/// Ranges are not validated here; the controls feeding this are already clamped.
pub fn resolve(input: RateInput) -> RatePlan {
    match input.backend_kind {
        BackendKind::Basic => RatePlan::Coupled {
            rate: input.speed * pitch_factor(input.transpose_steps),
        },
        BackendKind::PitchDecoupled => {
            let eq_profile = if input.low_speed_eq_enabled && input.speed < LOW_SPEED_EQ_THRESHOLD {
                Some(EqProfile::LowSpeedClarity)
            } else {
                None
            };
            RatePlan::Decoupled {
                rate: input.speed,
                pitch_semitones: input.transpose_steps,
                eq_profile,
            }
        }
    }
}
