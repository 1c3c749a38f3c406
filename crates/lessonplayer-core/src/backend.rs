use crate::rate_pitch::RatePlan;
use lessonplayer_ports::media::{
    BackendKind, BasicPlaybackPort, MediaError, MediaProvider, PitchDecoupledPort,
    PositionCallback, PositionSubscription,
};
use lessonplayer_ports::types::{ItemKey, PositionMs, Volume100};
use tracing::{info, warn};

/// The backend set chosen once when the session starts.
pub enum MediaBackend {
    Basic {
        player: Box<dyn BasicPlaybackPort>,
    },
    /// `surface` renders video and reports positions; `audio` owns sound.
    PitchDecoupled {
        surface: Box<dyn BasicPlaybackPort>,
        audio: Box<dyn PitchDecoupledPort>,
    },
}

impl MediaBackend {
    /// Falls back to the basic player when the native backend cannot start.
    pub fn select(
        provider: &dyn MediaProvider,
        preference: BackendKind,
    ) -> Result<Self, MediaError> {
        let surface = provider.open_basic()?;
        if preference == BackendKind::Basic {
            return Ok(MediaBackend::Basic { player: surface });
        }

        match provider.open_pitch_decoupled() {
            Ok(audio) => {
                surface.set_volume(Volume100::MUTED)?;
                info!("pitch-decoupled backend enabled for audio playback");
                Ok(MediaBackend::PitchDecoupled { surface, audio })
            }
            Err(err) => {
                warn!(error = %err, "pitch-decoupled backend unavailable; falling back to basic player");
                Ok(MediaBackend::Basic { player: surface })
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            MediaBackend::Basic { .. } => BackendKind::Basic,
            MediaBackend::PitchDecoupled { .. } => BackendKind::PitchDecoupled,
        }
    }

    fn surface(&self) -> &dyn BasicPlaybackPort {
        match self {
            MediaBackend::Basic { player } => player.as_ref(),
            MediaBackend::PitchDecoupled { surface, .. } => surface.as_ref(),
        }
    }

    pub fn apply_rate_plan(&self, plan: &RatePlan) -> Result<(), MediaError> {
        match (self, *plan) {
            (MediaBackend::Basic { player }, plan) => player.set_playback_rate(plan.rate()),
            (
                MediaBackend::PitchDecoupled { surface, audio },
                RatePlan::Decoupled {
                    rate,
                    pitch_semitones,
                    eq_profile,
                },
            ) => {
                surface.set_playback_rate(rate)?;
                audio.set_rate(rate)?;
                audio.set_pitch_semitones(pitch_semitones)?;
                audio.set_eq_profile(eq_profile)
            }
            (MediaBackend::PitchDecoupled { surface, audio }, RatePlan::Coupled { rate }) => {
                surface.set_playback_rate(rate)?;
                audio.set_rate(rate)
            }
        }
    }

    pub fn load(&self, item: &ItemKey) -> Result<(), MediaError> {
        self.surface().load(item)?;
        if let MediaBackend::PitchDecoupled { audio, .. } = self {
            audio.load(item)?;
        }
        Ok(())
    }

    pub fn play(&self) -> Result<(), MediaError> {
        self.surface().play()?;
        if let MediaBackend::PitchDecoupled { audio, .. } = self {
            audio.play()?;
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<(), MediaError> {
        self.surface().pause()?;
        if let MediaBackend::PitchDecoupled { audio, .. } = self {
            audio.pause()?;
        }
        Ok(())
    }

    pub fn stop(&self) -> Result<(), MediaError> {
        self.surface().stop()?;
        if let MediaBackend::PitchDecoupled { audio, .. } = self {
            audio.stop()?;
        }
        Ok(())
    }

    pub fn seek(&self, position: PositionMs) -> Result<(), MediaError> {
        self.surface().set_position_ms(position)?;
        if let MediaBackend::PitchDecoupled { audio, .. } = self {
            audio.set_position_ms(position)?;
        }
        Ok(())
    }

    pub fn position_ms(&self) -> PositionMs {
        self.surface().position_ms()
    }

    pub fn set_volume(&self, volume: Volume100) -> Result<(), MediaError> {
        match self {
            MediaBackend::Basic { player } => player.set_volume(volume),
            MediaBackend::PitchDecoupled { surface, audio } => {
                surface.set_volume(Volume100::MUTED)?;
                audio.set_volume(volume)
            }
        }
    }

    pub fn subscribe_position(
        &self,
        cb: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, MediaError> {
        self.surface().subscribe_position(cb)
    }
}
