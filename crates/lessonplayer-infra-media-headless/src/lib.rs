use lessonplayer_ports::media::{
    BasicPlaybackPort, EqProfile, MediaError, MediaProvider, PitchDecoupledPort, PositionCallback,
    PositionSubscription,
};
use lessonplayer_ports::types::{ItemKey, PositionMs, Volume100};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Media backend without audio output. Both players run on a simulated clock
/// that only moves when [`HeadlessMediaProvider::advance`] is called.
#[derive(Clone)]
pub struct HeadlessMediaProvider {
    hub: Arc<Mutex<Hub>>,
    decoupled_available: bool,
    require_files: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub item: Option<ItemKey>,
    pub playing: bool,
    pub position_ms: PositionMs,
    pub rate: f64,
    pub volume: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessSnapshot {
    pub surface: PlayerSnapshot,
    /// `None` until the pitch-decoupled player has been opened.
    pub audio: Option<PlayerSnapshot>,
    pub pitch_semitones: i32,
    pub eq_profile: Option<EqProfile>,
}

#[derive(Debug)]
struct Player {
    item: Option<ItemKey>,
    playing: bool,
    position: f64,
    rate: f64,
    volume: Volume100,
}

impl Player {
    fn new() -> Self {
        Self {
            item: None,
            playing: false,
            position: 0.0,
            rate: 1.0,
            volume: Volume100::default(),
        }
    }

    fn position_ms(&self) -> PositionMs {
        self.position.max(0.0) as PositionMs
    }

    fn tick(&mut self, elapsed_ms: u64) {
        if self.playing && self.item.is_some() {
            self.position += elapsed_ms as f64 * self.rate;
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            item: self.item.clone(),
            playing: self.playing,
            position_ms: self.position_ms(),
            rate: self.rate,
            volume: self.volume.get(),
        }
    }
}

struct Hub {
    surface: Player,
    audio: Option<Player>,
    pitch_semitones: i32,
    eq_profile: Option<EqProfile>,
    subscribers: Vec<(u64, PositionCallback)>,
    next_subscriber: u64,
}

impl HeadlessMediaProvider {
    pub fn new(decoupled_available: bool) -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub {
                surface: Player::new(),
                audio: None,
                pitch_semitones: 0,
                eq_profile: None,
                subscribers: Vec::new(),
                next_subscriber: 0,
            })),
            decoupled_available,
            require_files: true,
        }
    }

    /// When false, `load` accepts any non-blank key instead of an existing file.
    pub fn require_files(mut self, require: bool) -> Self {
        self.require_files = require;
        self
    }

    /// Moves the simulated clock and notifies position subscribers with the
    /// surface position, as a player's progress timer would.
    pub fn advance(&self, elapsed_ms: u64) {
        let (position, callbacks) = {
            let mut hub = self.hub.lock();
            hub.surface.tick(elapsed_ms);
            if let Some(audio) = hub.audio.as_mut() {
                audio.tick(elapsed_ms);
            }
            if hub.surface.item.is_none() {
                return;
            }
            let callbacks: Vec<PositionCallback> =
                hub.subscribers.iter().map(|(_, cb)| cb.clone()).collect();
            (hub.surface.position_ms(), callbacks)
        };
        trace!(position, "headless position tick");
        for cb in callbacks {
            cb(position);
        }
    }

    pub fn snapshot(&self) -> HeadlessSnapshot {
        let hub = self.hub.lock();
        HeadlessSnapshot {
            surface: hub.surface.snapshot(),
            audio: hub.audio.as_ref().map(Player::snapshot),
            pitch_semitones: hub.pitch_semitones,
            eq_profile: hub.eq_profile,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.lock().subscribers.len()
    }

    fn check_item(&self, item: &ItemKey) -> Result<(), MediaError> {
        if item.is_blank() {
            return Err(MediaError::MediaNotFound(item.to_string()));
        }
        if self.require_files && !Path::new(item.as_str()).is_file() {
            return Err(MediaError::MediaNotFound(item.to_string()));
        }
        Ok(())
    }
}

impl Default for HeadlessMediaProvider {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MediaProvider for HeadlessMediaProvider {
    fn open_basic(&self) -> Result<Box<dyn BasicPlaybackPort>, MediaError> {
        self.hub.lock().surface = Player::new();
        Ok(Box::new(HeadlessSurface {
            provider: self.clone(),
        }))
    }

    fn open_pitch_decoupled(&self) -> Result<Box<dyn PitchDecoupledPort>, MediaError> {
        if !self.decoupled_available {
            return Err(MediaError::Unavailable(
                "pitch-decoupled engine disabled".to_string(),
            ));
        }
        {
            let mut hub = self.hub.lock();
            hub.audio = Some(Player::new());
            hub.pitch_semitones = 0;
            hub.eq_profile = None;
        }
        Ok(Box::new(HeadlessAudio {
            provider: self.clone(),
        }))
    }

    fn probe_pitch_decoupled(&self) -> bool {
        self.decoupled_available
    }
}

struct HeadlessSubscription {
    id: u64,
    hub: Arc<Mutex<Hub>>,
}

impl PositionSubscription for HeadlessSubscription {
    fn close(self: Box<Self>) {
        drop(self);
    }
}

impl Drop for HeadlessSubscription {
    fn drop(&mut self) {
        let id = self.id;
        self.hub.lock().subscribers.retain(|(sub, _)| *sub != id);
    }
}

struct HeadlessSurface {
    provider: HeadlessMediaProvider,
}

impl HeadlessSurface {
    fn with<R>(&self, f: impl FnOnce(&mut Player) -> R) -> R {
        f(&mut self.provider.hub.lock().surface)
    }
}

impl BasicPlaybackPort for HeadlessSurface {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError> {
        self.provider.check_item(item)?;
        self.with(|p| {
            p.item = Some(item.clone());
            p.playing = false;
            p.position = 0.0;
        });
        debug!(item = %item, "surface loaded");
        Ok(())
    }

    fn play(&self) -> Result<(), MediaError> {
        self.with(|p| p.playing = p.item.is_some());
        Ok(())
    }

    fn pause(&self) -> Result<(), MediaError> {
        self.with(|p| p.playing = false);
        Ok(())
    }

    fn stop(&self) -> Result<(), MediaError> {
        self.with(|p| {
            p.playing = false;
            p.position = 0.0;
        });
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(MediaError::Backend(format!("invalid playback rate {rate}")));
        }
        self.with(|p| p.rate = rate);
        Ok(())
    }

    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError> {
        self.with(|p| p.position = position as f64);
        Ok(())
    }

    fn position_ms(&self) -> PositionMs {
        self.with(|p| p.position_ms())
    }

    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError> {
        self.with(|p| p.volume = volume);
        Ok(())
    }

    fn subscribe_position(
        &self,
        cb: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, MediaError> {
        let mut hub = self.provider.hub.lock();
        hub.next_subscriber += 1;
        let id = hub.next_subscriber;
        hub.subscribers.push((id, cb));
        Ok(Box::new(HeadlessSubscription {
            id,
            hub: self.provider.hub.clone(),
        }))
    }
}

struct HeadlessAudio {
    provider: HeadlessMediaProvider,
}

impl HeadlessAudio {
    fn with<R>(&self, f: impl FnOnce(&mut Player) -> R) -> Result<R, MediaError> {
        let mut hub = self.provider.hub.lock();
        let player = hub
            .audio
            .as_mut()
            .ok_or_else(|| MediaError::Backend("audio player closed".to_string()))?;
        Ok(f(player))
    }
}

impl PitchDecoupledPort for HeadlessAudio {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError> {
        self.provider.check_item(item)?;
        self.with(|p| {
            p.item = Some(item.clone());
            p.playing = false;
            p.position = 0.0;
        })?;
        debug!(item = %item, "decoupled audio loaded");
        Ok(())
    }

    fn play(&self) -> Result<(), MediaError> {
        self.with(|p| p.playing = p.item.is_some())
    }

    fn pause(&self) -> Result<(), MediaError> {
        self.with(|p| p.playing = false)
    }

    fn stop(&self) -> Result<(), MediaError> {
        self.with(|p| {
            p.playing = false;
            p.position = 0.0;
        })
    }

    fn set_rate(&self, rate: f64) -> Result<(), MediaError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(MediaError::Backend(format!("invalid rate {rate}")));
        }
        self.with(|p| p.rate = rate)
    }

    fn set_pitch_semitones(&self, semitones: i32) -> Result<(), MediaError> {
        self.provider.hub.lock().pitch_semitones = semitones;
        Ok(())
    }

    fn set_eq_profile(&self, profile: Option<EqProfile>) -> Result<(), MediaError> {
        self.provider.hub.lock().eq_profile = profile;
        Ok(())
    }

    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError> {
        self.with(|p| p.position = position as f64)
    }

    fn position_ms(&self) -> PositionMs {
        self.with(|p| p.position_ms()).unwrap_or(0)
    }

    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError> {
        self.with(|p| p.volume = volume)
    }
}
