use crate::backend::MediaBackend;
use crate::count_in::{CountIn, CountInStep};
use crate::ipc::{Command, Event};
use crate::loop_ab::LoopError;
use crate::preset::{MetronomeCue, PresetApplied, PresetController};
use crate::rate_pitch::resolve;
use crate::state::{
    PlaybackState, SessionConfig, TransportState, MAX_SPEED_PERCENT, MIN_SPEED_PERCENT,
};
use crate::status::{
    compose_status, speed_label, transpose_label, PRESET_CLEARED, PRESET_ON, PRESET_RESET,
};
use lessonplayer_ports::media::{BackendKind, MediaError, MediaProvider, PositionSubscription};
use lessonplayer_ports::storage::{MetadataStorePort, StorageError};
use lessonplayer_ports::types::{ItemKey, PositionMs, Shared, Volume100};
use parking_lot::Mutex;
use rtrb::{Consumer, RingBuffer};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

const SEEK_STEP_MS: PositionMs = 5_000;
const VOLUME_STEP: i32 = 5;
const POSITION_QUEUE_CAPACITY: usize = 256;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Loop(#[from] LoopError),
    #[error("Could not {action} practice preset: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("no media item selected")]
    NoMediaItem,
    #[error("media error: {0}")]
    Media(#[from] MediaError),
}

fn persistence(action: &'static str) -> impl FnOnce(StorageError) -> SessionError {
    move |source| SessionError::Persistence { action, source }
}

/// Playback controller for the currently open media item. Every method runs
/// on the owning thread; backend position callbacks are queued and only
/// applied from [`PracticeSession::tick`].
pub struct PracticeSession {
    backend: MediaBackend,
    presets: PresetController,
    config: SessionConfig,
    state: PlaybackState,
    item: Option<ItemKey>,
    transport: TransportState,
    count_in: Option<CountIn>,
    volume: Volume100,
    position_sub: Option<Box<dyn PositionSubscription>>,
    position_rx: Option<Consumer<PositionMs>>,
    events: VecDeque<Event>,
}

impl PracticeSession {
    pub fn new(
        provider: &dyn MediaProvider,
        store: Shared<dyn MetadataStorePort>,
        config: SessionConfig,
        volume: Volume100,
    ) -> Result<Self, SessionError> {
        let backend = MediaBackend::select(provider, config.backend_preference)?;
        let state = PlaybackState::new(backend.kind());

        let mut session = Self {
            backend,
            presets: PresetController::new(store),
            config,
            state,
            item: None,
            transport: TransportState::Stopped,
            count_in: None,
            volume,
            position_sub: None,
            position_rx: None,
            events: VecDeque::new(),
        };
        session.apply_volume();
        Ok(session)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn item(&self) -> Option<&ItemKey> {
        self.item.as_ref()
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn volume(&self) -> Volume100 {
        self.volume
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), SessionError> {
        let result = match cmd {
            Command::OpenItem { key } => self.open_item(key),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::TransposeUp => Ok(self.transpose_up()),
            Command::TransposeDown => Ok(self.transpose_down()),
            Command::SetSpeedPercent { percent } => Ok(self.set_speed_percent(percent)),
            Command::SetLoopStart => Ok(self.set_loop_start()),
            Command::SetLoopEnd => self.set_loop_end(),
            Command::ToggleLoop => self.toggle_loop(),
            Command::SavePreset => self.save_preset(),
            Command::ApplyPreset => self.apply_preset(),
            Command::ResetPreset => self.reset_preset(),
            Command::SeekForward => self.seek_forward(),
            Command::SeekBack => self.seek_back(),
            Command::SeekTo { position_ms } => self.seek_to(position_ms).map(|()| String::new()),
            Command::SetVolume { volume } => Ok(self.set_volume(volume)),
            Command::VolumeUp => Ok(self.volume_step(VOLUME_STEP)),
            Command::VolumeDown => Ok(self.volume_step(-VOLUME_STEP)),
            Command::ReportPosition { position_ms } => {
                self.handle_position(position_ms);
                Ok(String::new())
            }
            Command::RequestMetronomeCue => self.metronome_cue().map(|cue| cue.label()),
        };

        match result {
            Ok(_) => Ok(()),
            Err(SessionError::NoMediaItem) => {
                warn!("command ignored: no media item selected");
                Ok(())
            }
            Err(err) => {
                self.events.push_back(Event::Feedback {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Drains queued position updates and advances a running count-in.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.drain_positions();
        self.advance_count_in(now);
    }

    /// Opens `key`, resets playback state and auto-applies its practice preset.
    pub fn open_item(&mut self, key: ItemKey) -> Result<String, SessionError> {
        if key.is_blank() {
            return Err(SessionError::NoMediaItem);
        }
        self.backend.load(&key)?;

        self.close_position_subscription();
        self.state = PlaybackState::new(self.backend.kind());
        self.transport = TransportState::Stopped;
        self.count_in = None;
        self.item = Some(key);
        self.open_position_subscription();

        self.apply_rate();
        self.events.push_back(Event::SpeedLabel {
            text: speed_label(self.state.current_speed),
        });
        self.emit_loop();
        self.apply_preset()
    }

    pub fn play(&mut self) -> Result<String, SessionError> {
        self.play_at(Instant::now())
    }

    /// Like [`PracticeSession::play`], with the count-in clocked from `now`.
    pub fn play_at(&mut self, now: Instant) -> Result<String, SessionError> {
        match self.transport {
            TransportState::CountingIn => Ok(String::new()),
            TransportState::Playing => self.start_playback(),
            _ if self.config.count_in_enabled => {
                self.transport = TransportState::CountingIn;
                self.count_in = Some(CountIn::start(now));
                self.emit_playback();
                self.advance_count_in(now);
                Ok(String::new())
            }
            _ => self.start_playback(),
        }
    }

    pub fn pause(&mut self) -> Result<String, SessionError> {
        self.count_in = None;
        self.backend.pause()?;
        self.transport = TransportState::Paused;
        self.emit_playback();
        Ok(self.emit_status("Pause"))
    }

    /// Always returns pitch to neutral before stopping the backends.
    pub fn stop(&mut self) -> Result<String, SessionError> {
        self.count_in = None;
        self.state.transpose_steps = 0;
        self.apply_rate();
        self.backend.stop()?;
        self.transport = TransportState::Stopped;
        self.emit_playback();
        Ok(self.emit_status("Stop"))
    }

    pub fn transpose_up(&mut self) -> String {
        self.transpose_by(1)
    }

    pub fn transpose_down(&mut self) -> String {
        self.transpose_by(-1)
    }

    fn transpose_by(&mut self, delta: i32) -> String {
        self.state.transpose_steps = self.state.transpose_steps.saturating_add(delta);
        self.apply_rate();
        transpose_label(self.state.transpose_steps)
    }

    /// `percent` is the speed slider value, 50..=200 for 0.5x..2.0x.
    pub fn set_speed_percent(&mut self, percent: u32) -> String {
        let percent = percent.clamp(MIN_SPEED_PERCENT, MAX_SPEED_PERCENT);
        self.state.current_speed = percent as f64 / 100.0;
        self.apply_rate();
        let label = speed_label(self.state.current_speed);
        self.events.push_back(Event::SpeedLabel {
            text: label.clone(),
        });
        label
    }

    pub fn set_loop_start(&mut self) -> String {
        let position = self.backend.position_ms();
        self.state.loop_ab.set_start(position);
        self.emit_loop();
        self.emit_feedback("Loop A set");
        self.emit_status("Loop start (A) set")
    }

    pub fn set_loop_end(&mut self) -> Result<String, SessionError> {
        let position = self.backend.position_ms();
        self.state.loop_ab.set_end(position)?;
        self.emit_loop();
        self.emit_feedback("Loop B set");
        Ok(self.emit_status("Loop end (B) set"))
    }

    pub fn toggle_loop(&mut self) -> Result<String, SessionError> {
        let enabled = self.state.loop_ab.toggle()?;
        self.emit_loop();
        if enabled {
            self.emit_feedback("Loop ON");
            Ok(self.emit_status("Loop enabled"))
        } else {
            self.emit_feedback("Loop OFF");
            Ok(self.emit_status("Loop disabled"))
        }
    }

    pub fn save_preset(&mut self) -> Result<String, SessionError> {
        let item = self.require_item()?;
        self.presets
            .save(&item, &self.state)
            .map_err(persistence("save"))?;
        self.emit_indicator(PRESET_ON);
        Ok(self.emit_status(PRESET_ON))
    }

    pub fn apply_preset(&mut self) -> Result<String, SessionError> {
        let item = self.require_item()?;
        let applied = self
            .presets
            .apply(&item, &mut self.state)
            .map_err(persistence("apply"))?;

        match applied {
            PresetApplied::Cleared => {
                self.emit_indicator("");
                Ok(self.emit_status(PRESET_CLEARED))
            }
            PresetApplied::Applied(_) => {
                self.apply_rate();
                self.emit_loop();
                self.emit_indicator(PRESET_ON);
                Ok(self.emit_status(PRESET_ON))
            }
        }
    }

    pub fn reset_preset(&mut self) -> Result<String, SessionError> {
        let item = self.require_item()?;
        self.presets.reset(&item).map_err(persistence("reset"))?;
        self.emit_indicator("");
        Ok(self.emit_status(PRESET_RESET))
    }

    pub fn metronome_cue(&mut self) -> Result<MetronomeCue, SessionError> {
        let item = self.require_item()?;
        let cue = self.presets.metronome_cue(&item);
        self.events.push_back(Event::MetronomeCue {
            tempo: cue.tempo,
            groove: cue.groove.clone(),
            label: cue.label(),
        });
        Ok(cue)
    }

    pub fn seek_forward(&mut self) -> Result<String, SessionError> {
        let target = self.backend.position_ms().saturating_add(SEEK_STEP_MS);
        self.seek_to(target)?;
        Ok(self.emit_feedback("⏩ +5s"))
    }

    pub fn seek_back(&mut self) -> Result<String, SessionError> {
        let target = self.backend.position_ms().saturating_sub(SEEK_STEP_MS);
        self.seek_to(target)?;
        Ok(self.emit_feedback("⏪ -5s"))
    }

    pub fn seek_to(&mut self, position: PositionMs) -> Result<(), SessionError> {
        self.backend.seek(position)?;
        self.events.push_back(Event::PositionChanged {
            position_ms: position,
        });
        Ok(())
    }

    pub fn set_volume(&mut self, volume: Volume100) -> String {
        self.volume = volume;
        self.apply_volume();
        format!("Volume: {}", volume.get())
    }

    pub fn volume_step(&mut self, delta: i32) -> String {
        self.set_volume(self.volume.step(delta));
        let icon = if delta >= 0 { "🔊" } else { "🔉" };
        self.emit_feedback(&format!("{icon} Volume: {}", self.volume.get()))
    }

    /// Feeds one position update through the loop machine.
    pub fn handle_position(&mut self, position: PositionMs) {
        self.events.push_back(Event::PositionChanged {
            position_ms: position,
        });
        if let Some(target) = self.state.loop_ab.on_position(position) {
            debug!(position, target, "loop end reached; seeking to loop start");
            if let Err(err) = self.backend.seek(target) {
                warn!(error = %err, "loop seek failed");
            }
        }
    }

    fn start_playback(&mut self) -> Result<String, SessionError> {
        self.count_in = None;
        self.backend.play()?;
        self.transport = TransportState::Playing;
        self.emit_playback();
        Ok(self.emit_status("Play"))
    }

    fn advance_count_in(&mut self, now: Instant) {
        let Some(mut count_in) = self.count_in.take() else {
            return;
        };
        let mut done = false;
        for step in count_in.advance(now) {
            match step {
                CountInStep::Beat(beat) => {
                    self.emit_feedback(&format!("Count-in: {beat}"));
                }
                CountInStep::Done => done = true,
            }
        }
        if !done {
            self.count_in = Some(count_in);
            return;
        }
        if let Err(err) = self.start_playback() {
            warn!(error = %err, "could not start playback after count-in");
            self.transport = TransportState::Stopped;
            self.emit_playback();
        }
    }

    fn drain_positions(&mut self) {
        let Some(mut consumer) = self.position_rx.take() else {
            return;
        };
        let mut pending = Vec::new();
        while let Ok(position) = consumer.pop() {
            pending.push(position);
        }
        self.position_rx = Some(consumer);

        for position in pending {
            self.handle_position(position);
        }
    }

    fn open_position_subscription(&mut self) {
        let (producer, consumer) = RingBuffer::new(POSITION_QUEUE_CAPACITY);
        let producer = Arc::new(Mutex::new(producer));
        let cb = Arc::new(move |position: PositionMs| {
            if let Some(mut guard) = producer.try_lock() {
                // Full ring: this tick is dropped; later ticks still arrive.
                if guard.push(position).is_err() {
                    trace!(position, "position queue full; tick dropped");
                }
            }
        });

        match self.backend.subscribe_position(cb) {
            Ok(sub) => {
                self.position_sub = Some(sub);
                self.position_rx = Some(consumer);
            }
            Err(err) => warn!(error = %err, "position updates unavailable; looping disabled"),
        }
    }

    fn close_position_subscription(&mut self) {
        if let Some(sub) = self.position_sub.take() {
            sub.close();
        }
        self.position_rx = None;
    }

    fn apply_rate(&mut self) {
        let plan = resolve(self.state.rate_input(self.config.low_speed_eq_enabled));
        self.state.record_plan(&plan);
        if let Err(err) = self.backend.apply_rate_plan(&plan) {
            warn!(error = %err, ?plan, "backend rejected rate plan");
        }
        self.events.push_back(Event::TransposeLabel {
            text: transpose_label(self.state.transpose_steps),
        });
        self.emit_playback();
    }

    fn apply_volume(&mut self) {
        if let Err(err) = self.backend.set_volume(self.volume) {
            warn!(error = %err, "could not set volume");
        }
        self.events.push_back(Event::VolumeChanged {
            volume: self.volume,
        });
    }

    fn require_item(&self) -> Result<ItemKey, SessionError> {
        self.item.clone().ok_or(SessionError::NoMediaItem)
    }

    fn emit_status(&mut self, text: &str) -> String {
        let text = compose_status(self.backend.kind(), self.state.eq_profile_active, text);
        self.events.push_back(Event::StatusChanged { text: text.clone() });
        text
    }

    fn emit_feedback(&mut self, message: &str) -> String {
        self.events.push_back(Event::Feedback {
            message: message.to_string(),
        });
        message.to_string()
    }

    fn emit_indicator(&mut self, text: &str) {
        self.events.push_back(Event::PresetIndicator {
            text: text.to_string(),
        });
    }

    fn emit_loop(&mut self) {
        let loop_ab = &self.state.loop_ab;
        self.events.push_back(Event::LoopUpdated {
            start_ms: loop_ab.start_ms(),
            end_ms: loop_ab.end_ms(),
            enabled: loop_ab.enabled(),
        });
    }

    fn emit_playback(&mut self) {
        self.events.push_back(Event::PlaybackUpdated {
            transport: self.transport,
            speed: self.state.current_speed,
            transpose_steps: self.state.transpose_steps,
            backend: self.backend.kind(),
            eq_profile_active: self.state.eq_profile_active,
        });
    }
}

impl Drop for PracticeSession {
    fn drop(&mut self) {
        self.close_position_subscription();
    }
}
