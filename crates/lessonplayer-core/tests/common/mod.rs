#![allow(dead_code)]

use lessonplayer_ports::media::{
    BasicPlaybackPort, EqProfile, MediaError, MediaProvider, PitchDecoupledPort, PositionCallback,
    PositionSubscription,
};
use lessonplayer_ports::storage::{
    LessonMetadata, MetadataStorePort, MetadataUpdate, PracticePreset, StorageError,
};
use lessonplayer_ports::types::{ItemKey, PositionMs, Volume100};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Surface,
    Audio,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Load(Target, String),
    Play(Target),
    Pause(Target),
    Stop(Target),
    Rate(Target, f64),
    Pitch(i32),
    Eq(Option<EqProfile>),
    Seek(Target, PositionMs),
    Volume(Target, u8),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    position: PositionMs,
    subscribers: Vec<(u64, PositionCallback)>,
    next_sub: u64,
}

/// Records every backend call; positions are pushed by the test.
#[derive(Clone)]
pub struct FakeMedia {
    shared: Arc<Mutex<Shared>>,
    decoupled_available: bool,
}

impl FakeMedia {
    pub fn new(decoupled_available: bool) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            decoupled_available,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }

    pub fn set_position(&self, position: PositionMs) {
        self.shared.lock().position = position;
    }

    pub fn position(&self) -> PositionMs {
        self.shared.lock().position
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// Invokes every subscriber as a backend thread would.
    pub fn emit_position(&self, position: PositionMs) {
        let callbacks: Vec<PositionCallback> = {
            let mut shared = self.shared.lock();
            shared.position = position;
            shared.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for cb in callbacks {
            cb(position);
        }
    }

    pub fn last_rate(&self, target: Target) -> Option<f64> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Rate(t, rate) if t == target => Some(rate),
            _ => None,
        })
    }

    pub fn last_pitch(&self) -> Option<i32> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Pitch(steps) => Some(steps),
            _ => None,
        })
    }

    pub fn last_eq(&self) -> Option<Option<EqProfile>> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Eq(profile) => Some(profile),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.shared.lock().calls.push(call);
    }
}

struct FakeSubscription {
    id: u64,
    shared: Arc<Mutex<Shared>>,
}

impl PositionSubscription for FakeSubscription {
    fn close(self: Box<Self>) {
        self.shared.lock().subscribers.retain(|(id, _)| *id != self.id);
    }
}

struct FakeSurface(FakeMedia);

impl BasicPlaybackPort for FakeSurface {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError> {
        if item.as_str().ends_with(".missing") {
            return Err(MediaError::MediaNotFound(item.to_string()));
        }
        self.0.record(Call::Load(Target::Surface, item.to_string()));
        Ok(())
    }

    fn play(&self) -> Result<(), MediaError> {
        self.0.record(Call::Play(Target::Surface));
        Ok(())
    }

    fn pause(&self) -> Result<(), MediaError> {
        self.0.record(Call::Pause(Target::Surface));
        Ok(())
    }

    fn stop(&self) -> Result<(), MediaError> {
        self.0.record(Call::Stop(Target::Surface));
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError> {
        self.0.record(Call::Rate(Target::Surface, rate));
        Ok(())
    }

    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError> {
        self.0.record(Call::Seek(Target::Surface, position));
        self.0.set_position(position);
        Ok(())
    }

    fn position_ms(&self) -> PositionMs {
        self.0.position()
    }

    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError> {
        self.0.record(Call::Volume(Target::Surface, volume.get()));
        Ok(())
    }

    fn subscribe_position(
        &self,
        cb: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, MediaError> {
        let mut shared = self.0.shared.lock();
        shared.next_sub += 1;
        let id = shared.next_sub;
        shared.subscribers.push((id, cb));
        Ok(Box::new(FakeSubscription {
            id,
            shared: self.0.shared.clone(),
        }))
    }
}

struct FakeAudio(FakeMedia);

impl PitchDecoupledPort for FakeAudio {
    fn load(&self, item: &ItemKey) -> Result<(), MediaError> {
        self.0.record(Call::Load(Target::Audio, item.to_string()));
        Ok(())
    }

    fn play(&self) -> Result<(), MediaError> {
        self.0.record(Call::Play(Target::Audio));
        Ok(())
    }

    fn pause(&self) -> Result<(), MediaError> {
        self.0.record(Call::Pause(Target::Audio));
        Ok(())
    }

    fn stop(&self) -> Result<(), MediaError> {
        self.0.record(Call::Stop(Target::Audio));
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<(), MediaError> {
        self.0.record(Call::Rate(Target::Audio, rate));
        Ok(())
    }

    fn set_pitch_semitones(&self, semitones: i32) -> Result<(), MediaError> {
        self.0.record(Call::Pitch(semitones));
        Ok(())
    }

    fn set_eq_profile(&self, profile: Option<EqProfile>) -> Result<(), MediaError> {
        self.0.record(Call::Eq(profile));
        Ok(())
    }

    fn set_position_ms(&self, position: PositionMs) -> Result<(), MediaError> {
        self.0.record(Call::Seek(Target::Audio, position));
        Ok(())
    }

    fn position_ms(&self) -> PositionMs {
        self.0.position()
    }

    fn set_volume(&self, volume: Volume100) -> Result<(), MediaError> {
        self.0.record(Call::Volume(Target::Audio, volume.get()));
        Ok(())
    }
}

impl MediaProvider for FakeMedia {
    fn open_basic(&self) -> Result<Box<dyn BasicPlaybackPort>, MediaError> {
        Ok(Box::new(FakeSurface(self.clone())))
    }

    fn open_pitch_decoupled(&self) -> Result<Box<dyn PitchDecoupledPort>, MediaError> {
        if !self.decoupled_available {
            return Err(MediaError::Unavailable("native backend not installed".to_string()));
        }
        Ok(Box::new(FakeAudio(self.clone())))
    }
}

#[derive(Default)]
struct StoreInner {
    metadata: HashMap<ItemKey, LessonMetadata>,
    presets: HashMap<ItemKey, PracticePreset>,
    fail_writes: bool,
}

/// In-memory library; `fail_writes` makes every write return an io error.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_metadata(&self, key: &str, tempo: Option<u32>, tags: Option<&str>) {
        self.inner.lock().metadata.insert(
            ItemKey::new(key),
            LessonMetadata {
                title: Some("Test".to_string()),
                tempo,
                tags: tags.map(str::to_string),
            },
        );
    }

    pub fn tags(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .metadata
            .get(&ItemKey::new(key))
            .and_then(|m| m.tags.clone())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    fn check_writable(inner: &StoreInner) -> Result<(), StorageError> {
        if inner.fail_writes {
            return Err(StorageError::Io("database is locked".to_string()));
        }
        Ok(())
    }
}

impl MetadataStorePort for MemoryStore {
    fn get_metadata(&self, item: &ItemKey) -> Result<Option<LessonMetadata>, StorageError> {
        Ok(self.inner.lock().metadata.get(item).cloned())
    }

    fn update_metadata(&self, item: &ItemKey, update: MetadataUpdate) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        Self::check_writable(&inner)?;
        let entry = inner.metadata.entry(item.clone()).or_default();
        if update.title.is_some() {
            entry.title = update.title;
        }
        if update.tempo.is_some() {
            entry.tempo = update.tempo;
        }
        if update.tags.is_some() {
            entry.tags = update.tags;
        }
        Ok(())
    }

    fn get_preset(&self, item: &ItemKey) -> Result<Option<PracticePreset>, StorageError> {
        Ok(self.inner.lock().presets.get(item).cloned())
    }

    fn save_preset(&self, item: &ItemKey, preset: &PracticePreset) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        Self::check_writable(&inner)?;
        inner.presets.insert(item.clone(), preset.clone());
        Ok(())
    }

    fn delete_preset(&self, item: &ItemKey) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        Self::check_writable(&inner)?;
        inner.presets.remove(item);
        Ok(())
    }
}
