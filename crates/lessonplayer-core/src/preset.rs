use crate::state::PlaybackState;
use lessonplayer_ports::storage::{
    LessonMetadata, MetadataStorePort, MetadataUpdate, PracticePreset, StorageError,
};
use lessonplayer_ports::types::{ItemKey, Shared};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresetApplied {
    /// No preset stored for the item.
    Cleared,
    Applied(PracticePreset),
}

/// Tempo and groove handed to the metronome for an item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetronomeCue {
    pub tempo: Option<u32>,
    pub groove: Option<String>,
}

impl MetronomeCue {
    pub fn label(&self) -> String {
        let mut label = String::from("Metronome:");
        if let Some(tempo) = self.tempo {
            label.push_str(&format!(" {tempo} BPM"));
        }
        if let Some(groove) = self.groove.as_deref() {
            label.push_str(&format!(" ({groove})"));
        }
        label
    }
}

pub struct PresetController {
    store: Shared<dyn MetadataStorePort>,
}

impl PresetController {
    pub fn new(store: Shared<dyn MetadataStorePort>) -> Self {
        Self { store }
    }

    /// Snapshots transpose and loop bounds from `state`; tempo and groove are
    /// always taken from the item's metadata, never edited in the preset.
    pub fn save(
        &self,
        item: &ItemKey,
        state: &PlaybackState,
    ) -> Result<PracticePreset, StorageError> {
        let metadata = self.metadata_or_default(item);
        let preset = PracticePreset {
            tempo: metadata.tempo,
            transpose_steps: Some(state.transpose_steps),
            loop_start_ms: state.loop_ab.start_ms(),
            loop_end_ms: state.loop_ab.end_ms(),
            groove: metadata.first_tag(),
        };
        self.store.save_preset(item, &preset)?;
        debug!(item = %item, ?preset, "practice preset saved");
        Ok(preset)
    }

    /// Copies the stored preset into `state`. Loop bounds are restored as a
    /// pair without A/B validation. `state` is left untouched on error. The
    /// caller re-runs the rate resolver.
    pub fn apply(
        &self,
        item: &ItemKey,
        state: &mut PlaybackState,
    ) -> Result<PresetApplied, StorageError> {
        let Some(preset) = self.store.get_preset(item)? else {
            return Ok(PresetApplied::Cleared);
        };

        let mut next = state.clone();
        if let Some(steps) = preset.transpose_steps {
            next.transpose_steps = steps;
        }
        if let (Some(start), Some(end)) = (preset.loop_start_ms, preset.loop_end_ms) {
            next.loop_ab.restore(start, end);
        }
        if let Some(groove) = preset.groove.as_deref().filter(|g| !g.trim().is_empty()) {
            let metadata = self.metadata_or_default(item);
            let tags = promote_groove(groove, metadata.tags.as_deref());
            self.store.update_metadata(
                item,
                MetadataUpdate {
                    tags: Some(tags),
                    ..MetadataUpdate::default()
                },
            )?;
        }

        *state = next;
        debug!(item = %item, ?preset, "practice preset applied");
        Ok(PresetApplied::Applied(preset))
    }

    pub fn reset(&self, item: &ItemKey) -> Result<(), StorageError> {
        self.store.delete_preset(item)?;
        debug!(item = %item, "practice preset reset");
        Ok(())
    }

    /// Preset values win; lesson metadata fills whatever the preset lacks.
    pub fn metronome_cue(&self, item: &ItemKey) -> MetronomeCue {
        let preset = match self.store.get_preset(item) {
            Ok(preset) => preset.unwrap_or_default(),
            Err(err) => {
                warn!(item = %item, error = %err, "could not read practice preset");
                PracticePreset::default()
            }
        };
        let metadata = self.metadata_or_default(item);
        MetronomeCue {
            tempo: preset.tempo.or(metadata.tempo),
            groove: preset.groove.or_else(|| metadata.first_tag()),
        }
    }

    fn metadata_or_default(&self, item: &ItemKey) -> LessonMetadata {
        match self.store.get_metadata(item) {
            Ok(metadata) => metadata.unwrap_or_default(),
            Err(err) => {
                warn!(item = %item, error = %err, "could not read lesson metadata");
                LessonMetadata::default()
            }
        }
    }
}

/// Rewrites a comma-separated tag list so `groove` comes first. Other tags are
/// trimmed, kept in order, and every exact (case-sensitive) copy of the groove
/// is dropped.
pub fn promote_groove(groove: &str, tags: Option<&str>) -> String {
    let groove = groove.trim();
    let mut parts = vec![groove];
    if let Some(tags) = tags {
        parts.extend(
            tags.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty() && *tag != groove),
        );
    }
    parts.join(", ")
}
