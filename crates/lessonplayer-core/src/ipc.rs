use crate::state::TransportState;
use lessonplayer_ports::media::BackendKind;
use lessonplayer_ports::types::{ItemKey, PositionMs, Volume100};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    OpenItem { key: ItemKey },
    Play,
    Pause,
    Stop,
    TransposeUp,
    TransposeDown,
    SetSpeedPercent { percent: u32 },
    SetLoopStart,
    SetLoopEnd,
    ToggleLoop,
    SavePreset,
    ApplyPreset,
    ResetPreset,
    SeekForward,
    SeekBack,
    SeekTo { position_ms: PositionMs },
    SetVolume { volume: Volume100 },
    VolumeUp,
    VolumeDown,
    /// For hosts that poll the backend instead of subscribing.
    ReportPosition { position_ms: PositionMs },
    RequestMetronomeCue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    StatusChanged { text: String },
    /// Transient overlay message.
    Feedback { message: String },
    /// Practice preset label; empty when no preset is active.
    PresetIndicator { text: String },
    TransposeLabel { text: String },
    SpeedLabel { text: String },
    PlaybackUpdated {
        transport: TransportState,
        speed: f64,
        transpose_steps: i32,
        backend: BackendKind,
        eq_profile_active: bool,
    },
    LoopUpdated {
        start_ms: Option<PositionMs>,
        end_ms: Option<PositionMs>,
        enabled: bool,
    },
    PositionChanged { position_ms: PositionMs },
    VolumeChanged { volume: Volume100 },
    MetronomeCue {
        tempo: Option<u32>,
        groove: Option<String>,
        label: String,
    },
}

pub fn parse_command(line: &str) -> Result<Command, serde_json::Error> {
    serde_json::from_str(line)
}

pub fn event_to_json(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
