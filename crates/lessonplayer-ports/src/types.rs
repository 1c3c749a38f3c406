use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

pub type PositionMs = u64; // media position, milliseconds from start

/// Stable identity of a media item: the file path it was scanned from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey(pub String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output volume on the 0..=100 scale used by the volume slider. Every
/// construction path, deserialization included, clamps into range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32")]
pub struct Volume100(u8);

impl Volume100 {
    pub const MUTED: Volume100 = Volume100(0);

    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn step(self, delta: i32) -> Self {
        Self::new(self.0 as i32 + delta)
    }
}

impl From<i32> for Volume100 {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl Default for Volume100 {
    fn default() -> Self {
        Self(70)
    }
}

pub type Shared<T> = Arc<T>;
