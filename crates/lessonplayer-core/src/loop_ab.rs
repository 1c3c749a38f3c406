use lessonplayer_ports::types::PositionMs;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopError {
    #[error("Loop B must be after A")]
    InvalidLoopOrder,
    #[error("Set A and B before enabling loop")]
    MissingLoopBounds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
    NoBounds,
    ASet,
    /// B recorded while A was never set.
    BOnly,
    AAndBSet,
    Looping,
}

/// A/B repeat bounds. B is checked against A only when B is set; moving A
/// afterwards (or restoring a preset) never re-validates B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopAb {
    start_ms: Option<PositionMs>,
    end_ms: Option<PositionMs>,
    enabled: bool,
}

impl LoopAb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_ms(&self) -> Option<PositionMs> {
        self.start_ms
    }

    pub fn end_ms(&self) -> Option<PositionMs> {
        self.end_ms
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn bounds(&self) -> Option<(PositionMs, PositionMs)> {
        Some((self.start_ms?, self.end_ms?))
    }

    pub fn phase(&self) -> LoopPhase {
        match (self.start_ms, self.end_ms) {
            (Some(_), Some(_)) if self.enabled => LoopPhase::Looping,
            (Some(_), Some(_)) => LoopPhase::AAndBSet,
            (Some(_), None) => LoopPhase::ASet,
            (None, Some(_)) => LoopPhase::BOnly,
            (None, None) => LoopPhase::NoBounds,
        }
    }

    pub fn set_start(&mut self, position: PositionMs) {
        self.start_ms = Some(position);
    }

    pub fn set_end(&mut self, position: PositionMs) -> Result<(), LoopError> {
        if let Some(start) = self.start_ms {
            if position <= start {
                return Err(LoopError::InvalidLoopOrder);
            }
        }
        self.end_ms = Some(position);
        Ok(())
    }

    /// Returns whether looping is enabled after the toggle.
    pub fn toggle(&mut self) -> Result<bool, LoopError> {
        if self.enabled {
            self.enabled = false;
            return Ok(false);
        }
        if self.bounds().is_none() {
            return Err(LoopError::MissingLoopBounds);
        }
        self.enabled = true;
        Ok(true)
    }

    /// Seek target for a position update, if the loop wraps here.
    pub fn on_position(&self, position: PositionMs) -> Option<PositionMs> {
        if !self.enabled {
            return None;
        }
        let (start, end) = self.bounds()?;
        (position >= end).then_some(start)
    }

    /// Writes a saved pair directly; used when applying a practice preset.
    pub fn restore(&mut self, start: PositionMs, end: PositionMs) {
        self.start_ms = Some(start);
        self.end_ms = Some(end);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
