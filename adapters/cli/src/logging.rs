//! Headless render and audio backends that report through `tracing`.

use std::{collections::HashSet, time::Duration};

use glam::Vec2;
use tracing::{debug, trace};
use wegen_arcade_core::{EntityKind, SlotId};
use wegen_arcade_presentation::{AudioBackend, AudioCue, AudioError, Renderer};

/// Renderer that logs every draw call and counts the visible entities.
#[derive(Debug, Default)]
pub(crate) struct LogRenderer {
    on_screen: HashSet<SlotId>,
    shakes: u32,
}

impl LogRenderer {
    pub(crate) fn on_screen(&self) -> usize {
        self.on_screen.len()
    }

    pub(crate) fn shakes(&self) -> u32 {
        self.shakes
    }
}

impl Renderer for LogRenderer {
    fn show_entity(&mut self, slot: SlotId, kind: EntityKind, at: Vec2, rise: Duration) {
        let _ = self.on_screen.insert(slot);
        debug!(
            slot = slot.get(),
            kind = kind.id(),
            x = at.x,
            y = at.y,
            rise_ms = rise.as_millis() as u64,
            "show"
        );
    }

    fn hide_entity(&mut self, slot: SlotId) {
        let _ = self.on_screen.remove(&slot);
        trace!(slot = slot.get(), "hide");
    }

    fn play_hit_effect(&mut self, slot: SlotId, hits_remaining: u32) {
        debug!(slot = slot.get(), hits_remaining, "hit");
    }

    fn play_near_miss_effect(&mut self, at: Vec2) {
        debug!(x = at.x, y = at.y, "near miss");
    }

    fn shake_screen(&mut self, intensity: f32) {
        self.shakes += 1;
        debug!(intensity, "shake");
    }

    fn show_paused_overlay(&mut self, visible: bool) {
        debug!(visible, "pause overlay");
    }
}

/// Audio backend that logs cues and fails for cues without an asset.
#[derive(Debug, Default)]
pub(crate) struct LogAudio {
    missing: HashSet<AudioCue>,
}

impl LogAudio {
    pub(crate) fn without(missing: impl IntoIterator<Item = AudioCue>) -> Self {
        Self {
            missing: missing.into_iter().collect(),
        }
    }
}

impl AudioBackend for LogAudio {
    fn play_cue(&mut self, cue: AudioCue) -> Result<(), AudioError> {
        if self.missing.contains(&cue) {
            return Err(AudioError::MissingAsset { cue: cue.id() });
        }
        trace!(cue = cue.id(), "cue");
        Ok(())
    }
}
