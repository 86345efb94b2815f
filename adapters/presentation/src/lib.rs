#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Render and audio collaborator contracts for Wegen arcade adapters.
//!
//! The session never touches pixels or speakers. Adapters implement
//! [`Renderer`] and [`AudioBackend`], and a [`Presenter`] translates the
//! session's events into collaborator calls.

use std::time::Duration;

use glam::Vec2;
use thiserror::Error;
use tracing::warn;
use wegen_arcade_core::{EntityKind, Event, HitEffect, SlotId, SlotLayout, WorldPoint};

/// Screen shake applied when a bomb detonates.
pub const BOMB_SHAKE_INTENSITY: f32 = 0.6;

/// Remaining seconds during which each countdown tick plays a warning cue.
pub const COUNTDOWN_WARNING_SECS: u32 = 5;

/// Converts a world-space point into the vector type used by renderers.
#[must_use]
pub fn to_vec2(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

/// Visual collaborator driven by the presenter.
pub trait Renderer {
    /// Displays an entity centred at `at`, animating its appearance over `rise`.
    fn show_entity(&mut self, slot: SlotId, kind: EntityKind, at: Vec2, rise: Duration);
    /// Removes the entity displayed in the slot.
    fn hide_entity(&mut self, slot: SlotId);
    /// Plays the hit animation. `hits_remaining` is zero on the final hit.
    fn play_hit_effect(&mut self, slot: SlotId, hits_remaining: u32);
    /// Plays the near-miss animation at the pointer location.
    fn play_near_miss_effect(&mut self, at: Vec2);
    /// Shakes the viewport with an intensity in `0.0..=1.0`.
    fn shake_screen(&mut self, intensity: f32);
    /// Shows or hides the pause overlay.
    fn show_paused_overlay(&mut self, visible: bool);
}

/// Sound cues the presenter may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// An entity appeared.
    Spawn,
    /// A hit landed without extending a combo.
    Hit,
    /// A hit extended a combo.
    Combo,
    /// A press narrowly missed.
    NearMiss,
    /// A bomb detonated.
    Bomb,
    /// A clock added time.
    TimeBonus,
    /// A mystery entity revealed its effect.
    Mystery,
    /// The time bank is about to run out.
    Countdown,
    /// The session ended.
    GameOver,
}

impl AudioCue {
    /// Every cue, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Spawn,
        Self::Hit,
        Self::Combo,
        Self::NearMiss,
        Self::Bomb,
        Self::TimeBonus,
        Self::Mystery,
        Self::Countdown,
        Self::GameOver,
    ];

    /// Asset identifier of the cue.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Hit => "hit",
            Self::Combo => "combo",
            Self::NearMiss => "near_miss",
            Self::Bomb => "bomb",
            Self::TimeBonus => "time_bonus",
            Self::Mystery => "mystery",
            Self::Countdown => "countdown",
            Self::GameOver => "game_over",
        }
    }
}

/// Failures reported by audio backends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    /// The asset backing the cue could not be loaded.
    #[error("missing audio asset for cue `{cue}`")]
    MissingAsset {
        /// Identifier of the cue that failed.
        cue: &'static str,
    },
}

/// Audio collaborator driven by the presenter.
pub trait AudioBackend {
    /// Plays the cue once.
    fn play_cue(&mut self, cue: AudioCue) -> Result<(), AudioError>;
}

/// Audio wrapper that turns the first backend failure into a muted state.
#[derive(Debug)]
pub struct Audio<B> {
    backend: B,
    muted: bool,
}

impl<B: AudioBackend> Audio<B> {
    /// Wraps the provided backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            muted: false,
        }
    }

    /// Whether a failure disabled audio for the rest of the run.
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Plays a cue unless audio is muted. Failures never propagate.
    pub fn play(&mut self, cue: AudioCue) {
        if self.muted {
            return;
        }

        if let Err(error) = self.backend.play_cue(cue) {
            warn!(cue = cue.id(), %error, "audio playback failed; muting");
            self.muted = true;
        }
    }

    /// Borrows the wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Dispatches session events to the render and audio collaborators.
#[derive(Debug)]
pub struct Presenter<R, B> {
    renderer: R,
    audio: Audio<B>,
    layout: SlotLayout,
}

impl<R, B> Presenter<R, B>
where
    R: Renderer,
    B: AudioBackend,
{
    /// Creates a presenter for a grid laid out with `layout`.
    #[must_use]
    pub const fn new(renderer: R, audio: B, layout: SlotLayout) -> Self {
        Self {
            renderer,
            audio: Audio::new(audio),
            layout,
        }
    }

    /// Borrows the renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Borrows the audio wrapper.
    #[must_use]
    pub fn audio(&self) -> &Audio<B> {
        &self.audio
    }

    /// Translates a batch of events into collaborator calls.
    pub fn present(&mut self, events: &[Event]) {
        for event in events {
            self.present_event(event);
        }
    }

    fn present_event(&mut self, event: &Event) {
        match event {
            Event::EntityShown {
                slot, kind, rise, ..
            } => {
                let at = self.slot_center(*slot);
                self.renderer.show_entity(*slot, *kind, at, *rise);
                self.audio.play(AudioCue::Spawn);
            }
            Event::EntityPartiallyHit {
                slot,
                hits_remaining,
                ..
            } => {
                self.renderer.play_hit_effect(*slot, *hits_remaining);
                self.audio.play(AudioCue::Hit);
            }
            Event::EntityCompleted {
                slot,
                effect,
                combo,
                ..
            } => {
                self.renderer.play_hit_effect(*slot, 0);
                self.renderer.hide_entity(*slot);
                self.audio.play(completion_cue(effect, *combo));
                if matches!(effect, HitEffect::Bomb { .. }) {
                    self.renderer.shake_screen(BOMB_SHAKE_INTENSITY);
                }
            }
            Event::EntityExpired { slot, .. } | Event::SlotCleared { slot } => {
                self.renderer.hide_entity(*slot);
            }
            Event::NearMiss { point, .. } => {
                self.renderer.play_near_miss_effect(to_vec2(*point));
                self.audio.play(AudioCue::NearMiss);
            }
            Event::CountdownTicked { time_remaining } => {
                if (1..=COUNTDOWN_WARNING_SECS).contains(time_remaining) {
                    self.audio.play(AudioCue::Countdown);
                }
            }
            Event::SessionPaused => self.renderer.show_paused_overlay(true),
            Event::SessionResumed => self.renderer.show_paused_overlay(false),
            Event::LayoutConfigured { layout } => self.layout = *layout,
            Event::SessionEnded { .. } => self.audio.play(AudioCue::GameOver),
            Event::SessionStarted { .. }
            | Event::TimeAdvanced { .. }
            | Event::StageChanged { .. } => {}
        }
    }

    fn slot_center(&self, slot: SlotId) -> Vec2 {
        self.layout
            .region(slot)
            .map_or(Vec2::ZERO, |region| to_vec2(region.center()))
    }
}

fn completion_cue(effect: &HitEffect, combo: u32) -> AudioCue {
    match effect {
        HitEffect::Points { .. } if combo > 1 => AudioCue::Combo,
        HitEffect::Points { .. } => AudioCue::Hit,
        HitEffect::TimeBonus { .. } => AudioCue::TimeBonus,
        HitEffect::Bomb { .. } => AudioCue::Bomb,
        HitEffect::Mystery(_) => AudioCue::Mystery,
    }
}
