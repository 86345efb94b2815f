#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the Wegen arcade minigame.
//!
//! The session owns the slot grid, the time bank, and the score. Every
//! mutation arrives as a [`Command`] through [`apply`], and every observable
//! change leaves as an [`Event`]. A single `Tick` drives every timer, so a
//! paused session simply ignores ticks and all timers freeze together.

mod slots;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use wegen_arcade_core::{
    Command, DifficultyStage, EndReason, EntityKind, Event, SessionConfig, SessionResult,
    SessionStatus, SlotId, SlotLayout, WorldPoint, WELCOME_BANNER,
};
use wegen_arcade_system_difficulty::DifficultyEngine;
use wegen_arcade_system_scoring::{Scoreboard, Scoring, ScoringConfig};

use slots::{Slot, SlotHit};

const COUNTDOWN_QUANTUM: Duration = Duration::from_secs(1);

/// Represents the authoritative state of one arcade session.
#[derive(Debug)]
pub struct Session {
    banner: &'static str,
    time_bank_secs: u32,
    status: SessionStatus,
    layout: SlotLayout,
    slots: Vec<Slot>,
    difficulty: DifficultyEngine,
    scoring: Scoring,
    board: Scoreboard,
    elapsed: Duration,
    countdown: Duration,
    stage: DifficultyStage,
    rng: ChaCha8Rng,
    result: Option<SessionResult>,
}

impl Session {
    /// Creates a waiting session laid out according to the configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let layout = config.layout();
        let slots = (0..layout.slot_count())
            .filter_map(|index| {
                let id = SlotId::new(index);
                layout.region(id).map(|region| Slot::new(id, region))
            })
            .collect();
        let difficulty = DifficultyEngine::default();
        let stage = difficulty.stage(Duration::ZERO, config.time_bank_secs);

        Self {
            banner: WELCOME_BANNER,
            time_bank_secs: config.time_bank_secs,
            status: SessionStatus::Waiting,
            layout,
            slots,
            difficulty,
            scoring: Scoring::new(ScoringConfig::from(config)),
            board: Scoreboard::new(config.time_bank_secs),
            elapsed: Duration::ZERO,
            countdown: Duration::ZERO,
            stage,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            result: None,
        }
    }

    fn slot_mut(&mut self, slot: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|candidate| candidate.id() == slot)
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        self.board = Scoreboard::new(self.time_bank_secs);
        self.elapsed = Duration::ZERO;
        self.countdown = Duration::ZERO;
        self.stage = self.difficulty.stage(Duration::ZERO, self.time_bank_secs);
        self.status = SessionStatus::Running;

        info!(
            time_bank = self.time_bank_secs,
            slots = self.slots.len(),
            "session started"
        );
        out_events.push(Event::SessionStarted {
            time_remaining: self.board.time_remaining(),
            slots: self.layout.slot_count(),
        });
        out_events.push(Event::StageChanged { stage: self.stage });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if dt.is_zero() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for slot in &mut self.slots {
            if let Some(kind) = slot.advance(dt) {
                out_events.push(Event::EntityExpired {
                    slot: slot.id(),
                    kind,
                });
            }
        }

        self.countdown = self.countdown.saturating_add(dt);
        while self.countdown >= COUNTDOWN_QUANTUM {
            self.countdown -= COUNTDOWN_QUANTUM;
            let time_remaining = self.scoring.countdown_second(&mut self.board);
            out_events.push(Event::CountdownTicked { time_remaining });
            if time_remaining == 0 {
                self.end(EndReason::TimeExpired, out_events);
                return;
            }
        }

        let stage = self
            .difficulty
            .stage(self.elapsed, self.board.time_remaining());
        if stage != self.stage {
            debug!(from = self.stage.get(), to = stage.get(), "difficulty stage changed");
            self.stage = stage;
            out_events.push(Event::StageChanged { stage });
        }
    }

    fn show(
        &mut self,
        slot: SlotId,
        kind: EntityKind,
        hold: Duration,
        rise: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let definition = self.difficulty.catalog().get(kind);
        let Some(target) = self.slot_mut(slot) else {
            debug!(slot = slot.get(), "show requested for unknown slot");
            return;
        };

        match target.show(definition, hold) {
            Some(hits_remaining) => out_events.push(Event::EntityShown {
                slot,
                kind,
                hits_remaining,
                hold,
                rise,
            }),
            None => debug!(slot = slot.get(), kind = kind.id(), "slot cannot show entity"),
        }
    }

    fn hit(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        let Some(target) = self.slot_mut(slot) else {
            debug!(slot = slot.get(), "hit on unknown slot");
            return;
        };

        match target.hit() {
            SlotHit::Ignored => debug!(slot = slot.get(), "hit on hidden slot"),
            SlotHit::Partial {
                kind,
                hits_remaining,
            } => out_events.push(Event::EntityPartiallyHit {
                slot,
                kind,
                hits_remaining,
            }),
            SlotHit::Completed { kind } => {
                let definition = self.difficulty.catalog().get(kind);
                let effect = self.scoring.apply_completed_hit(
                    &mut self.board,
                    definition,
                    self.elapsed,
                    &mut self.rng,
                );
                out_events.push(Event::EntityCompleted {
                    slot,
                    kind,
                    effect,
                    score: self.board.score(),
                    combo: self.board.combo(),
                    time_remaining: self.board.time_remaining(),
                });

                if self.board.time_remaining() == 0 {
                    self.end(EndReason::TimeExpired, out_events);
                }
            }
        }
    }

    fn near_miss(&mut self, slot: SlotId, point: WorldPoint, out_events: &mut Vec<Event>) {
        let visible = self
            .slots
            .iter()
            .any(|candidate| candidate.id() == slot && candidate.is_visible());
        if !visible {
            debug!(slot = slot.get(), "near miss against hidden slot ignored");
            return;
        }

        self.scoring.register_near_miss(&mut self.board);
        out_events.push(Event::NearMiss {
            slot,
            point,
            miss_count: self.board.miss_count(),
        });
    }

    fn configure_layout(&mut self, layout: SlotLayout, out_events: &mut Vec<Event>) {
        if layout.slot_count() as usize != self.slots.len() {
            debug!(
                expected = self.slots.len(),
                received = layout.slot_count(),
                "layout slot count mismatch"
            );
            return;
        }

        for slot in &mut self.slots {
            if let Some(region) = layout.region(slot.id()) {
                slot.set_region(region);
            }
        }
        self.layout = layout;
        out_events.push(Event::LayoutConfigured { layout });
    }

    fn end(&mut self, reason: EndReason, out_events: &mut Vec<Event>) {
        match self.status {
            SessionStatus::Ended => return,
            SessionStatus::Waiting => {
                self.status = SessionStatus::Ended;
                info!(?reason, "session closed before it started");
                return;
            }
            SessionStatus::Running | SessionStatus::Paused => {}
        }

        for slot in &mut self.slots {
            if slot.clear().is_some() {
                out_events.push(Event::SlotCleared { slot: slot.id() });
            }
        }

        let finished = self.scoring.finalize(&mut self.board);
        let result = SessionResult {
            score: finished.score,
            raw_score: finished.raw_score,
            bonus_applied: finished.bonus_applied,
            miss_count: self.board.miss_count(),
            perfect_hit_count: self.board.perfect_hit_count(),
            reason,
        };
        self.status = SessionStatus::Ended;
        self.result = Some(result);

        info!(
            score = result.score,
            raw_score = result.raw_score,
            bonus = result.bonus_applied,
            ?reason,
            "session ended"
        );
        out_events.push(Event::SessionEnded { result });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match (session.status, command) {
        (SessionStatus::Ended, command) => {
            debug!(?command, "session ended; command ignored");
        }
        (SessionStatus::Waiting, Command::Start) => session.start(out_events),
        (SessionStatus::Running, Command::Pause) => {
            session.status = SessionStatus::Paused;
            info!(elapsed_ms = session.elapsed.as_millis() as u64, "session paused");
            out_events.push(Event::SessionPaused);
        }
        (SessionStatus::Paused, Command::Resume) => {
            session.status = SessionStatus::Running;
            info!(elapsed_ms = session.elapsed.as_millis() as u64, "session resumed");
            out_events.push(Event::SessionResumed);
        }
        (SessionStatus::Running, Command::Tick { dt }) => session.tick(dt, out_events),
        (
            SessionStatus::Running,
            Command::ShowEntity {
                slot,
                kind,
                hold,
                rise,
            },
        ) => session.show(slot, kind, hold, rise, out_events),
        (SessionStatus::Running, Command::HitSlot { slot }) => session.hit(slot, out_events),
        (SessionStatus::Running, Command::RegisterNearMiss { slot, point }) => {
            session.near_miss(slot, point, out_events);
        }
        (_, Command::End) => session.end(EndReason::Requested, out_events),
        (_, Command::Terminate) => session.end(EndReason::ForcedTermination, out_events),
        (_, Command::ConfigureLayout { layout }) => session.configure_layout(layout, out_events),
        (status, command) => {
            debug!(?status, ?command, "command not valid in current state");
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use super::Session;
    use wegen_arcade_core::{
        DifficultyStage, EntityCatalog, SessionResult, SessionSnapshot, SessionStatus,
        SlotLayout, SlotView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(session: &Session) -> &'static str {
        session.banner
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(session: &Session) -> SessionStatus {
        session.status
    }

    /// Difficulty stage derived on the latest tick.
    #[must_use]
    pub fn stage(session: &Session) -> DifficultyStage {
        session.stage
    }

    /// Active time since the session started.
    #[must_use]
    pub fn elapsed(session: &Session) -> Duration {
        session.elapsed
    }

    /// Layout currently applied to the slot regions.
    #[must_use]
    pub fn layout(session: &Session) -> SlotLayout {
        session.layout
    }

    /// Catalog backing the session's entities.
    #[must_use]
    pub fn catalog(session: &Session) -> &'static EntityCatalog {
        session.difficulty.catalog()
    }

    /// Captures the session counters.
    #[must_use]
    pub fn snapshot(session: &Session) -> SessionSnapshot {
        SessionSnapshot {
            status: session.status,
            stage: session.stage,
            elapsed: session.elapsed,
            time_remaining: session.board.time_remaining(),
            score: session.board.score(),
            combo: session.board.combo(),
            miss_count: session.board.miss_count(),
            perfect_hit_count: session.board.perfect_hit_count(),
        }
    }

    /// Captures a read-only view of every slot.
    #[must_use]
    pub fn slot_view(session: &Session) -> SlotView {
        SlotView::from_snapshots(session.slots.iter().map(|slot| slot.snapshot()).collect())
    }

    /// Final result, once the session ended after running.
    #[must_use]
    pub fn result(session: &Session) -> Option<SessionResult> {
        session.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_waits_with_hidden_grid() {
        let session = Session::default();
        assert_eq!(query::status(&session), SessionStatus::Waiting);
        assert_eq!(query::welcome_banner(&session), WELCOME_BANNER);

        let view = query::slot_view(&session);
        assert_eq!(view.iter().count(), 9);
        assert_eq!(view.visible().count(), 0);
    }

    #[test]
    fn tick_before_start_is_ignored() {
        let mut session = Session::default();
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::snapshot(&session).time_remaining, 30);
    }

    #[test]
    fn ending_unstarted_session_emits_nothing() {
        let mut session = Session::default();
        let mut events = Vec::new();
        apply(&mut session, Command::End, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::status(&session), SessionStatus::Ended);
        assert_eq!(query::result(&session), None);

        apply(&mut session, Command::Start, &mut events);
        assert!(events.is_empty());
    }
}
