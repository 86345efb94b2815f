use std::{collections::HashSet, time::Duration};

use wegen_arcade_core::{
    Command, DifficultyStage, EntityKind, Event, SessionSnapshot, SessionStatus, SlotId,
    SlotLayout, SlotSnapshot, SlotView, WorldPoint,
};
use wegen_arcade_system_difficulty::DifficultyEngine;
use wegen_arcade_system_spawning::{Config, Spawning};

fn session(status: SessionStatus, stage: DifficultyStage, time_remaining: u32) -> SessionSnapshot {
    SessionSnapshot {
        status,
        stage,
        elapsed: Duration::ZERO,
        time_remaining,
        score: 0,
        combo: 0,
        miss_count: 0,
        perfect_hit_count: 0,
    }
}

fn grid(visible: &[u32]) -> SlotView {
    let layout = SlotLayout::new(3, 3, 100.0, WorldPoint::new(0.0, 0.0));
    let snapshots = (0..layout.slot_count())
        .filter_map(|index| {
            let id = SlotId::new(index);
            let region = layout.region(id)?;
            let shown = visible.contains(&index);
            Some(SlotSnapshot {
                id,
                region,
                occupant: shown.then_some(EntityKind::WegenNormal),
                hits_remaining: u32::from(shown),
                visible: shown,
                hold_remaining: shown.then_some(Duration::from_millis(500)),
            })
        })
        .collect();
    SlotView::from_snapshots(snapshots)
}

fn advanced(millis: u64) -> Vec<Event> {
    vec![Event::TimeAdvanced {
        dt: Duration::from_millis(millis),
    }]
}

fn shown_slots(commands: &[Command]) -> Vec<SlotId> {
    commands
        .iter()
        .map(|command| match command {
            Command::ShowEntity { slot, .. } => *slot,
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect()
}

#[test]
fn emits_one_spawn_per_elapsed_interval() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();

    spawning.handle(
        &advanced(3_000),
        &session(SessionStatus::Running, DifficultyStage::One, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );

    let slots = shown_slots(&commands);
    assert_eq!(slots.len(), 3, "expected one spawn per interval");
    let unique: HashSet<_> = slots.iter().collect();
    assert_eq!(unique.len(), 3, "one batch never reuses a slot");
}

#[test]
fn shown_entities_carry_stage_scaled_timings() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();

    spawning.handle(
        &advanced(1_000),
        &session(SessionStatus::Running, DifficultyStage::Two, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );

    assert_eq!(commands.len(), 1);
    let Command::ShowEntity {
        kind, hold, rise, ..
    } = commands[0]
    else {
        panic!("expected show command");
    };
    let timing = difficulty.timing(kind, DifficultyStage::Two);
    assert_eq!(hold, timing.hold);
    assert_eq!(rise, timing.rise);
}

#[test]
fn full_grid_consumes_attempt_without_spawning() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();
    let all: Vec<u32> = (0..9).collect();

    spawning.handle(
        &advanced(1_000),
        &session(SessionStatus::Running, DifficultyStage::Four, 30),
        &grid(&all),
        &difficulty,
        &mut commands,
    );

    assert!(commands.is_empty());
    assert_eq!(spawning.accumulated(), Duration::ZERO);
}

#[test]
fn only_hidden_slots_are_chosen() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let visible = [0, 1, 2, 3, 4, 5, 6];

    for _ in 0..50 {
        let mut commands = Vec::new();
        spawning.handle(
            &advanced(1_000),
            &session(SessionStatus::Running, DifficultyStage::Four, 30),
            &grid(&visible),
            &difficulty,
            &mut commands,
        );
        for slot in shown_slots(&commands) {
            assert!(slot.get() >= 7, "slot {slot:?} was already visible");
        }
    }
}

#[test]
fn late_stages_sometimes_spawn_two_entities() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut sizes = HashSet::new();

    for _ in 0..64 {
        let mut commands = Vec::new();
        spawning.handle(
            &advanced(1_000),
            &session(SessionStatus::Running, DifficultyStage::Three, 30),
            &grid(&[]),
            &difficulty,
            &mut commands,
        );
        let _ = sizes.insert(commands.len());
    }

    assert_eq!(sizes, HashSet::from([1, 2]));
}

#[test]
fn final_phase_uses_faster_interval() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();

    spawning.handle(
        &advanced(1_800),
        &session(SessionStatus::Running, DifficultyStage::One, 19),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );

    assert_eq!(commands.len(), 3, "600ms cadence fits three times");
    assert_eq!(spawning.accumulated(), Duration::ZERO);
}

#[test]
fn pause_preserves_partial_progress() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();

    spawning.handle(
        &advanced(700),
        &session(SessionStatus::Running, DifficultyStage::One, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );
    assert!(commands.is_empty(), "no spawn before full interval");

    spawning.handle(
        &[Event::SessionPaused],
        &session(SessionStatus::Paused, DifficultyStage::One, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );
    assert_eq!(spawning.accumulated(), Duration::from_millis(700));

    spawning.handle(
        &advanced(300),
        &session(SessionStatus::Running, DifficultyStage::One, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );
    assert_eq!(commands.len(), 1, "expected spawn after full interval");
}

#[test]
fn ended_session_resets_progress() {
    let difficulty = DifficultyEngine::default();
    let mut spawning = Spawning::new(Config::default());
    let mut commands = Vec::new();

    spawning.handle(
        &advanced(900),
        &session(SessionStatus::Running, DifficultyStage::One, 30),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );
    spawning.handle(
        &advanced(900),
        &session(SessionStatus::Ended, DifficultyStage::One, 0),
        &grid(&[]),
        &difficulty,
        &mut commands,
    );

    assert!(commands.is_empty());
    assert_eq!(spawning.accumulated(), Duration::ZERO);
}

#[test]
fn identical_seeds_replay_identically() {
    let run = |seed: u64| {
        let difficulty = DifficultyEngine::default();
        let config = Config::new(
            Duration::from_millis(1_000),
            Duration::from_millis(600),
            20,
            seed,
        );
        let mut spawning = Spawning::new(config);
        let mut commands = Vec::new();
        for stage in DifficultyStage::ALL {
            spawning.handle(
                &advanced(5_000),
                &session(SessionStatus::Running, stage, 30),
                &grid(&[]),
                &difficulty,
                &mut commands,
            );
        }
        commands
    };

    assert_eq!(run(0x4d59_5df4_d0f3_3173), run(0x4d59_5df4_d0f3_3173));
    assert_ne!(run(1), run(2), "distinct seeds should diverge");
}
