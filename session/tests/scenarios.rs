use std::time::Duration;

use wegen_arcade_core::{
    Command, EndReason, EntityKind, Event, HitEffect, SessionConfig, SessionStatus, SlotId,
    SlotLayout, WorldPoint,
};
use wegen_arcade_session::{self as session, query, Session};

fn started(config: &SessionConfig) -> Session {
    let mut session = Session::new(config);
    let events = pump(&mut session, Command::Start);
    assert!(matches!(events[0], Event::SessionStarted { .. }));
    session
}

fn pump(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    session::apply(session, command, &mut events);
    events
}

fn tick(session: &mut Session, millis: u64) -> Vec<Event> {
    pump(
        session,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

fn show(session: &mut Session, slot: u32, kind: EntityKind) -> Vec<Event> {
    let timing = query::catalog(session).get(kind);
    pump(
        session,
        Command::ShowEntity {
            slot: SlotId::new(slot),
            kind,
            hold: timing.hold(),
            rise: timing.rise(),
        },
    )
}

fn show_for(session: &mut Session, slot: u32, kind: EntityKind, hold: Duration) -> Vec<Event> {
    pump(
        session,
        Command::ShowEntity {
            slot: SlotId::new(slot),
            kind,
            hold,
            rise: Duration::from_millis(100),
        },
    )
}

fn hit(session: &mut Session, slot: u32) -> Vec<Event> {
    pump(
        session,
        Command::HitSlot {
            slot: SlotId::new(slot),
        },
    )
}

fn completed_effect(events: &[Event]) -> Option<HitEffect> {
    events.iter().find_map(|event| match event {
        Event::EntityCompleted { effect, .. } => Some(*effect),
        _ => None,
    })
}

fn ended_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::SessionEnded { .. }))
        .count()
}

#[test]
fn quick_second_hit_earns_combo_points() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenNormal);
    let _ = show(&mut session, 1, EntityKind::WegenNormal);

    let first = hit(&mut session, 0);
    assert_eq!(completed_effect(&first), Some(HitEffect::Points { awarded: 10 }));

    let _ = tick(&mut session, 500);
    let second = hit(&mut session, 1);
    assert_eq!(completed_effect(&second), Some(HitEffect::Points { awarded: 11 }));

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.score, 21);
    assert_eq!(snapshot.combo, 2);
}

#[test]
fn bomb_clamps_score_and_drains_time() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenNormal);
    let _ = hit(&mut session, 0);
    assert_eq!(query::snapshot(&session).score, 10);

    let _ = show(&mut session, 1, EntityKind::Bomb);
    let events = hit(&mut session, 1);
    assert_eq!(
        completed_effect(&events),
        Some(HitEffect::Bomb {
            score_lost: 10,
            seconds_lost: 15
        })
    );

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.combo, 0);
    assert_eq!(snapshot.time_remaining, 15);
    assert_eq!(snapshot.status, SessionStatus::Running);
}

#[test]
fn bomb_that_empties_time_bank_ends_session_immediately() {
    let config = SessionConfig {
        time_bank_secs: 3,
        ..SessionConfig::default()
    };
    let mut session = started(&config);
    let _ = show(&mut session, 2, EntityKind::Bomb);
    let _ = show(&mut session, 5, EntityKind::WegenNormal);

    let events = hit(&mut session, 2);
    assert_eq!(query::status(&session), SessionStatus::Ended);
    assert_eq!(ended_count(&events), 1);
    assert!(events.contains(&Event::SlotCleared {
        slot: SlotId::new(5)
    }));

    let Some(Event::SessionEnded { result }) = events.last() else {
        panic!("session did not end: {events:?}");
    };
    assert_eq!(result.reason, EndReason::TimeExpired);
    assert_eq!(query::snapshot(&session).time_remaining, 0);
    assert_eq!(query::slot_view(&session).visible().count(), 0);
}

#[test]
fn flawless_run_multiplies_final_score() {
    let config = SessionConfig {
        time_bank_secs: 200,
        ..SessionConfig::default()
    };
    let mut session = started(&config);
    let hold = Duration::from_secs(60);

    let _ = show_for(&mut session, 0, EntityKind::WegenGolden, hold);
    let _ = hit(&mut session, 0);

    for _ in 0..9 {
        let _ = tick(&mut session, 1_000);
        let _ = show_for(&mut session, 1, EntityKind::Bomb, hold);
        let _ = hit(&mut session, 1);

        let _ = tick(&mut session, 1_000);
        let _ = show_for(&mut session, 2, EntityKind::WegenArmored, hold);
        for _ in 0..3 {
            let _ = hit(&mut session, 2);
        }
    }

    let _ = tick(&mut session, 1_000);
    let _ = show_for(&mut session, 3, EntityKind::WegenArmored, hold);
    for _ in 0..3 {
        let _ = hit(&mut session, 3);
    }

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.score, 100);
    assert_eq!(snapshot.perfect_hit_count, 11);
    assert_eq!(snapshot.miss_count, 0);

    let events = pump(&mut session, Command::End);
    let Some(Event::SessionEnded { result }) = events.last() else {
        panic!("session did not end: {events:?}");
    };
    assert_eq!(result.raw_score, 100);
    assert_eq!(result.score, 150);
    assert!(result.bonus_applied);
    assert_eq!(result.reason, EndReason::Requested);
}

#[test]
fn ending_twice_emits_result_once() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenNormal);
    let _ = hit(&mut session, 0);

    let mut events = pump(&mut session, Command::End);
    events.extend(pump(&mut session, Command::End));
    events.extend(pump(&mut session, Command::Terminate));

    assert_eq!(ended_count(&events), 1);
    assert_eq!(query::result(&session).map(|result| result.score), Some(10));

    let after = tick(&mut session, 5_000);
    assert!(after.is_empty(), "ended sessions ignore every command");
}

#[test]
fn terminate_reports_forced_termination() {
    let mut session = started(&SessionConfig::default());
    let events = pump(&mut session, Command::Terminate);
    let Some(Event::SessionEnded { result }) = events.last() else {
        panic!("session did not end: {events:?}");
    };
    assert_eq!(result.reason, EndReason::ForcedTermination);
}

#[test]
fn pause_freezes_every_timer() {
    let mut session = started(&SessionConfig::default());
    let _ = show_for(&mut session, 4, EntityKind::WegenNormal, Duration::from_millis(1_200));
    let _ = tick(&mut session, 500);

    assert_eq!(pump(&mut session, Command::Pause), vec![Event::SessionPaused]);
    let before = query::snapshot(&session);
    let slots_before = query::slot_view(&session).into_vec();

    assert!(tick(&mut session, 10_000).is_empty());
    assert!(hit(&mut session, 4).is_empty(), "paused sessions ignore hits");
    assert_eq!(query::snapshot(&session), before);
    assert_eq!(query::slot_view(&session).into_vec(), slots_before);
    assert_eq!(
        slots_before[4].hold_remaining,
        Some(Duration::from_millis(700))
    );

    assert_eq!(
        pump(&mut session, Command::Resume),
        vec![Event::SessionResumed]
    );
    let events = tick(&mut session, 700);
    assert!(events.contains(&Event::EntityExpired {
        slot: SlotId::new(4),
        kind: EntityKind::WegenNormal,
    }));
    assert_eq!(query::snapshot(&session).time_remaining, 29);
}

#[test]
fn armored_entity_scores_only_on_final_hit() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenArmored);

    let first = hit(&mut session, 0);
    assert_eq!(
        first,
        vec![Event::EntityPartiallyHit {
            slot: SlotId::new(0),
            kind: EntityKind::WegenArmored,
            hits_remaining: 2,
        }]
    );
    let _ = hit(&mut session, 0);
    assert_eq!(query::snapshot(&session).score, 0);

    let last = hit(&mut session, 0);
    assert_eq!(completed_effect(&last), Some(HitEffect::Points { awarded: 25 }));
    assert_eq!(query::snapshot(&session).perfect_hit_count, 1);
    assert!(hit(&mut session, 0).is_empty(), "slot hid after completion");
}

#[test]
fn expired_entity_never_scores() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenNormal);

    let events = tick(&mut session, 1_200);
    assert!(events.contains(&Event::EntityExpired {
        slot: SlotId::new(0),
        kind: EntityKind::WegenNormal,
    }));
    assert!(hit(&mut session, 0).is_empty());

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.miss_count, 0);
}

#[test]
fn near_miss_breaks_combo_and_counts() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 0, EntityKind::WegenNormal);
    let _ = show(&mut session, 1, EntityKind::WegenNormal);
    let _ = hit(&mut session, 0);

    let events = pump(
        &mut session,
        Command::RegisterNearMiss {
            slot: SlotId::new(1),
            point: WorldPoint::new(230.0, 60.0),
        },
    );
    assert_eq!(
        events,
        vec![Event::NearMiss {
            slot: SlotId::new(1),
            point: WorldPoint::new(230.0, 60.0),
            miss_count: 1,
        }]
    );

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.combo, 0);
    assert_eq!(snapshot.miss_count, 1);

    let hidden = pump(
        &mut session,
        Command::RegisterNearMiss {
            slot: SlotId::new(7),
            point: WorldPoint::new(0.0, 0.0),
        },
    );
    assert!(hidden.is_empty(), "near misses need a visible slot");
}

#[test]
fn visible_slot_rejects_overlapping_show() {
    let mut session = started(&SessionConfig::default());
    assert_eq!(show(&mut session, 3, EntityKind::Clock).len(), 1);
    assert!(show(&mut session, 3, EntityKind::Bomb).is_empty());
    assert!(show(&mut session, 42, EntityKind::Bomb).is_empty());

    let view = query::slot_view(&session);
    let slot = view
        .iter()
        .find(|slot| slot.id == SlotId::new(3))
        .expect("slot exists");
    assert_eq!(slot.occupant, Some(EntityKind::Clock));
}

#[test]
fn layout_change_keeps_entities_and_timers() {
    let mut session = started(&SessionConfig::default());
    let _ = show(&mut session, 4, EntityKind::WegenGolden);
    let _ = tick(&mut session, 250);
    let before = query::snapshot(&session);

    let layout = SlotLayout::new(3, 3, 200.0, WorldPoint::new(40.0, 40.0));
    let events = pump(&mut session, Command::ConfigureLayout { layout });
    assert_eq!(events, vec![Event::LayoutConfigured { layout }]);
    assert_eq!(query::layout(&session), layout);
    assert_eq!(query::snapshot(&session), before);

    let view = query::slot_view(&session).into_vec();
    assert!(view[4].visible);
    assert_eq!(view[4].hold_remaining, Some(Duration::from_millis(500)));
    assert_eq!(Some(view[4].region), layout.region(SlotId::new(4)));

    let mismatched = SlotLayout::new(4, 4, 100.0, WorldPoint::new(0.0, 0.0));
    assert!(pump(
        &mut session,
        Command::ConfigureLayout { layout: mismatched }
    )
    .is_empty());
    assert_eq!(query::layout(&session), layout);
}

#[test]
fn countdown_expiry_clears_grid_then_ends() {
    let mut session = started(&SessionConfig::default());
    let _ = show_for(&mut session, 8, EntityKind::Mystery, Duration::from_secs(120));

    let events = tick(&mut session, 30_000);
    let countdowns = events
        .iter()
        .filter(|event| matches!(event, Event::CountdownTicked { .. }))
        .count();
    assert_eq!(countdowns, 30);

    let cleared = events
        .iter()
        .position(|event| *event == Event::SlotCleared { slot: SlotId::new(8) })
        .expect("visible slot cleared");
    let ended = events
        .iter()
        .position(|event| matches!(event, Event::SessionEnded { .. }))
        .expect("session ended");
    assert!(cleared < ended);
    assert_eq!(ended, events.len() - 1);
}

#[test]
fn stage_rises_as_time_passes() {
    let config = SessionConfig {
        time_bank_secs: 39,
        ..SessionConfig::default()
    };
    let mut session = started(&config);
    assert_eq!(query::stage(&session).get(), 1);

    let _ = show_for(&mut session, 0, EntityKind::Clock, Duration::from_secs(30));
    let events = hit(&mut session, 0);
    assert!(completed_effect(&events).is_some());
    let events = tick(&mut session, 100);
    assert!(
        events.iter().any(|event| matches!(event, Event::StageChanged { stage } if stage.get() == 3)),
        "a time bank of 44s reaches stage three: {events:?}"
    );
}
