//! Headless game loop wiring the session to every system and adapter.

use std::time::Duration;

use tracing::info;
use wegen_arcade_core::{Command, Event, GameConfig, SessionResult, SessionStatus};
use wegen_arcade_presentation::{AudioBackend, Presenter, Renderer};
use wegen_arcade_session::{self as session, query, Session};
use wegen_arcade_system_difficulty::DifficultyEngine;
use wegen_arcade_system_input::InputResolver;
use wegen_arcade_system_spawning::{Config as SpawnConfig, Spawning};

use crate::bot::Bot;

/// Host-side events scheduled against the session clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RunPlan {
    pub(crate) frame: Duration,
    pub(crate) pause_at: Option<Duration>,
    pub(crate) pause_for: Duration,
    pub(crate) terminate_at: Option<Duration>,
    pub(crate) max_wall_time: Duration,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(16),
            pause_at: None,
            pause_for: Duration::from_secs(2),
            terminate_at: None,
            max_wall_time: Duration::from_secs(600),
        }
    }
}

/// Owns one session together with the systems that drive it.
pub(crate) struct Simulation<R, A> {
    session: Session,
    spawning: Spawning,
    resolver: InputResolver,
    difficulty: DifficultyEngine,
    presenter: Presenter<R, A>,
    bot: Bot,
}

impl<R, A> Simulation<R, A>
where
    R: Renderer,
    A: AudioBackend,
{
    pub(crate) fn new(config: &GameConfig, bot: Bot, renderer: R, audio: A) -> Self {
        let session = Session::new(&config.session);
        let layout = query::layout(&session);
        Self {
            session,
            spawning: Spawning::new(SpawnConfig::from(&config.spawn)),
            resolver: InputResolver::from(&config.session),
            difficulty: DifficultyEngine::default(),
            presenter: Presenter::new(renderer, audio, layout),
            bot,
        }
    }

    pub(crate) fn presenter(&self) -> &Presenter<R, A> {
        &self.presenter
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Plays the session to completion and returns its result.
    ///
    /// Returns `None` only when the session never started.
    pub(crate) fn run(&mut self, plan: &RunPlan) -> Option<SessionResult> {
        let _ = self.apply(Command::Start);

        let mut wall = Duration::ZERO;
        let mut paused_since: Option<Duration> = None;
        let mut pause_pending = plan.pause_at.is_some();

        while query::status(&self.session) != SessionStatus::Ended && wall < plan.max_wall_time {
            wall += plan.frame;
            let elapsed = query::elapsed(&self.session);

            if plan.terminate_at.is_some_and(|at| elapsed >= at) {
                info!(elapsed_ms = elapsed.as_millis() as u64, "host terminating");
                let _ = self.apply(Command::Terminate);
                break;
            }

            if pause_pending && plan.pause_at.is_some_and(|at| elapsed >= at) {
                pause_pending = false;
                paused_since = Some(wall);
                let _ = self.apply(Command::Pause);
            }
            if let Some(since) = paused_since {
                if wall.saturating_sub(since) >= plan.pause_for {
                    paused_since = None;
                    let _ = self.apply(Command::Resume);
                }
            }

            self.frame(plan.frame);
        }

        if query::status(&self.session) != SessionStatus::Ended {
            let _ = self.apply(Command::End);
        }
        query::result(&self.session)
    }

    fn frame(&mut self, dt: Duration) {
        let events = self.apply(Command::Tick { dt });

        let mut commands = Vec::new();
        self.spawning.handle(
            &events,
            &query::snapshot(&self.session),
            &query::slot_view(&self.session),
            &self.difficulty,
            &mut commands,
        );
        self.apply_all(commands);

        let view = query::slot_view(&self.session);
        let Some(press) = self.bot.press(dt, &view) else {
            return;
        };
        let mut commands = Vec::new();
        self.resolver
            .handle(&[press], &query::snapshot(&self.session), &view, &mut commands);
        self.apply_all(commands);
    }

    fn apply_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            let _ = self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        session::apply(&mut self.session, command, &mut events);
        self.presenter.present(&events);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogAudio, LogRenderer};
    use wegen_arcade_core::EndReason;
    use wegen_arcade_presentation::AudioCue;

    fn simulation(audio: LogAudio) -> Simulation<LogRenderer, LogAudio> {
        simulation_with(&GameConfig::default(), audio)
    }

    fn simulation_with(config: &GameConfig, audio: LogAudio) -> Simulation<LogRenderer, LogAudio> {
        let bot = Bot::new(11, 0.8, 20.0, Duration::from_millis(250));
        Simulation::new(config, bot, LogRenderer::default(), audio)
    }

    #[test]
    fn session_runs_until_time_expires() {
        let mut simulation = simulation(LogAudio::default());
        let result = simulation.run(&RunPlan::default()).expect("result");

        assert_eq!(result.reason, EndReason::TimeExpired);
        assert_eq!(simulation.presenter().renderer().on_screen(), 0);
        assert_eq!(query::snapshot(simulation.session()).time_remaining, 0);
    }

    #[test]
    fn pause_stretches_wall_time_but_not_session_time() {
        let plan = RunPlan {
            pause_at: Some(Duration::from_secs(3)),
            terminate_at: Some(Duration::from_secs(5)),
            ..RunPlan::default()
        };
        let mut config = GameConfig::default();
        config.session.time_bank_secs = 300;
        let mut simulation = simulation_with(&config, LogAudio::default());
        let result = simulation.run(&plan).expect("result");

        assert_eq!(result.reason, EndReason::ForcedTermination);
        let elapsed = query::elapsed(simulation.session());
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[test]
    fn missing_audio_never_interrupts_play() {
        let mut simulation = simulation(LogAudio::without(AudioCue::ALL));
        let result = simulation.run(&RunPlan::default());

        assert!(result.is_some());
        assert!(simulation.presenter().audio().is_muted());
    }

    #[test]
    fn wall_time_cap_ends_session() {
        let plan = RunPlan {
            max_wall_time: Duration::from_secs(1),
            ..RunPlan::default()
        };
        let mut simulation = simulation(LogAudio::default());
        let result = simulation.run(&plan).expect("result");
        assert_eq!(result.reason, EndReason::Requested);
    }
}
