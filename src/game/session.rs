//! Session state machine and the per-tick simulation pipeline.

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::collision::{CollisionSystem, DamageOutcome, DamageState};
use super::obstacle::{Obstacle, ObstacleField};
use super::recorder::{SessionRecorder, VocalProfile};
use super::SessionState;
use crate::audio::SpectrumFrame;
use crate::error::SessionError;
use crate::params::GameConfig;
use crate::pitch::{ControlSignalSmoother, FrequencyExtractor, FrequencySample, NoteLabel};
use crate::recommend::{
    RecommendationResult, RecommendationScorer, ScoringProfile, SongEntry, UserPreferences,
};

/// Why a session reached `Ended`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    LivesExhausted,
    Stopped,
}

/// Frozen outcome of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub score: u32,
    pub lives_remaining: u32,
    pub max_lives: u32,
    pub ticks: u64,
    pub vocal_profile: VocalProfile,
    pub range_semitones: u32,
    pub capture_available: bool,
    pub reason: EndReason,
}

/// Notifications pushed to the host as they happen
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    ScoreChanged { score: u32 },
    LivesChanged { lives: u32 },
    InvulnerabilityEnded,
    Paused,
    Resumed,
    Ended(SessionResult),
    /// Capture could not be opened; the session runs as no-signal
    CaptureUnavailable { reason: String },
    /// Capture came up after an earlier failure
    CaptureRestored,
}

/// What one call to [`GameSessionController::tick`] did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub state: SessionState,
    pub tick: u64,
    pub sample: Option<FrequencySample>,
    pub note: NoteLabel,
    pub position: f64,
    pub collided: bool,
    pub damage: DamageOutcome,
    pub passed: u32,
    pub score: u32,
    pub lives: u32,
}

/// Owns all per-session state. One instance per session; nothing global.
pub struct GameSessionController<R: Rng = StdRng> {
    config: GameConfig,
    state: SessionState,
    tick: u64,
    score: u32,
    damage: DamageState,
    obstacles: ObstacleField,
    collision: CollisionSystem,
    smoother: ControlSignalSmoother,
    recorder: SessionRecorder,
    extractor: FrequencyExtractor,
    capture_available: bool,
    result: Option<SessionResult>,
    rng: R,
    events: Option<Sender<SessionEvent>>,
}

impl GameSessionController<StdRng> {
    /// Controller with a reproducible RNG
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: GameConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }
}

impl<R: Rng> GameSessionController<R> {
    pub fn new(config: GameConfig, rng: R) -> Self {
        let obstacles = ObstacleField::new(config.obstacles.clone(), &config.playfield);
        let collision = CollisionSystem::new(&config.playfield, config.obstacles.width_px);
        let smoother = ControlSignalSmoother::new(config.control.clone(), &config.playfield);
        let extractor = FrequencyExtractor::new(config.extractor.clone());
        let damage = DamageState::new(config.session.max_lives);

        Self {
            config,
            state: SessionState::Idle,
            tick: 0,
            score: 0,
            damage,
            obstacles,
            collision,
            smoother,
            recorder: SessionRecorder::new(),
            extractor,
            capture_available: true,
            result: None,
            rng,
            events: None,
        }
    }

    /// Attach an event channel
    pub fn with_events(mut self, sender: Sender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.damage.lives()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn invulnerable_until(&self) -> Option<u64> {
        self.damage.invulnerable_until()
    }

    pub fn position(&self) -> f64 {
        self.smoother.position()
    }

    pub fn target_frequency(&self) -> f64 {
        self.smoother.target_hz()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.obstacles.obstacles()
    }

    pub fn vocal_profile(&self) -> &VocalProfile {
        self.recorder.profile()
    }

    pub fn capture_available(&self) -> bool {
        self.capture_available
    }

    /// Available once the session has ended
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Record that audio capture could not be acquired. The session keeps
    /// running on silence.
    pub fn report_capture_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%reason, "Audio capture unavailable, continuing without input");
        self.capture_available = false;
        self.emit(SessionEvent::CaptureUnavailable { reason });
    }

    /// Record that audio capture came up after an earlier failure
    pub fn report_capture_restored(&mut self) {
        if !self.capture_available {
            info!("Audio capture restored");
            self.capture_available = true;
            self.emit(SessionEvent::CaptureRestored);
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Ended => {
                self.clear_session();
                self.state = SessionState::Running;
                info!(max_lives = self.damage.max_lives(), "Session started");
                self.emit(SessionEvent::Started);
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "start",
            }),
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Paused;
                debug!(tick = self.tick, "Session paused");
                self.emit(SessionEvent::Paused);
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "pause",
            }),
        }
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Paused => {
                self.state = SessionState::Running;
                debug!(tick = self.tick, "Session resumed");
                self.emit(SessionEvent::Resumed);
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "resume",
            }),
        }
    }

    /// Explicit teardown of a live session
    pub fn end(&mut self) -> Result<&SessionResult, SessionError> {
        match self.state {
            SessionState::Running | SessionState::Paused => Ok(self.finish(EndReason::Stopped)),
            from => Err(SessionError::InvalidTransition { from, action: "end" }),
        }
    }

    /// Back to `Idle` from any state, discarding the result
    pub fn reset(&mut self) {
        self.clear_session();
        self.state = SessionState::Idle;
        debug!("Session reset");
    }

    /// Advance one simulation step. `frame` is the newest spectrum if the
    /// sampler produced one since the last tick.
    pub fn tick(&mut self, frame: Option<&SpectrumFrame>) -> TickReport {
        match self.state {
            SessionState::Running => self.tick_running(frame),
            SessionState::Paused => {
                // Keep listening while frozen: the target frequency tracks the
                // voice, nothing else moves.
                let frequency = self.extract(frame);
                self.smoother.observe(frequency);
                self.report(frame.map(|_| FrequencySample::new(frequency, self.tick)))
            }
            SessionState::Idle | SessionState::Ended => self.report(None),
        }
    }

    fn tick_running(&mut self, frame: Option<&SpectrumFrame>) -> TickReport {
        self.tick += 1;
        let now = self.tick;

        // 1. Extraction
        let frequency = self.extract(frame);
        let sample = frame.map(|_| FrequencySample::new(frequency, now));

        // 2. Smoothing
        self.smoother.observe(frequency);
        let position = self.smoother.advance();

        // 3. Obstacles
        self.obstacles.tick(self.config.obstacles.speed_px_per_tick);
        self.obstacles.maybe_spawn(
            self.config.playfield.width_px,
            self.config.obstacles.spawn_spacing_px,
            &mut self.rng,
        );

        // 4. Collision and damage
        if self.damage.expire(now) {
            self.emit(SessionEvent::InvulnerabilityEnded);
        }
        let collided = self.collision.detect(position, self.obstacles.obstacles());
        let damage = self.damage.apply(
            collided,
            now,
            self.config.session.invulnerability_grace_ticks,
        );
        if matches!(damage, DamageOutcome::Hit { .. } | DamageOutcome::Fatal) {
            self.emit(SessionEvent::LivesChanged {
                lives: self.damage.lives(),
            });
        }

        // 5. Score and recorder
        let passed = self
            .obstacles
            .mark_passed_and_score(self.config.playfield.actor_leading_edge_x());
        if passed > 0 {
            self.score = self.score.saturating_add(passed);
            self.emit(SessionEvent::ScoreChanged { score: self.score });
        }
        self.recorder.observe(frequency);

        trace!(tick = now, ?frequency, position, collided, "Tick");

        // 6. Terminal check
        let mut report = self.report(sample);
        report.collided = collided;
        report.damage = damage;
        report.passed = passed;

        if damage == DamageOutcome::Fatal {
            self.finish(EndReason::LivesExhausted);
            report.state = self.state;
        }
        report
    }

    fn extract(&self, frame: Option<&SpectrumFrame>) -> Option<f64> {
        frame.and_then(|f| self.extractor.extract_frame(f))
    }

    fn report(&self, sample: Option<FrequencySample>) -> TickReport {
        TickReport {
            state: self.state,
            tick: self.tick,
            note: sample.map(|s| s.note()).unwrap_or_default(),
            sample,
            position: self.smoother.position(),
            collided: false,
            damage: DamageOutcome::None,
            passed: 0,
            score: self.score,
            lives: self.damage.lives(),
        }
    }

    fn finish(&mut self, reason: EndReason) -> &SessionResult {
        self.state = SessionState::Ended;
        let vocal_profile = self.recorder.freeze();
        let result = SessionResult {
            score: self.score,
            lives_remaining: self.damage.lives(),
            max_lives: self.damage.max_lives(),
            ticks: self.tick,
            range_semitones: vocal_profile.span_semitones(),
            vocal_profile,
            capture_available: self.capture_available,
            reason,
        };

        info!(
            score = result.score,
            lives = result.lives_remaining,
            ticks = result.ticks,
            ?reason,
            "Session ended"
        );
        self.emit(SessionEvent::Ended(result.clone()));
        self.result.insert(result)
    }

    fn clear_session(&mut self) {
        self.tick = 0;
        self.score = 0;
        self.damage.reset();
        self.obstacles.clear();
        self.smoother.reset();
        self.recorder.reset();
        self.result = None;
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &self.events {
            if sender.try_send(event).is_err() {
                trace!("Session event dropped, receiver gone or full");
            }
        }
    }

    /// The ended session's result, if it may be turned into recommendations
    fn gated_result(&self) -> Result<&SessionResult, SessionError> {
        let result = self.result.as_ref().ok_or(SessionError::NotEnded)?;
        let rules = &self.config.session;
        if rules.gate_recommendations && result.score < rules.min_score_for_recommendations {
            debug!(
                score = result.score,
                required = rules.min_score_for_recommendations,
                "Recommendations refused"
            );
            return Err(SessionError::InsufficientScore {
                score: result.score,
                required: rules.min_score_for_recommendations,
            });
        }
        Ok(result)
    }

    /// Full-flow recommendations from this session's recorded range
    pub fn request_recommendations(
        &self,
        catalog: &[SongEntry],
        preferences: Option<&UserPreferences>,
    ) -> Result<Vec<RecommendationResult>, SessionError> {
        let result = self.gated_result()?;
        let profile = ScoringProfile::Minimal(result.vocal_profile.clone());
        Ok(self.scorer().recommend(&profile, catalog, preferences))
    }

    /// Full-flow recommendations for a caller-supplied profile, still gated
    /// on this session's score
    pub fn request_recommendations_for(
        &self,
        profile: &ScoringProfile,
        catalog: &[SongEntry],
        preferences: Option<&UserPreferences>,
    ) -> Result<Vec<RecommendationResult>, SessionError> {
        self.gated_result()?;
        Ok(self.scorer().recommend(profile, catalog, preferences))
    }

    /// Post-game quick picks, jittered by the session RNG
    pub fn quick_recommendations(
        &mut self,
        catalog: &[SongEntry],
    ) -> Result<Vec<RecommendationResult>, SessionError> {
        let profile = ScoringProfile::Minimal(self.gated_result()?.vocal_profile.clone());
        let scorer = self.scorer();
        Ok(scorer.quick_recommendations(&profile, catalog, &mut self.rng))
    }

    fn scorer(&self) -> RecommendationScorer {
        RecommendationScorer::new(self.config.scoring.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::{Difficulty, HzRange};

    const BINS: usize = 1024;
    const SR: f64 = 44100.0;

    fn controller() -> GameSessionController {
        GameSessionController::with_seed(GameConfig::default(), 42)
    }

    fn tone(hz: f64) -> SpectrumFrame {
        SpectrumFrame::with_peak(hz, BINS, SR, -10.0)
    }

    fn song(id: &str) -> SongEntry {
        SongEntry {
            id: id.to_string(),
            title: id.to_string(),
            artist: "a".to_string(),
            vocal_range_hz: HzRange::new(150.0, 400.0),
            comfortable_range_hz: None,
            characteristics: None,
            difficulty: Difficulty::Easy,
            genre: String::new(),
            mood: Vec::new(),
        }
    }

    /// Run until the session ends or `limit` ticks pass
    fn run(c: &mut GameSessionController, frame: Option<&SpectrumFrame>, limit: usize) {
        for _ in 0..limit {
            if c.state() != SessionState::Running {
                break;
            }
            c.tick(frame);
        }
    }

    #[test]
    fn test_transitions() {
        let mut c = controller();
        assert_eq!(c.state(), SessionState::Idle);

        assert!(matches!(
            c.pause(),
            Err(SessionError::InvalidTransition { from: SessionState::Idle, .. })
        ));
        assert!(c.resume().is_err());
        assert!(c.end().is_err());

        c.start().unwrap();
        assert!(c.start().is_err());
        c.pause().unwrap();
        assert_eq!(c.state(), SessionState::Paused);
        c.resume().unwrap();
        c.end().unwrap();
        assert_eq!(c.state(), SessionState::Ended);
        assert_eq!(c.result().unwrap().reason, EndReason::Stopped);

        // Restart from Ended
        c.start().unwrap();
        assert!(c.result().is_none());
        c.reset();
        assert_eq!(c.state(), SessionState::Idle);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut c = controller();
        let report = c.tick(Some(&tone(300.0)));
        assert_eq!(report.tick, 0);
        assert_eq!(c.target_frequency(), 0.0);
        assert!(c.obstacles().is_empty());
    }

    #[test]
    fn test_running_tick_extracts_and_records() {
        let mut c = controller();
        c.start().unwrap();

        let report = c.tick(Some(&tone(300.0)));
        let sample = report.sample.unwrap();
        assert!(sample.frequency().is_some());
        assert_eq!(sample.sampled_at_tick, 1);
        assert!(!report.note.is_empty());
        assert!(c.target_frequency() > 0.0);
        assert!(!c.vocal_profile().is_empty());
        assert_eq!(c.obstacles().len(), 1);

        // Ticks without a fresh frame carry no sample
        let report = c.tick(None);
        assert!(report.sample.is_none());
        assert!(report.note.is_empty());
    }

    #[test]
    fn test_pause_keeps_listening_but_freezes_world() {
        let mut c = controller();
        c.start().unwrap();
        c.tick(Some(&tone(300.0)));

        c.pause().unwrap();
        let position = c.position();
        let obstacles = c.obstacles().to_vec();
        let profile = c.vocal_profile().clone();
        let target = c.target_frequency();

        for _ in 0..30 {
            c.tick(Some(&tone(600.0)));
        }

        assert!(c.target_frequency() > target);
        assert_eq!(c.position(), position);
        assert_eq!(c.obstacles(), obstacles.as_slice());
        assert_eq!(c.vocal_profile(), &profile);
        assert_eq!(c.current_tick(), 1);
    }

    #[test]
    fn test_paused_tick_reports_samples_like_running() {
        let mut c = controller();
        c.start().unwrap();
        c.pause().unwrap();

        let silent = SpectrumFrame::silent(BINS, SR);
        let report = c.tick(Some(&silent));
        let sample = report.sample.unwrap();
        assert!(sample.frequency().is_none());
        assert_eq!(sample.sampled_at_tick, 0);

        assert!(c.tick(None).sample.is_none());
    }

    #[test]
    fn test_silence_ends_with_lives_exhausted() {
        // With no pitch the actor hovers mid-field and hits most obstacles
        let mut c = controller();
        c.start().unwrap();
        run(&mut c, None, 20_000);

        assert_eq!(c.state(), SessionState::Ended);
        let result = c.result().unwrap();
        assert_eq!(result.reason, EndReason::LivesExhausted);
        assert_eq!(result.lives_remaining, 0);
        assert!(result.vocal_profile.is_empty());
    }

    #[test]
    fn test_no_mutation_after_end() {
        let mut c = controller();
        c.start().unwrap();
        run(&mut c, Some(&tone(250.0)), 600);
        c.end().unwrap();

        let snapshot = c.result().cloned();
        let tick = c.current_tick();
        let position = c.position();
        for _ in 0..100 {
            let report = c.tick(Some(&tone(700.0)));
            assert_eq!(report.state, SessionState::Ended);
        }
        assert_eq!(c.result().cloned(), snapshot);
        assert_eq!(c.current_tick(), tick);
        assert_eq!(c.position(), position);
    }

    #[test]
    fn test_lives_never_increase_and_grace_holds() {
        let mut c = controller();
        c.start().unwrap();

        let mut lives = c.lives();
        let mut last_hit: Option<u64> = None;
        while c.state() == SessionState::Running {
            let report = c.tick(None);
            assert!(report.lives <= lives);
            if report.lives < lives {
                if let Some(prev) = last_hit {
                    assert!(report.tick - prev >= 120);
                }
                last_hit = Some(report.tick);
            }
            lives = report.lives;
        }
    }

    #[test]
    fn test_events_emitted() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut c = GameSessionController::with_seed(GameConfig::default(), 3).with_events(tx);

        c.report_capture_unavailable("no device");
        c.start().unwrap();
        run(&mut c, None, 20_000);

        let events: Vec<SessionEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], SessionEvent::CaptureUnavailable { .. }));
        assert_eq!(events[1], SessionEvent::Started);
        assert!(events.contains(&SessionEvent::LivesChanged { lives: 2 }));
        assert!(events.contains(&SessionEvent::InvulnerabilityEnded));
        match events.last() {
            Some(SessionEvent::Ended(result)) => {
                assert!(!result.capture_available);
                assert_eq!(result.lives_remaining, 0);
            }
            other => panic!("expected Ended, got {:?}", other),
        }
    }

    #[test]
    fn test_recommendations_gated_until_ended() {
        let mut c = controller();
        assert_eq!(
            c.request_recommendations(&[song("a")], None),
            Err(SessionError::NotEnded)
        );

        c.start().unwrap();
        c.end().unwrap();
        assert_eq!(
            c.request_recommendations(&[song("a")], None),
            Err(SessionError::InsufficientScore {
                score: 0,
                required: 15
            })
        );
        assert!(c.quick_recommendations(&[song("a")]).is_err());
    }

    #[test]
    fn test_gate_disabled() {
        let mut config = GameConfig::default();
        config.session.gate_recommendations = false;
        let mut c = GameSessionController::with_seed(config, 1);
        c.start().unwrap();
        c.tick(Some(&tone(200.0)));
        c.tick(Some(&tone(350.0)));
        c.end().unwrap();

        assert!(c.request_recommendations(&[], None).unwrap().is_empty());
        let quick = c.quick_recommendations(&[song("a"), song("b")]).unwrap();
        assert_eq!(quick.len(), 2);
    }
}
