/// Frame engine
///
/// Owns the frame source, the matchers, the plugins and the session context,
/// and runs the acquisition loop.
///
/// ## One iteration
///
/// ```text
/// acquire (decimation_factor reads, keep last)
///   └── in-game detect ──> onFrameRead
///         ├── in game:  tower + lives tracking
///         ├── waiting:  start gate ──> reset, drain ──> onGameStart
///         └── waiting:  result gate ──> stabilize, analyze
///                         ──> onGameIndividualResultAnalyze
///                         ──> onGameIndividualResult
///                         ──> onGameReset
///   └── onFrameNext (first key) ──> onKeyPress
/// ```
///
/// Matchers receive `(&EngineState, &mut GameState)` and plugins receive
/// `&SessionContext`. Detection failures count as a negative match; plugin
/// failures follow the configured `HookPolicy`.
use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::context::SessionContext;
use crate::error::{EngineError, MatcherError};
use crate::frame::Frame;
use crate::plugin::{DispatchReport, Hook, PluginRegistry};
use crate::scenes::Scenes;
use crate::source::{FramePoll, FrameSource};
use crate::state::{EngineControl, GameplayPhase, PhaseMachine};
use crate::utils::{Clock, Cooldown, IterationTiming, LatencyStats, SystemClock, Timer};

/// What a single `step` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One full iteration ran
    Continued,
    /// Paused; slept one poll interval without reading frames
    Paused,
    /// Stop was requested through `EngineControl`
    Stopped,
    /// The frame source reported end of stream
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    EndOfStream,
    Stopped,
}

/// Counters for one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    /// Ready frames pulled from the source, including drain and
    /// stabilization reads
    pub frames_consumed: u64,
    /// Polls that returned `Pending`
    pub pending_polls: u64,
    pub games_started: u32,
    pub results_captured: u32,
    /// Isolated plugin failures
    pub plugin_failures: u64,
    pub reason: Option<StopReason>,
}

enum Acquired {
    Frame(Frame),
    Ended,
    Stopped,
}

pub struct FrameEngine {
    config: EngineConfig,
    source: Box<dyn FrameSource>,
    scenes: Scenes,
    plugins: PluginRegistry,
    ctx: SessionContext,
    clock: Arc<dyn Clock>,
    control: EngineControl,
    start_gate: Cooldown,
    result_gate: Cooldown,
    phase: PhaseMachine,
    stats: LatencyStats,
    timing: IterationTiming,
    summary: RunSummary,
}

impl FrameEngine {
    /// Build an engine; the registry adopts `config.hook_policy`
    pub fn new(
        config: EngineConfig,
        source: Box<dyn FrameSource>,
        scenes: Scenes,
        mut plugins: PluginRegistry,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        plugins.set_policy(config.hook_policy.clone());

        let mut ctx = SessionContext::new();
        ctx.engine.source_file = source.source_name();
        ctx.engine.epoch_time = source.epoch_time();

        Ok(Self {
            start_gate: Cooldown::new(config.start_cooldown()),
            result_gate: Cooldown::new(config.result_cooldown()),
            config,
            source,
            scenes,
            plugins,
            ctx,
            clock: Arc::new(SystemClock::new()),
            control: EngineControl::new(),
            phase: PhaseMachine::new(),
            stats: LatencyStats::new(),
            timing: IterationTiming::default(),
            summary: RunSummary::default(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_control(mut self, control: EngineControl) -> Self {
        self.control = control;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn phase(&self) -> GameplayPhase {
        self.phase.phase()
    }

    /// Handle for stopping or pausing from another thread
    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn stats(&self) -> &LatencyStats {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Run until end of stream or a stop request
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        tracing::info!(
            "Engine running: source={:?} decimation={} plugins={:?}",
            self.ctx.engine.source_file,
            self.config.decimation_factor,
            self.plugins.names()
        );

        loop {
            match self.step()? {
                StepOutcome::Continued | StepOutcome::Paused => continue,
                StepOutcome::Ended => {
                    self.summary.reason = Some(StopReason::EndOfStream);
                    break;
                }
                StepOutcome::Stopped => {
                    self.summary.reason = Some(StopReason::Stopped);
                    break;
                }
            }
        }

        tracing::info!(
            "Engine finished ({:?}): {} iterations, {} games, {} results, {} plugin failures",
            self.summary.reason,
            self.summary.iterations,
            self.summary.games_started,
            self.summary.results_captured,
            self.summary.plugin_failures
        );
        if !self.stats.is_empty() {
            self.stats.log_report();
        }

        Ok(self.summary.clone())
    }

    /// Run one iteration of the loop
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        if !self.control.is_running() {
            return Ok(StepOutcome::Stopped);
        }
        if self.control.is_paused() {
            self.clock.sleep(self.config.pause_poll());
            return Ok(StepOutcome::Paused);
        }

        let total = Timer::start();
        self.timing = IterationTiming::default();

        let acquire = Timer::start();
        let frame = match self.acquire(self.config.decimation_factor)? {
            Acquired::Frame(frame) => frame,
            Acquired::Ended => return Ok(StepOutcome::Ended),
            Acquired::Stopped => return Ok(StepOutcome::Stopped),
        };
        self.timing.acquire_us = acquire.elapsed_us();
        self.load_frame(frame);
        self.summary.iterations += 1;

        let matching = Timer::start();
        let in_game = self.detect_in_game();
        self.ctx.engine.in_game = in_game;
        if let Err(e) = self.phase.sync(in_game, self.clock.now()) {
            tracing::warn!("Phase sync rejected: {}", e);
        }

        self.dispatch(Hook::OnFrameRead)?;

        if in_game {
            self.track();
        }

        if !in_game && self.start_gate.is_open(self.clock.now()) {
            if let Some(outcome) = self.game_start()? {
                return Ok(outcome);
            }
        }

        let mut stream_ended = false;
        if !in_game && self.result_gate.is_open(self.clock.now()) {
            stream_ended = self.capture_result()?;
        }
        self.timing.match_us = matching.elapsed_us() - self.timing.dispatch_us;

        let next = Timer::start();
        let (key, report) = self.plugins.dispatch_frame_next(&self.ctx)?;
        self.record(report);
        if let Some(key) = key {
            tracing::debug!("Key {:?} injected on frame {}", key, self.frame_sequence());
        }
        let report = self.plugins.dispatch_key_press(&self.ctx, key)?;
        self.record(report);
        self.timing.dispatch_us += next.elapsed_us();

        self.timing.total_us = total.elapsed_us();
        if self.config.collect_timings {
            self.stats.add(self.timing);
        }

        Ok(if stream_ended {
            StepOutcome::Ended
        } else {
            StepOutcome::Continued
        })
    }

    /// Read `reads` ready frames and keep the last
    ///
    /// `Pending` does not count as a read; the engine waits the backoff and
    /// polls again.
    fn acquire(&mut self, reads: u32) -> Result<Acquired, EngineError> {
        let mut last = None;
        let mut read = 0;

        while read < reads {
            match self.source.next_frame()? {
                FramePoll::Ready(frame) => {
                    self.summary.frames_consumed += 1;
                    last = Some(frame);
                    read += 1;
                }
                FramePoll::Pending => {
                    self.summary.pending_polls += 1;
                    if !self.control.is_running() {
                        return Ok(Acquired::Stopped);
                    }
                    tracing::trace!("No frame available, backing off");
                    self.clock.sleep(self.config.pending_backoff());
                }
                FramePoll::Ended => {
                    tracing::info!("Frame source ended");
                    return Ok(Acquired::Ended);
                }
            }
        }

        Ok(match last {
            Some(frame) => Acquired::Frame(frame),
            None => Acquired::Ended,
        })
    }

    /// Re-read up to `stabilization_reads` polls, keeping the newest frame
    ///
    /// Returns the frame (if any arrived) and whether the stream ended.
    fn stabilize(&mut self) -> Result<(Option<Frame>, bool), EngineError> {
        let mut newest = None;

        for _ in 0..self.config.stabilization_reads {
            match self.source.next_frame()? {
                FramePoll::Ready(frame) => {
                    self.summary.frames_consumed += 1;
                    newest = Some(frame);
                }
                FramePoll::Pending => self.summary.pending_polls += 1,
                FramePoll::Ended => return Ok((newest, true)),
            }
        }

        Ok((newest, false))
    }

    fn load_frame(&mut self, frame: Frame) {
        tracing::trace!("Frame {} loaded", frame.sequence);
        self.ctx.engine.set_frame(frame);
        self.ctx.engine.frames_processed += 1;
    }

    fn frame_sequence(&self) -> u64 {
        self.ctx.engine.frame().map_or(0, |f| f.sequence)
    }

    fn detect_in_game(&mut self) -> bool {
        let matcher = &mut self.scenes.in_game;
        let result = matcher.detect(&self.ctx.engine, &mut self.ctx.game);
        negative_on_error(matcher.name(), result)
    }

    fn detect_start(&mut self) -> bool {
        let matcher = &mut self.scenes.start;
        let result = matcher.detect(&self.ctx.engine, &mut self.ctx.game);
        negative_on_error(matcher.name(), result)
    }

    fn detect_result(&mut self) -> bool {
        let matcher = &mut self.scenes.result;
        let result = matcher.detect(&self.ctx.engine, &mut self.ctx.game);
        negative_on_error(matcher.name(), result)
    }

    /// Append at most one sample to each track
    fn track(&mut self) {
        let engine = &self.ctx.engine;
        let game = &mut self.ctx.game;

        match self.scenes.tower.detect(engine, game) {
            Ok(Some(sample)) => game.tower_track.push(sample),
            Ok(None) => {}
            Err(e) => tracing::debug!("Tower sample skipped: {}", e),
        }

        match self.scenes.in_game.lives(engine, game) {
            Ok(lives) => game.lives_track.push(lives),
            Err(e) => tracing::debug!("Lives sample skipped: {}", e),
        }
    }

    /// Start gate is open and the engine is not in game
    ///
    /// Returns an outcome only when the run must end during draining.
    fn game_start(&mut self) -> Result<Option<StepOutcome>, EngineError> {
        let before = (self.ctx.game.map.clone(), self.ctx.game.rule.clone());
        if !self.detect_start() {
            return Ok(None);
        }

        tracing::info!("Game start detected on frame {}", self.frame_sequence());

        // Keep a stage recognized by the triggering match across the reset
        let recognized = (self.ctx.game.map.take(), self.ctx.game.rule.take());
        self.ctx.game.reset_session();
        if recognized != before {
            self.ctx.game.set_stage(recognized.0, recognized.1);
        }
        self.scenes.tower.reset(&mut self.ctx.game);

        let mut rounds = 0u32;
        loop {
            match self.acquire(self.config.start_drain_reads)? {
                Acquired::Frame(frame) => self.load_frame(frame),
                Acquired::Ended => return Ok(Some(StepOutcome::Ended)),
                Acquired::Stopped => return Ok(Some(StepOutcome::Stopped)),
            }
            rounds += 1;
            if !self.detect_start() {
                break;
            }
        }
        tracing::debug!("Start overlay drained after {} round(s)", rounds);

        self.ctx.game.start_offset_msec = self.ctx.engine.msec;
        self.start_gate.mark(self.clock.now());
        self.summary.games_started += 1;

        tracing::info!(
            "Game start confirmed: map={:?} rule={:?}",
            self.ctx.game.map.as_ref().map(|m| m.as_str()),
            self.ctx.game.rule.as_ref().map(|r| r.as_str())
        );
        self.dispatch(Hook::OnGameStart)?;

        Ok(None)
    }

    /// Result gate is open and the engine is not in game
    ///
    /// Returns whether the source ended during stabilization.
    fn capture_result(&mut self) -> Result<bool, EngineError> {
        if !self.detect_result() {
            return Ok(false);
        }

        let now = self.clock.now();
        if !self.result_gate.is_open(now) {
            tracing::debug!(
                "Result screen suppressed, cooldown {:.1}s left",
                self.result_gate.remaining(now).as_secs_f64()
            );
            return Ok(false);
        }
        self.result_gate.mark(now);

        if let Err(e) = self.phase.begin_result(now) {
            tracing::warn!("Result capture from unexpected phase: {}", e);
        }
        tracing::info!("Result screen detected on frame {}", self.frame_sequence());

        let (frame, ended) = self.stabilize()?;
        if let Some(frame) = frame {
            self.load_frame(frame);
        }
        self.ctx.game.end_time = Some(self.ctx.game_time());

        let matcher = &mut self.scenes.result;
        if let Err(e) = matcher.analyze(&self.ctx.engine, &mut self.ctx.game) {
            tracing::warn!("{} analysis failed: {}", matcher.name(), e);
        }

        self.dispatch(Hook::OnGameIndividualResultAnalyze)?;
        self.dispatch(Hook::OnGameIndividualResult)?;
        self.dispatch(Hook::OnGameReset)?;

        self.ctx.game.clear_result_fields();
        self.ctx.game.index += 1;
        self.summary.results_captured += 1;

        let now = self.clock.now();
        tracing::debug!("Result capture took {:?}", self.phase.elapsed(now));
        if let Err(e) = self.phase.finish_result(now) {
            tracing::warn!("Result capture finished in unexpected phase: {}", e);
        }

        Ok(ended)
    }

    fn dispatch(&mut self, hook: Hook) -> Result<(), EngineError> {
        let timer = Timer::start();
        let report = self.plugins.dispatch(hook, &self.ctx)?;
        self.timing.dispatch_us += timer.elapsed_us();
        self.record(report);
        Ok(())
    }

    fn record(&mut self, report: DispatchReport) {
        if report.failed > 0 {
            self.summary.plugin_failures += report.failed as u64;
        }
    }
}

fn negative_on_error(matcher: &str, result: Result<bool, MatcherError>) -> bool {
    result.unwrap_or_else(|e| {
        tracing::warn!("{} detection failed: {}", matcher, e);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EngineState, GameState, LivesSample, TowerSample};
    use crate::scenes::{
        GameStartMatcher, InGameMatcher, ProgressTracker, ResultDetailMatcher, SceneMatcher,
    };
    use crate::source::ScriptedSource;
    use crate::utils::ManualClock;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    /// Matches nothing
    struct Idle;

    impl SceneMatcher for Idle {
        fn name(&self) -> &'static str {
            "idle"
        }
    }

    impl GameStartMatcher for Idle {
        fn detect(&mut self, _: &EngineState, _: &mut GameState) -> Result<bool, MatcherError> {
            Ok(false)
        }
    }

    impl InGameMatcher for Idle {
        fn detect(&mut self, _: &EngineState, _: &mut GameState) -> Result<bool, MatcherError> {
            Ok(false)
        }

        fn lives(&mut self, _: &EngineState, _: &mut GameState) -> Result<LivesSample, MatcherError> {
            Ok([0, 0])
        }
    }

    impl ResultDetailMatcher for Idle {
        fn detect(&mut self, _: &EngineState, _: &mut GameState) -> Result<bool, MatcherError> {
            Ok(false)
        }

        fn analyze(&mut self, _: &EngineState, _: &mut GameState) -> Result<(), MatcherError> {
            Ok(())
        }
    }

    impl ProgressTracker for Idle {
        fn detect(
            &mut self,
            _: &EngineState,
            _: &mut GameState,
        ) -> Result<Option<TowerSample>, MatcherError> {
            Ok(None)
        }
    }

    fn idle_scenes() -> Scenes {
        Scenes::new(Box::new(Idle), Box::new(Idle), Box::new(Idle), Box::new(Idle))
    }

    fn engine(source: ScriptedSource, config: EngineConfig) -> (FrameEngine, ManualClock) {
        let clock = ManualClock::new();
        let engine = FrameEngine::new(config, Box::new(source), idle_scenes(), PluginRegistry::default())
            .unwrap()
            .with_clock(Arc::new(clock.clone()));
        (engine, clock)
    }

    #[test]
    fn test_decimation_keeps_last_frame() {
        let source = ScriptedSource::numbered(30);
        let consumed = source.consumed_counter();
        let (mut engine, _) = engine(source, EngineConfig::default());

        assert_eq!(engine.step().unwrap(), StepOutcome::Continued);
        assert_eq!(consumed.load(Ordering::Relaxed), 12);
        assert_eq!(engine.context().engine.frame().unwrap().sequence, 11);
        assert_eq!(engine.context().engine.frames_processed, 1);

        engine.step().unwrap();
        assert_eq!(engine.context().engine.frame().unwrap().sequence, 23);

        // 6 frames left, fewer than one decimation window
        assert_eq!(engine.step().unwrap(), StepOutcome::Ended);
    }

    #[test]
    fn test_pending_waits_backoff_on_clock() {
        let mut source = ScriptedSource::new();
        source.push_pending().push_pending().push_frame(Frame::solid(4, 4, [0, 0, 0], 7));

        let config = EngineConfig {
            decimation_factor: 1,
            ..Default::default()
        };
        let (mut engine, clock) = engine(source, config);

        assert_eq!(engine.step().unwrap(), StepOutcome::Continued);
        assert_eq!(clock.total_slept(), Duration::from_secs(2));
        assert_eq!(engine.summary().pending_polls, 2);
        assert_eq!(engine.context().engine.frame().unwrap().sequence, 7);
    }

    #[test]
    fn test_run_ends_with_summary() {
        let config = EngineConfig {
            decimation_factor: 2,
            ..Default::default()
        };
        let (mut engine, _) = engine(ScriptedSource::numbered(5), config);

        let summary = engine.run().unwrap();
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.frames_consumed, 5);
        assert_eq!(summary.reason, Some(StopReason::EndOfStream));
    }

    #[test]
    fn test_stop_and_pause() {
        let (mut engine, clock) = engine(ScriptedSource::numbered(100), EngineConfig::default());
        let control = engine.control();

        control.pause();
        assert_eq!(engine.step().unwrap(), StepOutcome::Paused);
        assert_eq!(clock.total_slept(), Duration::from_millis(250));
        assert_eq!(engine.summary().frames_consumed, 0);

        control.resume();
        assert_eq!(engine.step().unwrap(), StepOutcome::Continued);

        control.stop();
        let summary = engine.run().unwrap();
        assert_eq!(summary.reason, Some(StopReason::Stopped));
        assert_eq!(summary.iterations, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            decimation_factor: 0,
            ..Default::default()
        };
        let result = FrameEngine::new(
            config,
            Box::new(ScriptedSource::new()),
            idle_scenes(),
            PluginRegistry::default(),
        );
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_timings_collected_when_enabled() {
        let config = EngineConfig {
            decimation_factor: 1,
            collect_timings: true,
            ..Default::default()
        };
        let (mut engine, _) = engine(ScriptedSource::numbered(3), config);
        engine.run().unwrap();
        assert_eq!(engine.stats().len(), 3);
    }
}
