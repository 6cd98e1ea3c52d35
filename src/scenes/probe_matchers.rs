/// Probe-based matcher implementations
///
/// Reference matchers driven entirely by a `SceneLayout`. They cover the
/// four roles with color probes only, which is enough for replaying
/// recordings whose overlays have stable colors.
use super::layout::{SceneLayout, Signature};
use super::matcher::{
    current_frame, GameStartMatcher, InGameMatcher, ProgressTracker, ResultDetailMatcher,
    SceneMatcher, Scenes,
};
use super::probe::{color_distance, ColorProbe};
use crate::context::{EngineState, GameState, LivesSample, MapId, PlayerEntry, RuleId, TowerSample};
use crate::error::MatcherError;

fn first_signature<'a>(
    signatures: &'a [Signature],
    image: &image::RgbImage,
    matcher: &'static str,
) -> Result<Option<&'a str>, MatcherError> {
    for sig in signatures {
        if sig.probe.matches(image, matcher)? {
            return Ok(Some(sig.id.as_str()));
        }
    }
    Ok(None)
}

/// Match-start overlay detector
pub struct ProbeStartMatcher {
    banner: ColorProbe,
    stages: Vec<Signature>,
    rules: Vec<Signature>,
}

impl ProbeStartMatcher {
    pub fn new(layout: &SceneLayout) -> Self {
        Self {
            banner: layout.start_banner.clone(),
            stages: layout.stages.clone(),
            rules: layout.rules.clone(),
        }
    }
}

impl SceneMatcher for ProbeStartMatcher {
    fn name(&self) -> &'static str {
        "ProbeStartMatcher"
    }
}

impl GameStartMatcher for ProbeStartMatcher {
    fn detect(&mut self, engine: &EngineState, game: &mut GameState) -> Result<bool, MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        if !self.banner.matches(image, self.name())? {
            return Ok(false);
        }

        let map = first_signature(&self.stages, image, self.name())?.map(MapId::new);
        let rule = first_signature(&self.rules, image, self.name())?.map(RuleId::new);
        if map.is_some() || rule.is_some() {
            game.set_stage(map, rule);
        }

        tracing::debug!("Start overlay matched: map={:?} rule={:?}", game.map, game.rule);
        Ok(true)
    }
}

/// Timer icon and life-slot detector
pub struct ProbeInGameMatcher {
    timer: ColorProbe,
    team1: Vec<ColorProbe>,
    team2: Vec<ColorProbe>,
}

impl ProbeInGameMatcher {
    pub fn new(layout: &SceneLayout) -> Self {
        Self {
            timer: layout.timer_icon.clone(),
            team1: layout.team1_lives.clone(),
            team2: layout.team2_lives.clone(),
        }
    }

    fn count_alive(
        slots: &[ColorProbe],
        image: &image::RgbImage,
        matcher: &'static str,
    ) -> Result<u32, MatcherError> {
        let mut alive = 0;
        for slot in slots {
            if slot.matches(image, matcher)? {
                alive += 1;
            }
        }
        Ok(alive)
    }
}

impl SceneMatcher for ProbeInGameMatcher {
    fn name(&self) -> &'static str {
        "ProbeInGameMatcher"
    }
}

impl InGameMatcher for ProbeInGameMatcher {
    fn detect(&mut self, engine: &EngineState, _game: &mut GameState) -> Result<bool, MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        self.timer.matches(image, self.name())
    }

    fn lives(&mut self, engine: &EngineState, _game: &mut GameState) -> Result<LivesSample, MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        Ok([
            Self::count_alive(&self.team1, image, self.name())?,
            Self::count_alive(&self.team2, image, self.name())?,
        ])
    }
}

/// Result-screen detector
///
/// The analysis only knows whether the local team won; it records a single
/// `me` entry carrying that team.
pub struct ProbeResultMatcher {
    banner: ColorProbe,
    win: ColorProbe,
}

impl ProbeResultMatcher {
    pub fn new(layout: &SceneLayout) -> Self {
        Self {
            banner: layout.result_banner.clone(),
            win: layout.win_banner.clone(),
        }
    }
}

impl SceneMatcher for ProbeResultMatcher {
    fn name(&self) -> &'static str {
        "ProbeResultMatcher"
    }
}

impl ResultDetailMatcher for ProbeResultMatcher {
    fn detect(&mut self, engine: &EngineState, _game: &mut GameState) -> Result<bool, MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        self.banner.matches(image, self.name())
    }

    fn analyze(&mut self, engine: &EngineState, game: &mut GameState) -> Result<(), MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        let won = self.win.matches(image, self.name())?;

        game.won = Some(won);
        game.players = Some(vec![PlayerEntry {
            me: true,
            team: 1,
            ..Default::default()
        }]);

        tracing::debug!("Result analyzed: won={}", won);
        Ok(())
    }
}

/// Progress-bar marker tracker
///
/// Finds the bar column whose pixels best match the marker color and maps
/// it to -1.0 (left end) .. 1.0 (right end). Extremes are kept until reset.
pub struct ProbeTowerTracker {
    bar: super::probe::Region,
    marker: [u8; 3],
    tolerance: f32,
    max: f32,
    min: f32,
}

impl ProbeTowerTracker {
    pub fn new(layout: &SceneLayout) -> Self {
        Self {
            bar: layout.tower_bar,
            marker: layout.tower_marker,
            tolerance: layout.tower_tolerance,
            max: 0.0,
            min: 0.0,
        }
    }

    /// Column (relative to the bar) closest to the marker color, if any
    /// column is within tolerance
    fn marker_column(&self, image: &image::RgbImage) -> Result<Option<(u32, u32)>, MatcherError> {
        let (x, y, width, height) = self
            .bar
            .to_pixels(image.width(), image.height())
            .ok_or_else(|| MatcherError::Region {
                matcher: self.name(),
                reason: format!("{:?} does not fit a {:?} frame", self.bar, image.dimensions()),
            })?;

        let mut best: Option<(u32, f32)> = None;
        for col in 0..width {
            let mut sum = [0f32; 3];
            for row in y..y + height {
                let pixel = image.get_pixel(x + col, row);
                for (acc, value) in sum.iter_mut().zip(pixel.0) {
                    *acc += value as f32;
                }
            }
            let mean = sum.map(|s| s / height as f32);
            let distance = color_distance(mean, self.marker);
            if distance <= self.tolerance && best.map_or(true, |(_, d)| distance < d) {
                best = Some((col, distance));
            }
        }

        Ok(best.map(|(col, _)| (col, width)))
    }
}

impl SceneMatcher for ProbeTowerTracker {
    fn name(&self) -> &'static str {
        "ProbeTowerTracker"
    }

    fn reset(&mut self, _game: &mut GameState) {
        self.max = 0.0;
        self.min = 0.0;
    }
}

impl ProgressTracker for ProbeTowerTracker {
    fn detect(
        &mut self,
        engine: &EngineState,
        _game: &mut GameState,
    ) -> Result<Option<TowerSample>, MatcherError> {
        let image = current_frame(engine, self.name())?.image();
        let Some((col, width)) = self.marker_column(image)? else {
            return Ok(None);
        };

        let pos = if width > 1 {
            col as f32 / (width - 1) as f32 * 2.0 - 1.0
        } else {
            0.0
        };
        self.max = self.max.max(pos);
        self.min = self.min.min(pos);

        Ok(Some(TowerSample {
            pos,
            max: self.max,
            min: self.min,
        }))
    }
}

/// The full probe matcher set for a layout
pub fn probe_scenes(layout: &SceneLayout) -> Scenes {
    Scenes::new(
        Box::new(ProbeStartMatcher::new(layout)),
        Box::new(ProbeInGameMatcher::new(layout)),
        Box::new(ProbeResultMatcher::new(layout)),
        Box::new(ProbeTowerTracker::new(layout)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::scenes::probe::Region;
    use image::{Rgb, RgbImage};

    const W: u32 = 200;
    const H: u32 = 100;

    fn paint(image: &mut RgbImage, region: Region, color: [u8; 3]) {
        let (x, y, w, h) = region.to_pixels(image.width(), image.height()).unwrap();
        for py in y..y + h {
            for px in x..x + w {
                image.put_pixel(px, py, Rgb(color));
            }
        }
    }

    fn engine_with(image: RgbImage) -> EngineState {
        let mut engine = EngineState::default();
        engine.set_frame(Frame::new(image, 0));
        engine
    }

    fn blank() -> RgbImage {
        RgbImage::from_pixel(W, H, Rgb([100, 100, 100]))
    }

    #[test]
    fn test_start_matcher_sets_stage() {
        let mut layout = SceneLayout::default();
        layout.stages.push(Signature {
            id: "hokke".to_string(),
            probe: ColorProbe::new(Region::new(0.0, 0.9, 0.1, 0.1), [0, 200, 0], 30.0),
        });

        let mut image = blank();
        paint(&mut image, layout.start_banner.region, layout.start_banner.color);
        paint(&mut image, Region::new(0.0, 0.9, 0.1, 0.1), [0, 200, 0]);

        let engine = engine_with(image);
        let mut game = GameState::default();
        let mut matcher = ProbeStartMatcher::new(&layout);

        assert!(matcher.detect(&engine, &mut game).unwrap());
        assert_eq!(game.map, Some(MapId::new("hokke")));
        assert_eq!(game.rule, None);

        let mut game = GameState::default();
        assert!(!matcher.detect(&engine_with(blank()), &mut game).unwrap());
        assert_eq!(game.map, None);
    }

    #[test]
    fn test_in_game_counts_lives() {
        let layout = SceneLayout::default();
        let mut image = blank();
        paint(&mut image, layout.timer_icon.region, layout.timer_icon.color);
        for slot in layout.team1_lives.iter().take(3) {
            paint(&mut image, slot.region, slot.color);
        }
        for slot in layout.team2_lives.iter().take(2) {
            paint(&mut image, slot.region, slot.color);
        }

        let engine = engine_with(image);
        let mut game = GameState::default();
        let mut matcher = ProbeInGameMatcher::new(&layout);

        assert!(matcher.detect(&engine, &mut game).unwrap());
        assert_eq!(matcher.lives(&engine, &mut game).unwrap(), [3, 2]);
        assert!(!matcher.detect(&engine_with(blank()), &mut game).unwrap());
    }

    #[test]
    fn test_result_analysis() {
        let layout = SceneLayout::default();
        let mut image = blank();
        paint(&mut image, layout.result_banner.region, layout.result_banner.color);
        paint(&mut image, layout.win_banner.region, layout.win_banner.color);

        let engine = engine_with(image);
        let mut game = GameState::default();
        let mut matcher = ProbeResultMatcher::new(&layout);

        assert!(matcher.detect(&engine, &mut game).unwrap());
        matcher.analyze(&engine, &mut game).unwrap();
        assert_eq!(game.won, Some(true));
        assert_eq!(game.players.as_ref().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_tower_tracker_extremes_and_reset() {
        let layout = SceneLayout::default();
        let (bx, by, bw, bh) = layout.tower_bar.to_pixels(W, H).unwrap();
        let marker_at = |col: u32| {
            let mut image = blank();
            for row in by..by + bh {
                image.put_pixel(bx + col, row, Rgb(layout.tower_marker));
            }
            engine_with(image)
        };

        let mut game = GameState::default();
        let mut tracker = ProbeTowerTracker::new(&layout);

        let right = tracker.detect(&marker_at(bw - 1), &mut game).unwrap().unwrap();
        assert_eq!(right.pos, 1.0);
        let left = tracker.detect(&marker_at(0), &mut game).unwrap().unwrap();
        assert_eq!(left.pos, -1.0);
        assert_eq!((left.max, left.min), (1.0, -1.0));

        assert!(tracker.detect(&engine_with(blank()), &mut game).unwrap().is_none());

        tracker.reset(&mut game);
        let again = tracker.detect(&marker_at(0), &mut game).unwrap().unwrap();
        assert_eq!((again.max, again.min), (0.0, -1.0));
    }

    #[test]
    fn test_matchers_need_a_frame() {
        let layout = SceneLayout::default();
        let engine = EngineState::default();
        let mut game = GameState::default();
        assert!(ProbeInGameMatcher::new(&layout).detect(&engine, &mut game).is_err());
    }
}
