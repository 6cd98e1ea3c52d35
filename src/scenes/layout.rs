/// Screen layout used by the probe matchers
use serde::{Deserialize, Serialize};

use super::probe::{ColorProbe, Region};

/// A probe that identifies one stage or rule by its announcement color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub id: String,
    pub probe: ColorProbe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    /// Banner shown while the match-start overlay is on screen
    pub start_banner: ColorProbe,
    /// Stage candidates, first match wins
    pub stages: Vec<Signature>,
    /// Rule candidates, first match wins
    pub rules: Vec<Signature>,
    /// Timer icon visible during play
    pub timer_icon: ColorProbe,
    /// One probe per team-1 player slot; a match means alive
    pub team1_lives: Vec<ColorProbe>,
    /// One probe per team-2 player slot
    pub team2_lives: Vec<ColorProbe>,
    /// Result-detail screen header
    pub result_banner: ColorProbe,
    /// Shown on the result screen when the local team won
    pub win_banner: ColorProbe,
    /// Objective progress bar
    pub tower_bar: Region,
    /// Marker color on the progress bar
    pub tower_marker: [u8; 3],
    pub tower_tolerance: f32,
}

/// Four evenly spaced slots starting at `x`
fn life_slots(x: f32, color: [u8; 3]) -> Vec<ColorProbe> {
    (0..4)
        .map(|i| ColorProbe::new(Region::new(x + i as f32 * 0.04, 0.02, 0.03, 0.05), color, 60.0))
        .collect()
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            start_banner: ColorProbe::new(Region::new(0.3, 0.4, 0.4, 0.1), [240, 240, 240], 40.0),
            stages: Vec::new(),
            rules: Vec::new(),
            timer_icon: ColorProbe::new(Region::new(0.48, 0.02, 0.04, 0.05), [255, 255, 255], 50.0),
            team1_lives: life_slots(0.30, [230, 120, 40]),
            team2_lives: life_slots(0.55, [60, 90, 220]),
            result_banner: ColorProbe::new(Region::new(0.0, 0.0, 1.0, 0.08), [20, 20, 20], 40.0),
            win_banner: ColorProbe::new(Region::new(0.05, 0.1, 0.2, 0.06), [250, 200, 30], 60.0),
            tower_bar: Region::new(0.2, 0.1, 0.6, 0.02),
            tower_marker: [250, 250, 250],
            tower_tolerance: 40.0,
        }
    }
}

impl SceneLayout {
    /// Every region used by the layout
    pub fn regions(&self) -> Vec<(String, Region)> {
        let mut regions = vec![
            ("start_banner".to_string(), self.start_banner.region),
            ("timer_icon".to_string(), self.timer_icon.region),
            ("result_banner".to_string(), self.result_banner.region),
            ("win_banner".to_string(), self.win_banner.region),
            ("tower_bar".to_string(), self.tower_bar),
        ];
        for (team, probes) in [("team1_lives", &self.team1_lives), ("team2_lives", &self.team2_lives)] {
            for (i, probe) in probes.iter().enumerate() {
                regions.push((format!("{}[{}]", team, i), probe.region));
            }
        }
        for sig in self.stages.iter().chain(&self.rules) {
            regions.push((sig.id.clone(), sig.probe.region));
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_regions_are_valid() {
        let layout = SceneLayout::default();
        for (name, region) in layout.regions() {
            assert!(region.is_valid(), "{} is out of bounds: {:?}", name, region);
        }
        assert_eq!(layout.team1_lives.len(), 4);
        assert_eq!(layout.team2_lives.len(), 4);
    }

    #[test]
    fn test_partial_layout_uses_defaults() {
        let layout: SceneLayout = serde_json::from_str(r#"{"tower_tolerance": 12.5}"#).unwrap();
        assert_eq!(layout.tower_tolerance, 12.5);
        assert_eq!(layout.timer_icon, SceneLayout::default().timer_icon);
    }
}
