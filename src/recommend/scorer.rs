//! Weighted song ranking against a vocal profile.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::catalog::{HzRange, SongEntry, VocalCharacteristics};
use super::profile::{ScoringProfile, UserPreferences};
use crate::params::{CharacteristicWeights, ScoringConfig};

/// One ranked song
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub song_id: String,
    /// 0–100
    pub match_score: u32,
    pub reason_tags: Vec<String>,
}

/// Per-factor scores before weighting; `None` means unknown
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FactorScores {
    pub range: f64,
    pub characteristics: Option<f64>,
    pub preference: Option<f64>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationScorer {
    config: ScoringConfig,
}

impl RecommendationScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Full analysis-driven flow: score, filter, rank, truncate
    pub fn recommend(
        &self,
        profile: &ScoringProfile,
        catalog: &[SongEntry],
        preferences: Option<&UserPreferences>,
    ) -> Vec<RecommendationResult> {
        let mut results: Vec<RecommendationResult> = catalog
            .iter()
            .map(|song| self.score_song(profile, song, preferences))
            .filter(|r| f64::from(r.match_score) >= self.config.min_match_score)
            .collect();

        // Stable: ties keep catalog order
        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        results.truncate(self.config.result_count);

        debug!(
            candidates = catalog.len(),
            returned = results.len(),
            "Scored catalog"
        );
        results
    }

    /// Score one song without filtering
    pub fn score_song(
        &self,
        profile: &ScoringProfile,
        song: &SongEntry,
        preferences: Option<&UserPreferences>,
    ) -> RecommendationResult {
        let factors = self.factors(profile, song, preferences);
        let total = self.combine(&factors);

        let mut reason_tags = Vec::new();
        if let Some(tag) = range_tag(factors.range) {
            reason_tags.push(tag.to_string());
        }
        if let Some(tag) = factors.characteristics.and_then(tone_tag) {
            reason_tags.push(tag.to_string());
        }
        reason_tags.push(song.difficulty.reason_tag().to_string());

        RecommendationResult {
            song_id: song.id.clone(),
            match_score: total,
            reason_tags,
        }
    }

    pub fn factors(
        &self,
        profile: &ScoringProfile,
        song: &SongEntry,
        preferences: Option<&UserPreferences>,
    ) -> FactorScores {
        let range = profile
            .comfortable_range(self.config.comfortable_trim)
            .map(|user| range_match(&user, &song.comfortable_range()))
            .unwrap_or(0.0);

        let characteristics = match (profile.characteristics(), song.characteristics.as_ref()) {
            (Some(user), Some(song)) => Some(characteristics_match(
                user,
                song,
                &self.config.characteristic_weights,
            )),
            _ => None,
        };

        let preference = preferences
            .filter(|p| !p.is_empty())
            .map(|p| preference_boost(p, song));

        FactorScores {
            range,
            characteristics,
            preference,
            confidence: profile.confidence().map(|c| c.clamp(0.0, 100.0)),
        }
    }

    /// Weighted mean over the known factors, rounded to 0–100
    pub fn combine(&self, factors: &FactorScores) -> u32 {
        let w = &self.config.weights;
        let known = [
            Some((w.range, factors.range)),
            factors.characteristics.map(|f| (w.characteristics, f)),
            factors.preference.map(|f| (w.preference, f)),
            factors.confidence.map(|f| (w.confidence, f)),
        ];

        let (weighted, total_weight) = known
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(sum, wsum), (weight, factor)| {
                (sum + weight * factor, wsum + weight)
            });

        if total_weight <= 0.0 {
            return 0;
        }
        (weighted / total_weight).clamp(0.0, 100.0).round() as u32
    }

    /// Post-game quick flow: range ratio, difficulty bonus and jitter.
    /// Returns the top `quick_result_count` with no score floor.
    pub fn quick_recommendations<R: Rng + ?Sized>(
        &self,
        profile: &ScoringProfile,
        catalog: &[SongEntry],
        rng: &mut R,
    ) -> Vec<RecommendationResult> {
        let user_range = profile.vocal_range();

        let mut results: Vec<RecommendationResult> = catalog
            .iter()
            .map(|song| {
                let range = user_range
                    .map(|user| quick_range_ratio(&user, &song.vocal_range_hz) * 100.0)
                    .unwrap_or(0.0);
                let jitter = if self.config.jitter_max > 0.0 {
                    rng.gen_range(0.0..self.config.jitter_max)
                } else {
                    0.0
                };
                let score = (range + song.difficulty.quick_bonus() + jitter).clamp(0.0, 100.0);

                let mut reason_tags = Vec::new();
                if let Some(tag) = range_tag(range) {
                    reason_tags.push(tag.to_string());
                }
                reason_tags.push(song.difficulty.reason_tag().to_string());

                RecommendationResult {
                    song_id: song.id.clone(),
                    match_score: score.round() as u32,
                    reason_tags,
                }
            })
            .collect();

        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        results.truncate(self.config.quick_result_count);
        results
    }
}

/// Overlap over union span, 0–100
pub fn range_match(user: &HzRange, song: &HzRange) -> f64 {
    let union = user.union_span(song);
    if !(union > 0.0) {
        return 0.0;
    }
    let overlap = user.overlap(song);
    if overlap <= 0.0 {
        return 0.0;
    }
    (overlap / union * 100.0).clamp(0.0, 100.0)
}

/// Overlap over the wider of the two spans, 0–1
fn quick_range_ratio(user: &HzRange, song: &HzRange) -> f64 {
    let widest = user.span().max(song.span());
    if !(widest > 0.0) {
        return 0.0;
    }
    (user.overlap(song) / widest).clamp(0.0, 1.0)
}

pub fn characteristics_match(
    user: &VocalCharacteristics,
    song: &VocalCharacteristics,
    weights: &CharacteristicWeights,
) -> f64 {
    let closeness = |u: f64, s: f64| (100.0 - (u - s).abs()).max(0.0);
    let weighted = closeness(user.pitch_variation, song.pitch_variation) * weights.pitch_variation
        + closeness(user.vibrato, song.vibrato) * weights.vibrato
        + closeness(user.breathiness, song.breathiness) * weights.breathiness
        + closeness(user.brightness, song.brightness) * weights.brightness;

    let total = weights.sum();
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Base 50 plus genre, difficulty and mood bonuses, capped at 100
pub fn preference_boost(preferences: &UserPreferences, song: &SongEntry) -> f64 {
    let mut boost = 50.0;

    if let Some(genre) = preferences.genre.as_deref() {
        if !genre.trim().is_empty() && genre.trim().eq_ignore_ascii_case(song.genre.trim()) {
            boost += 30.0;
        }
    }

    if preferences.difficulty == Some(song.difficulty) {
        boost += 20.0;
    }

    if !preferences.moods.is_empty() {
        let song_moods: Vec<String> = song.mood.iter().map(|m| m.to_lowercase()).collect();
        let matched = preferences
            .moods
            .iter()
            .map(|m| m.to_lowercase())
            .filter(|wanted| song_moods.iter().any(|m| m.contains(wanted.as_str())))
            .count();
        boost += 20.0 * matched as f64 / preferences.moods.len() as f64;
    }

    boost.min(100.0)
}

fn range_tag(range: f64) -> Option<&'static str> {
    if range >= 80.0 {
        Some("range: excellent match")
    } else if range >= 60.0 {
        Some("range: good match")
    } else if range >= 40.0 {
        Some("range: partial match")
    } else {
        None
    }
}

fn tone_tag(characteristics: f64) -> Option<&'static str> {
    if characteristics >= 80.0 {
        Some("tone: well suited")
    } else if characteristics >= 60.0 {
        Some("tone: fairly suited")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::VocalProfile;
    use crate::recommend::{Difficulty, VocalAnalysisProfile};
    use rand::{rngs::StdRng, SeedableRng};

    fn song(id: &str, range: (f64, f64), difficulty: Difficulty) -> SongEntry {
        SongEntry {
            id: id.to_string(),
            title: format!("Song {id}"),
            artist: "Artist".to_string(),
            vocal_range_hz: HzRange::new(range.0, range.1),
            comfortable_range_hz: Some(HzRange::new(range.0, range.1)),
            characteristics: Some(VocalCharacteristics::new(50.0, 50.0, 50.0, 50.0)),
            difficulty,
            genre: "Pop".to_string(),
            mood: vec!["Happy".to_string(), "upbeat".to_string()],
        }
    }

    fn analysis(range: (f64, f64), characteristics: VocalCharacteristics, confidence: f64) -> ScoringProfile {
        let range = HzRange::new(range.0, range.1);
        ScoringProfile::Analysis(VocalAnalysisProfile {
            vocal_range: Some(range),
            comfortable_range: Some(range),
            characteristics: Some(characteristics),
            confidence: Some(confidence),
        })
    }

    fn neutral() -> VocalCharacteristics {
        VocalCharacteristics::new(50.0, 50.0, 50.0, 50.0)
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let scorer = RecommendationScorer::default();
        let profile = analysis((100.0, 300.0), neutral(), 100.0);
        let result = scorer.score_song(&profile, &song("s", (100.0, 300.0), Difficulty::Easy), None);

        assert_eq!(result.match_score, 100);
        assert!(result.reason_tags.contains(&"range: excellent match".to_string()));
        assert!(result.reason_tags.contains(&"tone: well suited".to_string()));
    }

    #[test]
    fn test_zero_overlap_bounded_by_other_factors() {
        let scorer = RecommendationScorer::default();
        let profile = analysis(
            (100.0, 200.0),
            VocalCharacteristics::new(0.0, 0.0, 0.0, 0.0),
            50.0,
        );
        let s = song("s", (400.0, 500.0), Difficulty::Hard);

        let factors = scorer.factors(&profile, &s, None);
        assert_eq!(factors.range, 0.0);

        let result = scorer.score_song(&profile, &s, None);
        assert!(result.match_score < 40, "got {}", result.match_score);
        assert_eq!(result.reason_tags, vec!["difficulty: challenging"]);
    }

    #[test]
    fn test_minimal_profile_drops_unknown_factors() {
        let scorer = RecommendationScorer::default();
        let profile = ScoringProfile::Minimal(VocalProfile::from_range(100.0, 300.0));
        let s = song("s", (140.0, 260.0), Difficulty::Medium);

        // Trimmed user range equals the song range; range is the only known factor
        let factors = scorer.factors(&profile, &s, None);
        assert!(factors.characteristics.is_none());
        assert!(factors.confidence.is_none());
        assert_eq!(scorer.combine(&factors), 100);
    }

    #[test]
    fn test_empty_profile_is_zero_not_fault() {
        let scorer = RecommendationScorer::default();
        let profile = ScoringProfile::Minimal(VocalProfile::new());
        let catalog = vec![song("a", (100.0, 300.0), Difficulty::Easy)];

        let result = scorer.score_song(&profile, &catalog[0], None);
        assert_eq!(result.match_score, 0);
        assert!(scorer.recommend(&profile, &catalog, None).is_empty());

        let mut rng = StdRng::seed_from_u64(1);
        let quick = scorer.quick_recommendations(&profile, &catalog, &mut rng);
        assert_eq!(quick.len(), 1);
        assert!(quick[0].match_score <= 30);
    }

    #[test]
    fn test_empty_catalog() {
        let scorer = RecommendationScorer::default();
        let profile = analysis((100.0, 300.0), neutral(), 80.0);
        assert!(scorer.recommend(&profile, &[], None).is_empty());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(scorer.quick_recommendations(&profile, &[], &mut rng).is_empty());
    }

    #[test]
    fn test_ranking_is_stable_and_filtered() {
        let scorer = RecommendationScorer::default();
        let profile = analysis((100.0, 300.0), neutral(), 100.0);
        let catalog = vec![
            song("partial", (200.0, 400.0), Difficulty::Easy),
            song("tie-1", (100.0, 300.0), Difficulty::Easy),
            song("far", (600.0, 700.0), Difficulty::Easy),
            song("tie-2", (100.0, 300.0), Difficulty::Hard),
        ];

        let ids: Vec<String> = scorer
            .recommend(&profile, &catalog, None)
            .into_iter()
            .map(|r| r.song_id)
            .collect();

        // "far" scores (0*.4 + 100*.3 + 100*.1)/.8 = 50 and survives the floor
        assert_eq!(ids, vec!["tie-1", "tie-2", "partial", "far"]);
    }

    #[test]
    fn test_min_score_filter() {
        let scorer = RecommendationScorer::default();
        let profile = ScoringProfile::Minimal(VocalProfile::from_range(100.0, 200.0));
        let catalog = vec![song("far", (400.0, 500.0), Difficulty::Easy)];
        assert!(scorer.recommend(&profile, &catalog, None).is_empty());
    }

    #[test]
    fn test_result_count_truncates() {
        let scorer = RecommendationScorer::new(ScoringConfig {
            result_count: 2,
            ..ScoringConfig::default()
        });
        let profile = analysis((100.0, 300.0), neutral(), 100.0);
        let catalog: Vec<SongEntry> = (0..5)
            .map(|i| song(&i.to_string(), (100.0, 300.0), Difficulty::Easy))
            .collect();
        assert_eq!(scorer.recommend(&profile, &catalog, None).len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let scorer = RecommendationScorer::default();
        let profile = analysis((120.0, 320.0), neutral(), 70.0);
        let catalog = vec![
            song("a", (100.0, 300.0), Difficulty::Easy),
            song("b", (150.0, 450.0), Difficulty::Medium),
            song("c", (90.0, 200.0), Difficulty::Hard),
        ];
        let prefs = UserPreferences {
            genre: Some("pop".into()),
            difficulty: None,
            moods: vec!["happy".into()],
        };
        assert_eq!(
            scorer.recommend(&profile, &catalog, Some(&prefs)),
            scorer.recommend(&profile, &catalog, Some(&prefs))
        );
    }

    #[test]
    fn test_preference_boost() {
        let s = song("s", (100.0, 300.0), Difficulty::Medium);

        let none = UserPreferences::default();
        assert_eq!(preference_boost(&none, &s), 50.0);

        let genre = UserPreferences {
            genre: Some("POP".into()),
            ..Default::default()
        };
        assert_eq!(preference_boost(&genre, &s), 80.0);

        let half_moods = UserPreferences {
            moods: vec!["happ".into(), "sad".into()],
            ..Default::default()
        };
        assert_eq!(preference_boost(&half_moods, &s), 60.0);

        let everything = UserPreferences {
            genre: Some("pop".into()),
            difficulty: Some(Difficulty::Medium),
            moods: vec!["upbeat".into()],
        };
        assert_eq!(preference_boost(&everything, &s), 100.0);
    }

    #[test]
    fn test_characteristics_weighting() {
        let weights = CharacteristicWeights::default();
        let user = VocalCharacteristics::new(50.0, 50.0, 50.0, 50.0);

        // Brightness dominates: 40 off on brightness costs twice as much
        let off_bright = VocalCharacteristics::new(50.0, 50.0, 50.0, 90.0);
        let off_vibrato = VocalCharacteristics::new(50.0, 90.0, 50.0, 50.0);
        assert!((characteristics_match(&user, &off_bright, &weights) - 84.0).abs() < 1e-9);
        assert!((characteristics_match(&user, &off_vibrato, &weights) - 92.0).abs() < 1e-9);
    }

    #[test]
    fn test_quick_flow_is_seeded_and_bounded() {
        let scorer = RecommendationScorer::default();
        let profile = ScoringProfile::Minimal(VocalProfile::from_range(100.0, 300.0));
        let catalog: Vec<SongEntry> = (0..8)
            .map(|i| {
                let lo = 80.0 + 30.0 * i as f64;
                song(&format!("q{i}"), (lo, lo + 200.0), Difficulty::Easy)
            })
            .collect();

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            scorer.quick_recommendations(&profile, &catalog, &mut rng)
        };

        let first = run(9);
        assert_eq!(first, run(9));
        assert_eq!(first.len(), 5);
        assert!(first.iter().all(|r| r.match_score <= 100));
        assert!(first.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }

    #[test]
    fn test_quick_range_uses_widest_span() {
        let user = HzRange::new(100.0, 200.0);
        let song = HzRange::new(100.0, 400.0);
        assert!((quick_range_ratio(&user, &song) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(quick_range_ratio(&HzRange::new(0.0, 0.0), &HzRange::new(0.0, 0.0)), 0.0);
    }
}
