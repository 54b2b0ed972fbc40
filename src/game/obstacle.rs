//! Scrolling obstacles with a vertical gap.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::params::{ObstacleConfig, PlayfieldConfig};

/// A vertical barrier with one opening.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub id: u64,
    /// Left edge (px)
    pub x: f64,
    /// Top of the opening (px)
    pub gap_top: f64,
    /// Height of the opening (px)
    pub gap_size: f64,
    /// Flips once, when the obstacle clears the actor
    pub passed: bool,
}

impl Obstacle {
    pub fn gap_bottom(&self) -> f64 {
        self.gap_top + self.gap_size
    }
}

/// Ordered collection of live obstacles, oldest first
#[derive(Debug, Clone)]
pub struct ObstacleField {
    config: ObstacleConfig,
    playfield_height: f64,
    obstacles: Vec<Obstacle>,
    next_id: u64,
}

impl ObstacleField {
    pub fn new(config: ObstacleConfig, playfield: &PlayfieldConfig) -> Self {
        Self {
            config,
            playfield_height: playfield.height_px,
            obstacles: Vec::new(),
            next_id: 0,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn width(&self) -> f64 {
        self.config.width_px
    }

    pub fn config(&self) -> &ObstacleConfig {
        &self.config
    }

    /// Advect every obstacle left, then drop those fully off-screen
    pub fn tick(&mut self, speed: f64) {
        for obstacle in &mut self.obstacles {
            obstacle.x -= speed;
        }

        let width = self.config.width_px;
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.x > -width);
        if self.obstacles.len() != before {
            trace!(removed = before - self.obstacles.len(), "Obstacles left the field");
        }
    }

    /// Spawn at the right edge when the field is empty or the newest
    /// obstacle has moved far enough in. Returns the new obstacle's id.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        playfield_width: f64,
        min_spawn_gap_px: f64,
        rng: &mut R,
    ) -> Option<u64> {
        let due = match self.obstacles.last() {
            None => true,
            Some(last) => last.x < playfield_width - min_spawn_gap_px,
        };
        if !due {
            return None;
        }

        let margin = self.config.gap_margin_px;
        let gap_size = self.config.gap_px;
        let highest_top = self.playfield_height - gap_size - margin;
        let gap_top = if highest_top > margin {
            rng.gen_range(margin..=highest_top)
        } else {
            margin
        };

        let id = self.next_id;
        self.next_id += 1;
        self.obstacles.push(Obstacle {
            id,
            x: playfield_width,
            gap_top,
            gap_size,
            passed: false,
        });

        debug!(id, gap_top, "Spawned obstacle");
        Some(id)
    }

    /// Mark obstacles whose trailing edge is behind the actor's leading edge.
    /// Returns how many flipped to `passed` on this call.
    pub fn mark_passed_and_score(&mut self, actor_leading_edge_x: f64) -> u32 {
        let width = self.config.width_px;
        let mut newly_passed = 0;
        for obstacle in &mut self.obstacles {
            if !obstacle.passed && obstacle.x + width <= actor_leading_edge_x {
                obstacle.passed = true;
                newly_passed += 1;
            }
        }
        newly_passed
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn field() -> ObstacleField {
        ObstacleField::new(ObstacleConfig::default(), &PlayfieldConfig::default())
    }

    #[test]
    fn test_spawns_when_empty() {
        let mut field = field();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(field.maybe_spawn(1280.0, 500.0, &mut rng), Some(0));
        let o = &field.obstacles()[0];
        assert_eq!(o.x, 1280.0);
        assert!(o.gap_top >= 50.0 && o.gap_top <= 720.0 - 200.0 - 50.0);
        assert!(!o.passed);
    }

    #[test]
    fn test_spawn_spacing() {
        let mut field = field();
        let mut rng = StdRng::seed_from_u64(1);
        field.maybe_spawn(1280.0, 500.0, &mut rng);

        // Last obstacle still within 500px of the right edge
        assert_eq!(field.maybe_spawn(1280.0, 500.0, &mut rng), None);

        // 1280 - 1.5 * 354 = 749 < 780
        for _ in 0..354 {
            field.tick(1.5);
        }
        assert_eq!(field.maybe_spawn(1280.0, 500.0, &mut rng), Some(1));
        assert_eq!(field.obstacles().len(), 2);
    }

    #[test]
    fn test_removed_once_fully_off_screen() {
        let mut field = field();
        let mut rng = StdRng::seed_from_u64(2);
        field.maybe_spawn(0.0, 500.0, &mut rng);

        field.tick(79.0);
        assert_eq!(field.obstacles().len(), 1);
        field.tick(1.0);
        assert!(field.obstacles().is_empty());
    }

    #[test]
    fn test_pass_counts_once() {
        let mut field = field();
        let mut rng = StdRng::seed_from_u64(3);
        field.maybe_spawn(200.0, 500.0, &mut rng);

        // Trailing edge at 280 is ahead of the actor at 140
        assert_eq!(field.mark_passed_and_score(140.0), 0);

        field.tick(140.0);
        assert_eq!(field.mark_passed_and_score(140.0), 1);
        assert!(field.obstacles()[0].passed);

        field.tick(10.0);
        assert_eq!(field.mark_passed_and_score(140.0), 0);
    }

    #[test]
    fn test_degenerate_gap_pins_to_margin() {
        let playfield = PlayfieldConfig {
            height_px: 300.0,
            ..PlayfieldConfig::default()
        };
        let mut field = ObstacleField::new(ObstacleConfig::default(), &playfield);
        let mut rng = StdRng::seed_from_u64(4);
        field.maybe_spawn(1280.0, 500.0, &mut rng);
        assert_eq!(field.obstacles()[0].gap_top, 50.0);
    }

    #[test]
    fn test_seeded_spawns_are_reproducible() {
        let gaps = |seed| {
            let mut field = field();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut tops = Vec::new();
            for _ in 0..2000 {
                field.tick(1.5);
                if field.maybe_spawn(1280.0, 500.0, &mut rng).is_some() {
                    tops.push(field.obstacles().last().map(|o| o.gap_top));
                }
            }
            tops
        };
        assert_eq!(gaps(42), gaps(42));
    }

    #[test]
    fn test_clear() {
        let mut field = field();
        let mut rng = StdRng::seed_from_u64(5);
        field.maybe_spawn(1280.0, 500.0, &mut rng);
        field.clear();
        assert!(field.obstacles().is_empty());
        assert_eq!(field.maybe_spawn(1280.0, 500.0, &mut rng), Some(0));
    }
}
