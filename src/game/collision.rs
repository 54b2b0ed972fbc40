//! Collision detection and lives/invulnerability bookkeeping.

use tracing::debug;

use super::obstacle::Obstacle;
use crate::params::PlayfieldConfig;

/// Axis-aligned collision test between the actor and the field
#[derive(Debug, Clone)]
pub struct CollisionSystem {
    actor_left: f64,
    actor_size: f64,
    max_actor_y: f64,
    obstacle_width: f64,
}

impl CollisionSystem {
    pub fn new(playfield: &PlayfieldConfig, obstacle_width: f64) -> Self {
        Self {
            actor_left: playfield.actor_x_px,
            actor_size: playfield.actor_size_px,
            max_actor_y: playfield.max_actor_y(),
            obstacle_width,
        }
    }

    /// True if the actor at `actor_y` is out of bounds or inside a barrier
    pub fn detect(&self, actor_y: f64, obstacles: &[Obstacle]) -> bool {
        if actor_y < 0.0 || actor_y > self.max_actor_y {
            return true;
        }

        let actor_right = self.actor_left + self.actor_size;
        let actor_top = actor_y;
        let actor_bottom = actor_y + self.actor_size;

        obstacles.iter().any(|o| {
            let overlaps_x = actor_right > o.x && self.actor_left < o.x + self.obstacle_width;
            let outside_gap = actor_top < o.gap_top || actor_bottom > o.gap_bottom();
            overlaps_x && outside_gap
        })
    }
}

/// Result of feeding one tick's collision flag through [`DamageState::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// No collision this tick
    None,
    /// Collision during the grace window; nothing changes
    Absorbed,
    /// A life was lost and a grace window opened
    Hit {
        lives_remaining: u32,
        invulnerable_until: u64,
    },
    /// The last life was lost
    Fatal,
}

/// Lives and the post-hit grace window. Lives only change through `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageState {
    lives: u32,
    max_lives: u32,
    invulnerable_until: Option<u64>,
}

impl DamageState {
    pub fn new(max_lives: u32) -> Self {
        Self {
            lives: max_lives,
            max_lives,
            invulnerable_until: None,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    pub fn invulnerable_until(&self) -> Option<u64> {
        self.invulnerable_until
    }

    pub fn is_invulnerable(&self, now: u64) -> bool {
        matches!(self.invulnerable_until, Some(until) if now < until)
    }

    /// Clear an elapsed grace window. Returns true if one was cleared.
    pub fn expire(&mut self, now: u64) -> bool {
        match self.invulnerable_until {
            Some(until) if now >= until => {
                self.invulnerable_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn apply(&mut self, collided: bool, now: u64, grace_ticks: u64) -> DamageOutcome {
        if !collided {
            return DamageOutcome::None;
        }
        if self.is_invulnerable(now) {
            return DamageOutcome::Absorbed;
        }

        debug_assert!(self.lives > 0, "damage applied with no lives left");
        self.lives = self.lives.saturating_sub(1);

        if self.lives == 0 {
            self.invulnerable_until = None;
            debug!(now, "Final life lost");
            return DamageOutcome::Fatal;
        }

        let until = now.saturating_add(grace_ticks);
        self.invulnerable_until = Some(until);
        debug!(lives = self.lives, until, "Life lost");
        DamageOutcome::Hit {
            lives_remaining: self.lives,
            invulnerable_until: until,
        }
    }

    pub fn reset(&mut self) {
        self.lives = self.max_lives;
        self.invulnerable_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> CollisionSystem {
        CollisionSystem::new(&PlayfieldConfig::default(), 80.0)
    }

    fn obstacle(x: f64, gap_top: f64) -> Obstacle {
        Obstacle {
            id: 0,
            x,
            gap_top,
            gap_size: 200.0,
            passed: false,
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let s = system();
        assert!(s.detect(-0.1, &[]));
        assert!(s.detect(680.1, &[]));
        assert!(!s.detect(0.0, &[]));
        assert!(!s.detect(680.0, &[]));
    }

    #[test]
    fn test_inside_gap_is_safe() {
        let s = system();
        // Actor spans x 100..140; obstacle spans 90..170
        let obstacles = [obstacle(90.0, 300.0)];
        assert!(!s.detect(300.0, &obstacles));
        assert!(!s.detect(460.0, &obstacles));
    }

    #[test]
    fn test_outside_gap_collides() {
        let s = system();
        let obstacles = [obstacle(90.0, 300.0)];
        assert!(s.detect(299.0, &obstacles));
        assert!(s.detect(461.0, &obstacles));
    }

    #[test]
    fn test_no_horizontal_overlap() {
        let s = system();
        // Touching edges do not overlap
        assert!(!s.detect(0.0, &[obstacle(140.0, 300.0)]));
        assert!(!s.detect(0.0, &[obstacle(20.0, 300.0)]));
        assert!(s.detect(0.0, &[obstacle(139.0, 300.0)]));
    }

    #[test]
    fn test_hit_opens_grace_window() {
        let mut d = DamageState::new(3);
        assert_eq!(d.apply(false, 10, 120), DamageOutcome::None);
        assert_eq!(
            d.apply(true, 10, 120),
            DamageOutcome::Hit {
                lives_remaining: 2,
                invulnerable_until: 130
            }
        );
        assert!(d.is_invulnerable(129));
        assert!(!d.is_invulnerable(130));
    }

    #[test]
    fn test_repeated_collisions_in_window_cost_one_life() {
        let mut d = DamageState::new(3);
        d.apply(true, 0, 120);
        for now in 1..120 {
            assert_eq!(d.apply(true, now, 120), DamageOutcome::Absorbed);
        }
        assert_eq!(d.lives(), 2);
        // Absorbed hits never extend the window
        assert_eq!(d.invulnerable_until(), Some(120));
    }

    #[test]
    fn test_expire() {
        let mut d = DamageState::new(3);
        d.apply(true, 0, 120);
        assert!(!d.expire(119));
        assert!(d.expire(120));
        assert_eq!(d.invulnerable_until(), None);
        assert!(!d.expire(121));
    }

    #[test]
    fn test_huge_grace_saturates() {
        let mut d = DamageState::new(3);
        assert_eq!(
            d.apply(true, 10, u64::MAX),
            DamageOutcome::Hit {
                lives_remaining: 2,
                invulnerable_until: u64::MAX
            }
        );
        assert!(d.is_invulnerable(u64::MAX - 1));
        assert_eq!(d.apply(true, 1_000_000, u64::MAX), DamageOutcome::Absorbed);
    }

    #[test]
    fn test_fatal_on_last_life() {
        let mut d = DamageState::new(2);
        d.apply(true, 0, 10);
        d.expire(10);
        assert_eq!(d.apply(true, 10, 10), DamageOutcome::Fatal);
        assert_eq!(d.lives(), 0);
    }

    #[test]
    fn test_reset() {
        let mut d = DamageState::new(3);
        d.apply(true, 0, 10);
        d.reset();
        assert_eq!(d.lives(), 3);
        assert_eq!(d.invulnerable_until(), None);
    }
}
