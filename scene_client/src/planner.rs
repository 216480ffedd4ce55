//! Click-to-move planning.
//!
//! A pointer click arms a transient move target; each tick the planner
//! steers the locally-controlled sprite toward it and stops on arrival.
//! This is a latency-hiding hint only: the room's next authoritative change
//! patch overwrites whatever position the hint produced.

use scene_shared::{
    math::Vec2,
    stage::{SpriteId, Stage},
};
use tracing::debug;

/// Speed of the locally-controlled sprite, world units per second.
pub const MOVE_SPEED: f32 = 200.0;

/// Arrival tolerance, world units. Inside it the target is consumed.
pub const ARRIVE_RADIUS: f32 = 4.0;

/// Current movement intent. At most one target; new clicks replace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovePlan {
    Idle,
    Seeking(Vec2),
}

/// Two-state click-to-move machine.
#[derive(Debug)]
pub struct Planner {
    plan: MovePlan,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            plan: MovePlan::Idle,
        }
    }
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> MovePlan {
        self.plan
    }

    /// Arms (or re-arms) the move target. Clicks never queue.
    pub fn pointer_down(&mut self, at: Vec2) {
        debug!(x = at.x, y = at.y, "Move target set");
        self.plan = MovePlan::Seeking(at);
    }

    /// Steers the local sprite for one tick.
    ///
    /// A missing sprite means the local entity has not synced yet; the plan
    /// stays armed and is retried next tick.
    pub fn tick(&mut self, stage: &mut impl Stage, local: Option<SpriteId>) {
        let MovePlan::Seeking(target) = self.plan else {
            return;
        };
        let Some(sprite) = local else {
            return;
        };
        let Some(position) = stage.position(sprite) else {
            return;
        };

        let distance = position.distance(target);
        if distance > ARRIVE_RADIUS {
            let angle = position.bearing(target);
            stage.set_velocity(
                sprite,
                Vec2::new(angle.cos() * MOVE_SPEED, angle.sin() * MOVE_SPEED),
            );
        } else {
            stage.set_velocity(sprite, Vec2::ZERO);
            self.plan = MovePlan::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_shared::stage::HeadlessStage;

    #[test]
    fn seeks_clicked_target_at_move_speed() {
        let mut stage = HeadlessStage::new();
        let sprite = stage.spawn(Vec2::ZERO);
        let mut planner = Planner::new();

        planner.pointer_down(Vec2::new(100.0, 0.0));
        planner.tick(&mut stage, Some(sprite));

        let vel = stage.velocity(sprite).unwrap();
        assert!((vel.x - MOVE_SPEED).abs() < 1e-3);
        assert!(vel.y.abs() < 1e-3);
        assert_eq!(planner.plan(), MovePlan::Seeking(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn stops_and_consumes_target_on_arrival() {
        let mut stage = HeadlessStage::new();
        let sprite = stage.spawn(Vec2::new(98.0, 0.0));
        let mut planner = Planner::new();

        planner.pointer_down(Vec2::new(100.0, 0.0));
        planner.tick(&mut stage, Some(sprite));

        assert_eq!(stage.velocity(sprite), Some(Vec2::ZERO));
        assert_eq!(planner.plan(), MovePlan::Idle);
    }

    #[test]
    fn drives_to_arrival_over_many_ticks() {
        let mut stage = HeadlessStage::new();
        let sprite = stage.spawn(Vec2::ZERO);
        let mut planner = Planner::new();
        planner.pointer_down(Vec2::new(100.0, 0.0));

        let dt = 1.0 / 60.0;
        for _ in 0..200 {
            planner.tick(&mut stage, Some(sprite));
            stage.step(dt);
            if planner.plan() == MovePlan::Idle {
                break;
            }
        }

        assert_eq!(planner.plan(), MovePlan::Idle);
        let pos = stage.position(sprite).unwrap();
        assert!(pos.distance(Vec2::new(100.0, 0.0)) <= ARRIVE_RADIUS + MOVE_SPEED * dt);
        assert_eq!(stage.velocity(sprite), Some(Vec2::ZERO));
    }

    #[test]
    fn newest_click_wins_on_the_next_tick() {
        let mut stage = HeadlessStage::new();
        let sprite = stage.spawn(Vec2::ZERO);
        let mut planner = Planner::new();

        planner.pointer_down(Vec2::new(100.0, 0.0));
        planner.tick(&mut stage, Some(sprite));
        planner.pointer_down(Vec2::new(0.0, 100.0));
        planner.tick(&mut stage, Some(sprite));

        let vel = stage.velocity(sprite).unwrap();
        assert!(vel.x.abs() < 1e-3);
        assert!((vel.y - MOVE_SPEED).abs() < 1e-3);
    }

    #[test]
    fn missing_local_sprite_keeps_seeking() {
        let mut stage = HeadlessStage::new();
        let mut planner = Planner::new();

        planner.pointer_down(Vec2::new(50.0, 50.0));
        planner.tick(&mut stage, None);

        assert_eq!(planner.plan(), MovePlan::Seeking(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn idle_tick_touches_nothing() {
        let mut stage = HeadlessStage::new();
        let sprite = stage.spawn(Vec2::ZERO);
        stage.set_velocity(sprite, Vec2::new(7.0, 7.0));
        let mut planner = Planner::new();

        planner.tick(&mut stage, Some(sprite));

        // No target armed, so keyboard-driven velocity is left alone.
        assert_eq!(stage.velocity(sprite), Some(Vec2::new(7.0, 7.0)));
    }
}
