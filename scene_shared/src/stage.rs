//! Stage abstraction.
//!
//! This crate intentionally does not depend on a rendering engine.
//! `Stage` is the boundary the engine runtime satisfies: it owns the actual
//! drawable sprites; the client only holds opaque handles.

use std::collections::HashMap;

use crate::math::Vec2;

/// Opaque handle to one stage sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u64);

/// Renderable/movable primitives provided by the engine runtime.
pub trait Stage {
    /// Creates a sprite at the given position. Velocity starts at zero.
    fn spawn(&mut self, at: Vec2) -> SpriteId;
    /// Destroys a sprite. Unknown handles are a no-op.
    fn despawn(&mut self, sprite: SpriteId);
    fn position(&self, sprite: SpriteId) -> Option<Vec2>;
    fn set_position(&mut self, sprite: SpriteId, at: Vec2);
    fn set_velocity(&mut self, sprite: SpriteId, vel: Vec2);
    /// One-line status text shown to the user (connection state).
    fn set_status_text(&mut self, text: &str);
}

/// In-memory stage for headless runs and tests.
///
/// Integrates velocity on [`HeadlessStage::step`] the way an arcade physics
/// body would, so motion-hint behavior is observable without a renderer.
#[derive(Default)]
pub struct HeadlessStage {
    next_id: u64,
    sprites: HashMap<SpriteId, Body>,
    status: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    position: Vec2,
    velocity: Vec2,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances all sprite positions by `velocity * dt`.
    pub fn step(&mut self, dt: f32) {
        for body in self.sprites.values_mut() {
            body.position.x += body.velocity.x * dt;
            body.position.y += body.velocity.y * dt;
        }
    }

    pub fn velocity(&self, sprite: SpriteId) -> Option<Vec2> {
        self.sprites.get(&sprite).map(|b| b.velocity)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }
}

impl Stage for HeadlessStage {
    fn spawn(&mut self, at: Vec2) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        self.sprites.insert(
            id,
            Body {
                position: at,
                velocity: Vec2::ZERO,
            },
        );
        id
    }

    fn despawn(&mut self, sprite: SpriteId) {
        self.sprites.remove(&sprite);
    }

    fn position(&self, sprite: SpriteId) -> Option<Vec2> {
        self.sprites.get(&sprite).map(|b| b.position)
    }

    fn set_position(&mut self, sprite: SpriteId, at: Vec2) {
        if let Some(body) = self.sprites.get_mut(&sprite) {
            body.position = at;
        }
    }

    fn set_velocity(&mut self, sprite: SpriteId, vel: Vec2) {
        if let Some(body) = self.sprites.get_mut(&sprite) {
            body.velocity = vel;
        }
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }
}
