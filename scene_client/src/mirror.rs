//! Entity mirror.
//!
//! Keeps one stage sprite per remote entity, in lockstep with the room's
//! add/change/remove patches. The mirror owns the identity → sprite map;
//! the stage owns the sprites themselves.
//!
//! The server is authoritative: a change patch overwrites the sprite's
//! position unconditionally, including anything click-to-move predicted.

use std::collections::HashMap;

use scene_shared::{
    net::{PlayerState, SessionId},
    stage::{SpriteId, Stage},
};
use tracing::{debug, warn};

use crate::gateway::PatchHandler;

/// Identity → sprite map. At most one sprite per session id.
#[derive(Default)]
pub struct EntityMirror {
    sprites: HashMap<SessionId, SpriteId>,
}

impl EntityMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sprite handle for an identity, if currently mirrored.
    pub fn sprite(&self, session_id: &SessionId) -> Option<SpriteId> {
        self.sprites.get(session_id).copied()
    }

    /// Number of live mirrored entities.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Borrows the mirror together with a stage for patch dispatch.
    pub fn bind<'a, S: Stage>(&'a mut self, stage: &'a mut S) -> MirrorView<'a, S> {
        MirrorView {
            mirror: self,
            stage,
        }
    }

    /// Despawns every mirrored sprite. Scene teardown only.
    pub fn clear<S: Stage>(&mut self, stage: &mut S) {
        for (_, sprite) in self.sprites.drain() {
            stage.despawn(sprite);
        }
    }
}

/// Mirror + stage pair that consumes entity patches.
pub struct MirrorView<'a, S: Stage> {
    mirror: &'a mut EntityMirror,
    stage: &'a mut S,
}

impl<S: Stage> PatchHandler for MirrorView<'_, S> {
    fn on_added(&mut self, session_id: &SessionId, state: PlayerState) {
        if let Some(old) = self.mirror.sprites.remove(session_id) {
            // Protocol anomaly: the room re-announced a known identity.
            // Recover by replacing, never by leaking the old sprite.
            warn!(session = %session_id, "Duplicate add for known entity, replacing");
            self.stage.despawn(old);
        }
        let sprite = self.stage.spawn(state.position());
        self.mirror.sprites.insert(session_id.clone(), sprite);
        debug!(session = %session_id, x = state.x, y = state.y, "Entity added");
    }

    fn on_changed(&mut self, session_id: &SessionId, state: PlayerState) {
        match self.mirror.sprites.get(session_id) {
            Some(&sprite) => {
                self.stage.set_position(sprite, state.position());
            }
            None => {
                // Benign race with removal; change patches may still be in
                // flight for an entity we no longer mirror.
                debug!(session = %session_id, "Change for unknown entity, ignoring");
            }
        }
    }

    fn on_removed(&mut self, session_id: &SessionId) {
        match self.mirror.sprites.remove(session_id) {
            Some(sprite) => {
                self.stage.despawn(sprite);
                debug!(session = %session_id, "Entity removed");
            }
            None => {
                debug!(session = %session_id, "Remove for unknown entity, ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_shared::math::Vec2;
    use scene_shared::stage::HeadlessStage;

    fn state(x: f32, y: f32) -> PlayerState {
        PlayerState { x, y }
    }

    #[test]
    fn add_creates_sprite_at_initial_position() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        mirror.bind(&mut stage).on_added(&"a".into(), state(5.0, 7.0));

        let sprite = mirror.sprite(&"a".into()).unwrap();
        assert_eq!(stage.position(sprite), Some(Vec2::new(5.0, 7.0)));
        assert_eq!(mirror.len(), 1);
        assert_eq!(stage.sprite_count(), 1);
    }

    #[test]
    fn live_count_matches_adds_minus_removes() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        {
            let mut view = mirror.bind(&mut stage);
            view.on_added(&"a".into(), state(0.0, 0.0));
            view.on_added(&"b".into(), state(1.0, 1.0));
            view.on_added(&"c".into(), state(2.0, 2.0));
            view.on_removed(&"b".into());
        }
        assert_eq!(mirror.len(), 2);
        assert_eq!(stage.sprite_count(), 2);
        assert!(mirror.sprite(&"b".into()).is_none());
    }

    #[test]
    fn change_overwrites_position_unconditionally() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        mirror.bind(&mut stage).on_added(&"a".into(), state(0.0, 0.0));

        let sprite = mirror.sprite(&"a".into()).unwrap();
        // Locally predicted motion loses to the authoritative patch.
        stage.set_velocity(sprite, Vec2::new(200.0, 0.0));
        stage.step(1.0);
        mirror.bind(&mut stage).on_changed(&"a".into(), state(42.0, -8.0));

        assert_eq!(stage.position(sprite), Some(Vec2::new(42.0, -8.0)));
    }

    #[test]
    fn stale_change_is_ignored() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        mirror
            .bind(&mut stage)
            .on_changed(&"ghost".into(), state(9.0, 9.0));
        assert!(mirror.is_empty());
        assert_eq!(stage.sprite_count(), 0);
    }

    #[test]
    fn double_remove_is_a_noop() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        {
            let mut view = mirror.bind(&mut stage);
            view.on_added(&"a".into(), state(0.0, 0.0));
            view.on_removed(&"a".into());
            view.on_removed(&"a".into());
        }
        assert!(mirror.is_empty());
        assert_eq!(stage.sprite_count(), 0);
    }

    #[test]
    fn duplicate_add_replaces_without_leaking() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        {
            let mut view = mirror.bind(&mut stage);
            view.on_added(&"a".into(), state(0.0, 0.0));
            view.on_added(&"a".into(), state(10.0, 10.0));
        }
        // Exactly one sprite survives, at the newest position.
        assert_eq!(mirror.len(), 1);
        assert_eq!(stage.sprite_count(), 1);
        let sprite = mirror.sprite(&"a".into()).unwrap();
        assert_eq!(stage.position(sprite), Some(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn clear_despawns_everything() {
        let mut mirror = EntityMirror::new();
        let mut stage = HeadlessStage::new();
        {
            let mut view = mirror.bind(&mut stage);
            view.on_added(&"a".into(), state(0.0, 0.0));
            view.on_added(&"b".into(), state(1.0, 1.0));
        }
        mirror.clear(&mut stage);
        assert!(mirror.is_empty());
        assert_eq!(stage.sprite_count(), 0);
    }
}
