//! `scene_client`
//!
//! Client-side systems:
//! - Room gateway (handshake, patch queue, fire-and-forget commands)
//! - Entity mirror keeping local sprites in lockstep with room patches
//! - Per-tick input sampling
//! - Click-to-move planning for the locally-controlled entity
//! - Scene wiring driven by the host's frame loop

pub mod gateway;
pub mod input;
pub mod mirror;
pub mod planner;
pub mod scene;

pub use scene::GameScene;
