//! `scene_shared`
//!
//! Libraries shared by the scene client and its test harness.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (net, math, config, stage).
//! - Traits at the engine boundary for dependency injection.
//! - No `unsafe`.

pub mod config;
pub mod math;
pub mod net;
pub mod stage;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::stage::*;
}
