//! Test support for the scene crates.

pub mod stub_room;
