//! Async match host for the real-time chess core: a session actor that owns a
//! `kfchess::Game`, ticks it on a timer and fans its events out.

pub mod assets;
pub mod config;
pub mod input;
pub mod session;
