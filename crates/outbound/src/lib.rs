//! Outbound payloads written to an async byte channel

pub mod send;

pub use send::*;
