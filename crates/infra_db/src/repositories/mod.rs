//! Repository implementations

pub mod billing;
