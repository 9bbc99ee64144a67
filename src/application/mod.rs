//! Application layer: transport-agnostic operation handlers.

pub mod handlers;
