//! Gemlet - Gemini Server
//!
//! Core library for the Gemini protocol, capsule dispatch and static
//! document serving.

pub mod capsule;
pub mod config;
pub mod dispatch;
pub mod files;
pub mod gemini;
pub mod server;
