//! Usage: Cross-cutting utilities shared across domains (low-level helpers, pure logic).

pub mod app_kind;
pub mod error;
pub mod fs;
