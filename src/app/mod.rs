//! Usage: Application layer (process-wide wiring such as logging).

pub mod logging;
