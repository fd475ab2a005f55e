//! Helpers for tests that exercise the engine against a real SQLite database and in-memory fakes of the external
//! services.
pub mod fakes;
pub mod fixtures;
pub mod prepare_env;
