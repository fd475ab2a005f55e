//! SQLite storage backend for the recharge engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::{SqliteDatabase, SqlitePendingAccount, ABANDONED_SIGNUP_MINS, DEFAULT_RESERVATION_WINDOW_MINS};
