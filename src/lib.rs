//! Vocabulary trainer core: the word collection, bookmarks, multiple-choice
//! quizzes, study statistics and their durable storage.
//!
//! [`app::AppStore`] is the entry point; the binary in `main.rs` is a thin
//! text front end over it.

pub mod app;
pub mod clock;
pub mod config;
pub mod engine;
pub mod logging;
pub mod session;
pub mod store;
pub mod words;

pub use app::AppStore;
