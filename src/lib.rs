// Export modules for use in tests
pub mod audio;
pub mod content;
pub mod document;
pub mod input;
pub mod layout;
pub mod panic_handler;
pub mod position;
pub mod progress;
pub mod scroll;
pub mod selection;
pub mod sentence;
pub mod session;
pub mod theme;
pub mod ui;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the session entry points
pub use session::{ReaderSession, run_session};
