pub mod board_session;
pub mod board_source;

pub use board_session::{BoardSession, SessionSettings};
pub use board_source::{BoardSource, CardColumnPersister};
