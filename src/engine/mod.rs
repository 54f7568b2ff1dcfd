//! In-memory drag/reorder engine for the stage/lead board.
//!
//! The engine is synchronous. Gestures mutate local state through
//! [`reducer::reduce`] and hand back any persistence work as
//! [`PersistRequest`]s for the caller to run.

pub mod board;
pub mod event;
pub mod notification;
pub mod pending;
pub mod reducer;

pub use board::{
    AppliedOutcome, BoardEngine, BoardSnapshot, CardView, ColumnView, DragEffects, PersistOutcome,
    PersistRequest, RollbackPolicy,
};
pub use notification::{Notification, NotificationLevel};
pub use event::BoardEvent;
pub use pending::{LedgerMark, OpId, OpStatus, PendingOps, Resolution};
pub use reducer::{array_move, reduce, BoardAction, BoardState};
