pub mod card;
pub mod column;
pub mod drag;
pub mod error;

pub use card::{Card, CardId};
pub use column::{Column, ColumnId};
pub use drag::DragItem;
pub use error::BoardError;
