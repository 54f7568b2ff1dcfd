pub mod board;

pub use board::{
    BeginDragRequest, BeginDragResponse, DragOverRequest, DragResponse, EndDragRequest,
};
