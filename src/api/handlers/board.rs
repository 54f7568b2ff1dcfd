use axum::{extract::State, http::StatusCode, Json};

use crate::api::dto::{
    BeginDragRequest, BeginDragResponse, DragOverRequest, DragResponse, EndDragRequest,
};
use crate::api::AppState;
use crate::domain::BoardError;
use crate::engine::{BoardSnapshot, Notification};

pub async fn get_board(State(state): State<AppState>) -> Result<Json<BoardSnapshot>, BoardError> {
    let board = state.require_board()?;
    Ok(Json(board.snapshot().await))
}

pub async fn refresh_board(
    State(state): State<AppState>,
) -> Result<Json<BoardSnapshot>, BoardError> {
    let board = state.require_board()?;
    board.refresh().await?;
    Ok(Json(board.snapshot().await))
}

pub async fn begin_drag(
    State(state): State<AppState>,
    Json(req): Json<BeginDragRequest>,
) -> Result<Json<BeginDragResponse>, BoardError> {
    let board = state.require_board()?;
    let picked_up = board.begin_drag(&req.item).await;
    Ok(Json(BeginDragResponse {
        picked_up,
        board: board.snapshot().await,
    }))
}

pub async fn drag_over(
    State(state): State<AppState>,
    Json(req): Json<DragOverRequest>,
) -> Result<Json<DragResponse>, BoardError> {
    let board = state.require_board()?;
    let effects = board.drag_over(&req.active, &req.over).await;
    Ok(Json(DragResponse::from_effects(effects, board.snapshot().await)))
}

pub async fn end_drag(
    State(state): State<AppState>,
    Json(req): Json<EndDragRequest>,
) -> Result<Json<DragResponse>, BoardError> {
    let board = state.require_board()?;
    let effects = board.end_drag(&req.active, req.over.as_ref()).await;
    Ok(Json(DragResponse::from_effects(effects, board.snapshot().await)))
}

pub async fn cancel_drag(State(state): State<AppState>) -> Result<StatusCode, BoardError> {
    let board = state.require_board()?;
    board.cancel_drag().await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, BoardError> {
    let board = state.require_board()?;
    Ok(Json(board.notifications().await))
}
