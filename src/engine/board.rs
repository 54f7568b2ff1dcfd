use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, Column, ColumnId, DragItem};
use crate::engine::notification::Notification;
use crate::engine::pending::{LedgerMark, OpId, OpStatus, PendingOps, Resolution};
use crate::engine::reducer::{reduce, BoardAction, BoardState};

const MAX_NOTIFICATIONS: usize = 50;

/// What to do locally when a column reassignment fails to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Put the card back in the column it had before the failed move.
    #[default]
    Rollback,
    /// Leave the optimistic assignment in place until the next refresh.
    KeepOptimistic,
}

/// A column reassignment the caller must persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistRequest {
    pub op_id: OpId,
    pub card_id: CardId,
    pub column_id: ColumnId,
}

/// Result of running a [`PersistRequest`], fed back via [`BoardEngine::apply_outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub op_id: OpId,
    pub card_id: CardId,
    pub column_id: ColumnId,
    pub error: Option<String>,
}

impl PersistOutcome {
    pub fn success(request: &PersistRequest) -> Self {
        Self {
            op_id: request.op_id,
            card_id: request.card_id.clone(),
            column_id: request.column_id,
            error: None,
        }
    }

    pub fn failure(request: &PersistRequest, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::success(request)
        }
    }
}

/// Actions applied and persistence work produced by one gesture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragEffects {
    pub actions: Vec<BoardAction>,
    pub persist: Vec<PersistRequest>,
}

impl DragEffects {
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty() && self.persist.is_empty()
    }
}

/// Local consequences of a persistence result.
#[derive(Debug, Clone)]
pub struct AppliedOutcome {
    pub resolution: Resolution,
    pub rollback: Option<BoardAction>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub status: Option<OpStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub enabled: bool,
    pub columns: Vec<ColumnView>,
    pub active_column: Option<Column>,
    pub active_card: Option<Card>,
    pub in_flight: usize,
}

#[derive(Debug)]
pub struct BoardEngine {
    state: BoardState,
    active_column: Option<Column>,
    active_card: Option<Card>,
    pending: PendingOps,
    notifications: Vec<Notification>,
    refresh_requested: bool,
    policy: RollbackPolicy,
}

impl BoardEngine {
    pub fn new(columns: Vec<Column>, cards: Vec<Card>, policy: RollbackPolicy) -> Self {
        let mut engine = Self {
            state: BoardState::default(),
            active_column: None,
            active_card: None,
            pending: PendingOps::new(),
            notifications: Vec::new(),
            refresh_requested: false,
            policy,
        };
        engine.replace_all(columns, cards);
        engine
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn columns(&self) -> &[Column] {
        &self.state.columns
    }

    pub fn cards(&self) -> &[Card] {
        &self.state.cards
    }

    pub fn cards_in(&self, column_id: ColumnId) -> impl Iterator<Item = &Card> {
        self.state
            .cards
            .iter()
            .filter(move |card| card.column_id == column_id)
    }

    /// A board without columns has nothing to drag or drop onto.
    pub fn is_enabled(&self) -> bool {
        !self.state.columns.is_empty()
    }

    pub fn active_column(&self) -> Option<&Column> {
        self.active_column.as_ref()
    }

    pub fn active_card(&self) -> Option<&Card> {
        self.active_card.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active_column.is_some() || self.active_card.is_some()
    }

    pub fn card_status(&self, card_id: &str) -> Option<OpStatus> {
        self.pending.status(card_id)
    }

    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let columns = self
            .state
            .columns
            .iter()
            .map(|column| ColumnView {
                column: column.clone(),
                cards: self
                    .cards_in(column.id)
                    .map(|card| CardView {
                        card: card.clone(),
                        status: self.pending.status(&card.id),
                    })
                    .collect(),
            })
            .collect();

        BoardSnapshot {
            enabled: self.is_enabled(),
            columns,
            active_column: self.active_column.clone(),
            active_card: self.active_card.clone(),
            in_flight: self.pending.in_flight(),
        }
    }

    // ── Gestures ───────────────────────────────────────────────

    /// Picks up a column or card. Returns `false` if nothing was picked up.
    pub fn begin_drag(&mut self, item: &DragItem) -> bool {
        self.active_column = None;
        self.active_card = None;

        if !self.is_enabled() {
            return false;
        }

        match item {
            DragItem::Column(id) => {
                self.active_column = self.state.columns.iter().find(|c| c.id == *id).cloned();
            }
            DragItem::Card(id) => {
                self.active_card = self.state.cards.iter().find(|c| &c.id == id).cloned();
            }
        }

        self.is_dragging()
    }

    /// Hover step. Only cards move here; columns are reordered on drop.
    pub fn drag_over(&mut self, active: &DragItem, over: &DragItem) -> DragEffects {
        let mut effects = DragEffects::default();

        if !self.is_enabled() || active == over {
            return effects;
        }
        let DragItem::Card(active_id) = active else {
            return effects;
        };
        let Some(active_index) = self.card_index(active_id) else {
            return effects;
        };
        let current_column = self.state.cards[active_index].column_id;

        match over {
            DragItem::Card(over_id) => {
                let Some(over_index) = self.card_index(over_id) else {
                    return effects;
                };
                let target_column = self.state.cards[over_index].column_id;

                if target_column == current_column {
                    self.apply(
                        BoardAction::CardMoved {
                            from: active_index,
                            to: over_index,
                        },
                        &mut effects,
                    );
                } else {
                    self.reassign(active_id, current_column, target_column, &mut effects);
                    self.apply(
                        BoardAction::CardMoved {
                            from: active_index,
                            to: over_index.saturating_sub(1),
                        },
                        &mut effects,
                    );
                }
            }
            DragItem::Column(column_id) => {
                if *column_id == current_column || self.column_index(*column_id).is_none() {
                    return effects;
                }
                self.reassign(active_id, current_column, *column_id, &mut effects);
            }
        }

        effects
    }

    /// Drop step. `over == None` means the pointer was released outside any target.
    pub fn end_drag(&mut self, active: &DragItem, over: Option<&DragItem>) -> DragEffects {
        let mut effects = DragEffects::default();
        self.active_column = None;
        self.active_card = None;

        if !self.is_enabled() {
            return effects;
        }
        let Some(over) = over else {
            return effects;
        };
        if active == over {
            return effects;
        }
        let DragItem::Column(active_id) = active else {
            return effects;
        };

        let over_column = match over {
            DragItem::Column(id) => *id,
            DragItem::Card(card_id) => match self.card_index(card_id) {
                Some(index) => self.state.cards[index].column_id,
                None => return effects,
            },
        };
        if over_column == *active_id {
            return effects;
        }

        if let (Some(from), Some(to)) = (self.column_index(*active_id), self.column_index(over_column)) {
            self.apply(BoardAction::ColumnMoved { from, to }, &mut effects);
        }

        effects
    }

    pub fn cancel_drag(&mut self) {
        self.active_column = None;
        self.active_card = None;
    }

    // ── Sync ───────────────────────────────────────────────────

    /// Position to hand back to [`BoardEngine::apply_refresh`] once a fetch
    /// started now has returned.
    pub fn ledger_mark(&self) -> LedgerMark {
        self.pending.mark()
    }

    /// Swaps in lists fetched after `mark` was taken.
    ///
    /// Cards with an op still in flight, or committed after `mark`, keep
    /// their local column over the fetched one and stay in the ledger.
    /// Returns how many fetched cards were overridden.
    pub fn apply_refresh(&mut self, mut columns: Vec<Column>, mut cards: Vec<Card>, mark: LedgerMark) -> usize {
        let mut overridden = 0;
        for card_id in self.pending.retain_unsettled(mark) {
            let Some(local_column) = self
                .state
                .cards
                .iter()
                .find(|c| c.id == card_id)
                .map(|c| c.column_id)
            else {
                continue;
            };
            if let Some(card) = cards.iter_mut().find(|c| c.id == card_id) {
                if card.column_id != local_column {
                    card.column_id = local_column;
                    overridden += 1;
                }
            }
        }

        Column::sort_by_sequence(&mut columns);
        self.state = BoardState { columns, cards };
        self.active_column = None;
        self.active_card = None;
        overridden
    }

    /// Swaps in freshly fetched lists. In-flight ops are forgotten; their
    /// late outcomes resolve as unknown.
    pub fn replace_all(&mut self, mut columns: Vec<Column>, cards: Vec<Card>) {
        Column::sort_by_sequence(&mut columns);
        self.state = BoardState { columns, cards };
        self.active_column = None;
        self.active_card = None;
        self.pending.clear();
        self.refresh_requested = false;
    }

    pub fn apply_outcome(&mut self, outcome: &PersistOutcome) -> AppliedOutcome {
        let resolution = self
            .pending
            .resolve(&outcome.card_id, outcome.op_id, outcome.error.is_none());

        let mut applied = AppliedOutcome {
            resolution,
            rollback: None,
            notification: None,
        };

        if let Some(error) = &outcome.error {
            let notification = Notification::error(
                "Error",
                format!("Could not move lead {}: {}", outcome.card_id, error),
            );
            self.notify(notification.clone());
            applied.notification = Some(notification);
        }

        match resolution {
            // A success the ledger no longer knows about may predate the data on screen.
            Resolution::Committed | Resolution::Unknown if outcome.error.is_none() => {
                self.refresh_requested = true;
            }
            Resolution::Failed {
                rollback_to: Some(column_id),
            } if self.policy == RollbackPolicy::Rollback => {
                let action = BoardAction::CardReassigned {
                    card_id: outcome.card_id.clone(),
                    column_id,
                };
                if reduce(&mut self.state, &action) {
                    tracing::debug!(
                        card_id = outcome.card_id.as_str(),
                        column_id,
                        "Rolled back failed column reassignment"
                    );
                    self.sync_active_card(&outcome.card_id, column_id);
                    applied.rollback = Some(action);
                }
            }
            _ => {}
        }

        applied
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Returns `true` once per requested refresh, and never mid-gesture.
    pub fn take_refresh_request(&mut self) -> bool {
        if self.is_dragging() {
            return false;
        }
        std::mem::take(&mut self.refresh_requested)
    }

    // ── Internals ──────────────────────────────────────────────

    fn card_index(&self, id: &str) -> Option<usize> {
        self.state.cards.iter().position(|c| c.id == id)
    }

    fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.state.columns.iter().position(|c| c.id == id)
    }

    fn reassign(
        &mut self,
        card_id: &str,
        previous_column: ColumnId,
        column_id: ColumnId,
        effects: &mut DragEffects,
    ) {
        let op_id = self.pending.begin(card_id, previous_column, column_id);
        self.apply(
            BoardAction::CardReassigned {
                card_id: card_id.to_string(),
                column_id,
            },
            effects,
        );
        self.sync_active_card(card_id, column_id);
        effects.persist.push(PersistRequest {
            op_id,
            card_id: card_id.to_string(),
            column_id,
        });
    }

    fn sync_active_card(&mut self, card_id: &str, column_id: ColumnId) {
        if let Some(card) = self.active_card.as_mut().filter(|c| c.id == card_id) {
            card.column_id = column_id;
        }
    }

    fn apply(&mut self, action: BoardAction, effects: &mut DragEffects) {
        let noop_move = matches!(
            &action,
            BoardAction::CardMoved { from, to } | BoardAction::ColumnMoved { from, to } if from == to
        );
        if noop_move {
            return;
        }
        if reduce(&mut self.state, &action) {
            tracing::trace!(?action, "Applied board action");
            effects.actions.push(action);
        }
    }
}
