use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CardId, ColumnId};

pub type OpId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    Pending,
    Committed,
    Failed,
}

#[derive(Debug, Clone)]
struct PendingOp {
    id: OpId,
    previous_column: ColumnId,
    column_id: ColumnId,
    status: OpStatus,
    touched: u64,
}

/// What the caller should do locally after a persistence result comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Committed,
    /// `rollback_to` is set only when the failed op was the one the board is
    /// currently showing for that card.
    Failed { rollback_to: Option<ColumnId> },
    /// The op was dropped by a refresh or never existed.
    Unknown,
}

/// Ledger position taken before a board fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LedgerMark(u64);

/// Ledger of optimistic column reassignments, keyed by card.
#[derive(Debug, Default)]
pub struct PendingOps {
    by_card: HashMap<CardId, Vec<PendingOp>>,
    next_id: OpId,
    clock: u64,
}

impl PendingOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, card_id: &str, previous_column: ColumnId, column_id: ColumnId) -> OpId {
        self.next_id += 1;
        let id = self.next_id;
        let touched = self.tick();
        self.by_card
            .entry(card_id.to_string())
            .or_default()
            .push(PendingOp {
                id,
                previous_column,
                column_id,
                status: OpStatus::Pending,
                touched,
            });
        id
    }

    pub fn resolve(&mut self, card_id: &str, op_id: OpId, succeeded: bool) -> Resolution {
        let touched = self.clock + 1;
        let Some(ops) = self.by_card.get_mut(card_id) else {
            return Resolution::Unknown;
        };
        let Some(index) = ops.iter().position(|op| op.id == op_id) else {
            return Resolution::Unknown;
        };
        if ops[index].status != OpStatus::Pending {
            return Resolution::Unknown;
        }
        ops[index].touched = touched;
        self.clock = touched;

        let resolution = if succeeded {
            ops[index].status = OpStatus::Committed;
            Resolution::Committed
        } else {
            // A later op that has not failed still owns the displayed column.
            let superseded = ops[index + 1..]
                .iter()
                .any(|op| op.status != OpStatus::Failed);
            ops[index].status = OpStatus::Failed;

            let rollback_to = if superseded {
                None
            } else {
                let last_good = ops[..index]
                    .iter()
                    .rev()
                    .find(|op| op.status != OpStatus::Failed)
                    .map(|op| op.column_id);
                Some(last_good.unwrap_or(ops[0].previous_column))
            };
            Resolution::Failed { rollback_to }
        };

        if ops.iter().all(|op| op.status != OpStatus::Pending) {
            let newest = ops.len() - 1;
            ops.drain(..newest);
        }

        resolution
    }

    /// Status of the newest op recorded for `card_id`.
    pub fn status(&self, card_id: &str) -> Option<OpStatus> {
        self.by_card
            .get(card_id)
            .and_then(|ops| ops.last())
            .map(|op| op.status)
    }

    pub fn in_flight(&self) -> usize {
        self.by_card
            .values()
            .flatten()
            .filter(|op| op.status == OpStatus::Pending)
            .count()
    }

    pub fn mark(&self) -> LedgerMark {
        LedgerMark(self.clock)
    }

    /// Drops the history of cards a fetch started at `mark` already reflects.
    ///
    /// A card is kept while one of its ops is still pending, or was committed
    /// after `mark` and so may be missing from the fetched data. Returns the
    /// kept card ids.
    pub fn retain_unsettled(&mut self, mark: LedgerMark) -> Vec<CardId> {
        self.by_card.retain(|_, ops| {
            ops.iter().any(|op| match op.status {
                OpStatus::Pending => true,
                OpStatus::Committed => op.touched > mark.0,
                OpStatus::Failed => false,
            })
        });
        self.by_card.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.by_card.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_commits_newest_op() {
        let mut ops = PendingOps::new();
        let id = ops.begin("a", 1, 2);
        assert_eq!(ops.status("a"), Some(OpStatus::Pending));
        assert_eq!(ops.resolve("a", id, true), Resolution::Committed);
        assert_eq!(ops.status("a"), Some(OpStatus::Committed));
        assert_eq!(ops.in_flight(), 0);
    }

    #[test]
    fn failure_of_newest_op_rolls_back_to_previous_column() {
        let mut ops = PendingOps::new();
        let id = ops.begin("a", 1, 2);
        assert_eq!(
            ops.resolve("a", id, false),
            Resolution::Failed { rollback_to: Some(1) }
        );
        assert_eq!(ops.status("a"), Some(OpStatus::Failed));
    }

    #[test]
    fn failure_of_superseded_op_leaves_board_alone() {
        let mut ops = PendingOps::new();
        let first = ops.begin("a", 1, 2);
        let second = ops.begin("a", 2, 3);

        assert_eq!(
            ops.resolve("a", first, false),
            Resolution::Failed { rollback_to: None }
        );
        assert_eq!(ops.resolve("a", second, true), Resolution::Committed);
        assert_eq!(ops.status("a"), Some(OpStatus::Committed));
    }

    #[test]
    fn rollback_skips_ops_that_already_failed() {
        let mut ops = PendingOps::new();
        let first = ops.begin("a", 1, 2);
        let second = ops.begin("a", 2, 3);

        ops.resolve("a", first, false);
        assert_eq!(
            ops.resolve("a", second, false),
            Resolution::Failed { rollback_to: Some(1) }
        );
    }

    #[test]
    fn earlier_failure_after_later_failure_walks_back_further() {
        let mut ops = PendingOps::new();
        let first = ops.begin("a", 1, 2);
        let second = ops.begin("a", 2, 3);

        assert_eq!(
            ops.resolve("a", second, false),
            Resolution::Failed { rollback_to: Some(2) }
        );
        assert_eq!(
            ops.resolve("a", first, false),
            Resolution::Failed { rollback_to: Some(1) }
        );
    }

    #[test]
    fn unknown_or_repeated_resolution_is_ignored() {
        let mut ops = PendingOps::new();
        assert_eq!(ops.resolve("a", 42, true), Resolution::Unknown);

        let id = ops.begin("a", 1, 2);
        ops.resolve("a", id, true);
        assert_eq!(ops.resolve("a", id, false), Resolution::Unknown);

        ops.clear();
        assert_eq!(ops.status("a"), None);
    }

    #[test]
    fn settled_cards_are_dropped_at_refresh() {
        let mut ops = PendingOps::new();
        let done = ops.begin("a", 1, 2);
        ops.resolve("a", done, true);
        let failed = ops.begin("b", 1, 2);
        ops.resolve("b", failed, false);
        ops.begin("c", 1, 3);

        let mut kept = ops.retain_unsettled(ops.mark());
        kept.sort();

        assert_eq!(kept, vec!["c".to_string()]);
        assert_eq!(ops.status("a"), None);
        assert_eq!(ops.status("c"), Some(OpStatus::Pending));
    }

    #[test]
    fn commit_after_mark_survives_refresh() {
        let mut ops = PendingOps::new();
        let id = ops.begin("a", 1, 2);
        let mark = ops.mark();
        ops.resolve("a", id, true);

        assert_eq!(ops.retain_unsettled(mark), vec!["a".to_string()]);
        assert_eq!(ops.status("a"), Some(OpStatus::Committed));

        assert!(ops.retain_unsettled(ops.mark()).is_empty());
    }
}
