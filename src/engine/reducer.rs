use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, Column, ColumnId};

/// The two ordered sequences the board renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub columns: Vec<Column>,
    pub cards: Vec<Card>,
}

/// Every mutation the engine can make to [`BoardState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardAction {
    ColumnMoved { from: usize, to: usize },
    CardMoved { from: usize, to: usize },
    CardReassigned { card_id: CardId, column_id: ColumnId },
}

/// Removes the element at `from` and reinserts it at `to`.
///
/// Out-of-range indices are clamped to the last slot; an empty slice is left
/// untouched.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if items.is_empty() || from >= items.len() {
        return;
    }
    let to = to.min(items.len() - 1);
    if from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Applies one action. Returns `false` when the action referred to something
/// that is not on the board and nothing changed.
pub fn reduce(state: &mut BoardState, action: &BoardAction) -> bool {
    match action {
        BoardAction::ColumnMoved { from, to } => {
            if *from >= state.columns.len() {
                return false;
            }
            array_move(&mut state.columns, *from, *to);
            true
        }
        BoardAction::CardMoved { from, to } => {
            if *from >= state.cards.len() {
                return false;
            }
            array_move(&mut state.cards, *from, *to);
            true
        }
        BoardAction::CardReassigned { card_id, column_id } => {
            match state.cards.iter_mut().find(|c| &c.id == card_id) {
                Some(card) => {
                    card.column_id = *column_id;
                    true
                }
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(state: &BoardState) -> Vec<&str> {
        state.cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn array_move_forward_and_back() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec!['b', 'c', 'a', 'd']);
        array_move(&mut v, 3, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn array_move_clamps_target() {
        let mut v = vec![1, 2, 3];
        array_move(&mut v, 0, 10);
        assert_eq!(v, vec![2, 3, 1]);

        let mut empty: Vec<i32> = Vec::new();
        array_move(&mut empty, 0, 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn card_moved_reorders_sequence() {
        let mut state = BoardState {
            columns: vec![Column::new(1, "new", 1)],
            cards: vec![Card::new("a", 1, "A"), Card::new("b", 1, "B"), Card::new("c", 1, "C")],
        };

        assert!(reduce(&mut state, &BoardAction::CardMoved { from: 0, to: 2 }));
        assert_eq!(ids(&state), vec!["b", "c", "a"]);
    }

    #[test]
    fn reassign_unknown_card_is_rejected() {
        let mut state = BoardState {
            columns: vec![Column::new(1, "new", 1)],
            cards: vec![Card::new("a", 1, "A")],
        };
        let before = state.clone();

        let changed = reduce(
            &mut state,
            &BoardAction::CardReassigned {
                card_id: "missing".into(),
                column_id: 2,
            },
        );
        assert!(!changed);
        assert_eq!(state, before);
    }

    #[test]
    fn column_moved_out_of_range_is_rejected() {
        let mut state = BoardState {
            columns: vec![Column::new(1, "new", 1), Column::new(2, "won", 2)],
            cards: vec![],
        };
        assert!(!reduce(&mut state, &BoardAction::ColumnMoved { from: 5, to: 0 }));
        assert!(reduce(&mut state, &BoardAction::ColumnMoved { from: 0, to: 1 }));
        assert_eq!(state.columns[0].id, 2);
    }
}
