use std::fmt;

use crate::board::Point;

/// What to do with a targeted cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Verb {
    Reveal,
    Flag,
}

/// The single move the agent hands back each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    Reveal(Point),
    Flag(Point),
    EndTurn,
}

impl Action {
    pub fn target(&self) -> Option<Point> {
        match *self {
            Action::Reveal(at) | Action::Flag(at) => Some(at),
            Action::EndTurn => None,
        }
    }

    /// Numeric form used across the wasm boundary: `[kind, col, row]` with
    /// kind 0 = end turn, 1 = reveal, 2 = flag.
    pub fn encode(&self) -> [i32; 3] {
        match *self {
            Action::EndTurn => [0, 0, 0],
            Action::Reveal(at) => [1, at.col as i32, at.row as i32],
            Action::Flag(at) => [2, at.col as i32, at.row as i32],
        }
    }

    pub fn decode(kind: i32, col: usize, row: usize) -> Option<Action> {
        let at = Point::new(col, row);
        match kind {
            0 => Some(Action::EndTurn),
            1 => Some(Action::Reveal(at)),
            2 => Some(Action::Flag(at)),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reveal(at) => write!(f, "reveal {}", at),
            Action::Flag(at) => write!(f, "flag {}", at),
            Action::EndTurn => write!(f, "end turn"),
        }
    }
}

/// A scheduled action.
///
/// Records order by priority first (lower is more urgent), then by target
/// coordinate, which gives a deterministic tie-break inside one priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ActionRecord {
    pub priority: u8,
    pub at: Point,
    pub verb: Verb,
}

impl ActionRecord {
    pub fn reveal(at: Point, priority: u8) -> Self {
        ActionRecord {
            priority,
            at,
            verb: Verb::Reveal,
        }
    }

    pub fn flag(at: Point, priority: u8) -> Self {
        ActionRecord {
            priority,
            at,
            verb: Verb::Flag,
        }
    }
}

impl From<ActionRecord> for Action {
    fn from(record: ActionRecord) -> Self {
        match record.verb {
            Verb::Reveal => Action::Reveal(record.at),
            Verb::Flag => Action::Flag(record.at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_order_by_priority_then_coordinate() {
        let mut records = vec![
            ActionRecord::flag(Point::new(0, 0), 2),
            ActionRecord::reveal(Point::new(1, 0), 0),
            ActionRecord::reveal(Point::new(0, 1), 0),
            ActionRecord::reveal(Point::new(0, 0), 1),
        ];
        records.sort();

        let order: Vec<(u8, Point)> = records.iter().map(|r| (r.priority, r.at)).collect();
        assert_eq!(
            order,
            vec![
                (0, Point::new(0, 1)),
                (0, Point::new(1, 0)),
                (1, Point::new(0, 0)),
                (2, Point::new(0, 0)),
            ]
        );
    }

    #[test]
    fn test_wire_codes() {
        let flag = Action::Flag(Point::new(3, 7));
        assert_eq!(flag.encode(), [2, 3, 7]);
        assert_eq!(Action::decode(2, 3, 7), Some(flag));
        assert_eq!(Action::decode(0, 9, 9), Some(Action::EndTurn));
        assert_eq!(Action::decode(5, 0, 0), None);
        assert_eq!(Action::EndTurn.target(), None);
    }
}
