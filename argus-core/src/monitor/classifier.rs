//! Classification of raw notifications into change events

use crate::monitor::{Action, ChangeEvent};
use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

/// Raw operation bitmask carried by a notification
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Op(u8);

impl Op {
    pub const CREATE: Op = Op(1 << 0);
    pub const WRITE: Op = Op(1 << 1);
    pub const REMOVE: Op = Op(1 << 2);
    pub const RENAME: Op = Op(1 << 3);
    pub const CHMOD: Op = Op(1 << 4);

    /// No bits set
    pub const fn empty() -> Self {
        Op(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set in `self`
    pub const fn contains(self, other: Op) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        Op(self.0 | rhs.0)
    }
}

impl BitOrAssign for Op {
    fn bitor_assign(&mut self, rhs: Op) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = CHECK_ORDER
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(bit, _)| match *bit {
                Op::CREATE => "CREATE",
                Op::WRITE => "WRITE",
                Op::REMOVE => "REMOVE",
                Op::RENAME => "RENAME",
                _ => "CHMOD",
            })
            .collect();

        if names.is_empty() {
            write!(f, "Op(empty)")
        } else {
            write!(f, "Op({})", names.join(" | "))
        }
    }
}

/// A raw notification as emitted by the watch backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub op: Op,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        Self { path: path.into(), op }
    }
}

// Each check is independent; a later match overwrites an earlier one.
const CHECK_ORDER: [(Op, Action); 5] = [
    (Op::CREATE, Action::Create),
    (Op::WRITE, Action::Write),
    (Op::REMOVE, Action::Delete),
    (Op::RENAME, Action::Rename),
    (Op::CHMOD, Action::PermissionChange),
];

/// Classify a raw notification
///
/// Returns `None` when the notification carries no recognized bit. When
/// several bits are set, the last one in the order create, write,
/// remove, rename, chmod decides the action and description.
pub fn classify(raw: &RawEvent, timestamp: DateTime<Utc>) -> Option<ChangeEvent> {
    let mut action = None;
    for (bit, candidate) in CHECK_ORDER {
        if raw.op.contains(bit) {
            action = Some(candidate);
        }
    }

    let action = action?;
    Some(ChangeEvent {
        timestamp,
        path: raw.path.clone(),
        action,
        description: action.describe(&raw.path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_now(path: &str, op: Op) -> Option<ChangeEvent> {
        classify(&RawEvent::new(path, op), Utc::now())
    }

    #[test]
    fn test_single_bits() {
        let cases = [
            (Op::CREATE, Action::Create, "File created: /w/a.txt"),
            (Op::WRITE, Action::Write, "File modified: /w/a.txt"),
            (Op::REMOVE, Action::Delete, "File removed: /w/a.txt"),
            (Op::RENAME, Action::Rename, "File renamed: /w/a.txt"),
            (Op::CHMOD, Action::PermissionChange, "File permissions modified: /w/a.txt"),
        ];

        for (op, action, description) in cases {
            let event = classify_now("/w/a.txt", op).unwrap();
            assert_eq!(event.action, action);
            assert_eq!(event.description, description);
            assert_eq!(event.path, PathBuf::from("/w/a.txt"));
        }
    }

    #[test]
    fn test_last_recognized_bit_wins() {
        let event = classify_now("/w/a.txt", Op::WRITE | Op::CHMOD).unwrap();
        assert_eq!(event.action, Action::PermissionChange);
        assert_eq!(event.description, "File permissions modified: /w/a.txt");

        let event = classify_now("/w/a.txt", Op::CREATE | Op::WRITE).unwrap();
        assert_eq!(event.action, Action::Write);

        let event = classify_now("/w/a.txt", Op::REMOVE | Op::RENAME).unwrap();
        assert_eq!(event.action, Action::Rename);
    }

    #[test]
    fn test_unrecognized_op_is_skipped() {
        assert!(classify_now("/w/a.txt", Op::empty()).is_none());
    }

    #[test]
    fn test_timestamp_and_path_preserved() {
        let at = Utc::now();
        let raw = RawEvent::new("/w/b.txt", Op::CREATE | Op::REMOVE | Op::CHMOD);
        let event = classify(&raw, at).unwrap();
        assert_eq!(event.timestamp, at);
        assert_eq!(event.path, raw.path);
    }

    #[test]
    fn test_op_bits() {
        let op = Op::CREATE | Op::WRITE;
        assert!(op.contains(Op::CREATE));
        assert!(op.contains(Op::WRITE));
        assert!(!op.contains(Op::REMOVE));
        assert!(!op.contains(Op::empty()));
        assert_eq!(format!("{:?}", op), "Op(CREATE | WRITE)");
        assert_eq!(format!("{:?}", Op::empty()), "Op(empty)");
    }
}
