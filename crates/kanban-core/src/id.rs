use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier of a board (UUID v7).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct BoardId(pub Uuid);

impl BoardId {
    #[must_use]
    /// Generate a fresh board identifier.
    pub fn new() -> Self {
        // UUID version 7 sorts by creation time, which keeps store listings stable.
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BoardId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

impl Serialize for BoardId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BoardId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a task (UUID v7).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TaskId(pub Uuid);

impl TaskId {
    #[must_use]
    /// Generate a fresh task identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of anything that can be lifted or hovered by a drag gesture.
///
/// The textual form is `board:<uuid>` or `task:<uuid>`.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ItemId {
    /// A board (column).
    Board(BoardId),
    /// A task card.
    Task(TaskId),
}

impl ItemId {
    /// Board identity, when this item is a board.
    #[must_use]
    pub const fn as_board(self) -> Option<BoardId> {
        match self {
            Self::Board(id) => Some(id),
            Self::Task(_) => None,
        }
    }

    /// Task identity, when this item is a task.
    #[must_use]
    pub const fn as_task(self) -> Option<TaskId> {
        match self {
            Self::Task(id) => Some(id),
            Self::Board(_) => None,
        }
    }

    /// Whether this item is a board.
    #[must_use]
    pub const fn is_board(self) -> bool {
        matches!(self, Self::Board(_))
    }
}

impl From<BoardId> for ItemId {
    fn from(id: BoardId) -> Self {
        Self::Board(id)
    }
}

impl From<TaskId> for ItemId {
    fn from(id: TaskId) -> Self {
        Self::Task(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(id) => write!(f, "board:{id}"),
            Self::Task(id) => write!(f, "task:{id}"),
        }
    }
}

impl FromStr for ItemId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::MalformedId(s.to_owned()))?;
        match kind {
            "board" => raw.parse().map(Self::Board),
            "task" => raw.parse().map(Self::Task),
            _ => Err(ValidationError::MalformedId(s.to_owned())),
        }
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(s.trim()).map_err(|_| ValidationError::MalformedId(s.to_owned()))
}
