//! Domain identifiers.
//!
//! `TaskId` wraps a ULID: time-sortable, generated without coordination, and
//! 128-bit like a UUID. Ids are produced by an [`IdGenerator`] at submission
//! time and never reused.
//!
//! [`IdGenerator`]: crate::ports::IdGenerator

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::ForemanError;

const PREFIX: &str = "task-";

/// Identifier of one submitted unit of work.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.0)
    }
}

/// Accepts both the displayed form (`task-01H...`) and a bare ULID.
impl FromStr for TaskId {
    type Err = ForemanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(PREFIX).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|_| ForemanError::InvalidTaskId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_task_prefix() {
        let id = TaskId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("task-"));
    }

    #[test]
    fn ids_are_sortable_by_creation_time() {
        let id1 = TaskId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TaskId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn parses_displayed_and_bare_forms() {
        let id = TaskId::from_ulid(Ulid::new());

        assert_eq!(id.to_string().parse::<TaskId>().unwrap(), id);
        assert_eq!(id.as_ulid().to_string().parse::<TaskId>().unwrap(), id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "task-not-a-ulid".parse::<TaskId>().unwrap_err();
        assert!(matches!(err, ForemanError::InvalidTaskId(s) if s == "task-not-a-ulid"));
    }

    #[test]
    fn serializes_as_bare_ulid() {
        let ulid = Ulid::new();
        let id = TaskId::from_ulid(ulid);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{ulid}\""));
        assert_eq!(serde_json::from_str::<TaskId>(&json).unwrap(), id);
    }

    #[test]
    fn same_size_as_ulid() {
        assert_eq!(std::mem::size_of::<TaskId>(), std::mem::size_of::<Ulid>());
    }
}
