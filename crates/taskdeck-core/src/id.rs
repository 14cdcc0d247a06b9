use rand::Rng as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use time::OffsetDateTime;

/// Error returned when parsing an identifier from a string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    /// Identifiers must be non-empty.
    #[error("identifier must not be empty")]
    Empty,
}

// Identifiers keep the historical shape `<prefix><timestamp_ms + salt>`.
// Same-millisecond creations can produce equal numeric parts under the raw
// scheme, so the numeric part is additionally clamped monotonically above
// the last issued value. Uniqueness holds within a process run only.
static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

fn next_unique_stamp() -> i64 {
    let now_ms = i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
        .unwrap_or(i64::MAX);
    let salt: i64 = rand::rng().random_range(0..1000);
    claim(now_ms.saturating_add(salt))
}

fn claim(candidate: i64) -> i64 {
    let mut prev = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(prev + 1);
        match LAST_ISSUED.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => prev = observed,
        }
    }
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "{}"), next_unique_stamp()))
            }

            /// View the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(ParseIdError::Empty);
                }
                Ok(Self(s.to_owned()))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of a task. Opaque to callers; assigned by the repository
    /// at creation and never reassigned.
    TaskId,
    "tid"
);

opaque_id!(
    /// Identifier of a subtask.
    SubTaskId,
    "stid"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_carries_prefix_and_numeric_stamp() {
        let id = TaskId::generate();
        let stamp = id.as_str().strip_prefix("tid").unwrap_or_default();
        assert!(!stamp.is_empty());
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[test]
    fn subtask_id_carries_prefix() {
        let id = SubTaskId::generate();
        assert!(id.as_str().starts_with("stid"));
    }

    #[test]
    fn rapid_generation_stays_unique() {
        let ids: Vec<TaskId> = (0..100).map(|_| TaskId::generate()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!("".parse::<TaskId>(), Err(ParseIdError::Empty));
    }

    #[test]
    fn parse_roundtrip() {
        let id = TaskId::generate();
        let parsed: TaskId = id.as_str().parse().unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(parsed, id);
    }
}
