use serde::{Deserialize, Serialize};

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a registered user, wrapping the store's integer
/// primary key.
///
/// The user record itself (email, credential hash) is owned by the auth
/// layer; the gateway only ever sees the id.
///
/// ```
/// use awayline_types::user::UserId;
///
/// let id: UserId = "42".parse().unwrap();
/// assert_eq!(id.to_string(), "42");
/// assert_eq!(id.as_i64(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Wrap an existing database key.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database key.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
