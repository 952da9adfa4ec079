//! Identifier Types
//!
//! String-backed identifiers for boards, lists, cards, users and server-side
//! connections. Permanent ids are assigned by the mutation service; temporary
//! ids are minted on the client for optimistic entities and always carry the
//! `temp-` prefix so they can never be mistaken for a permanent id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix carried by every client-minted temporary id
pub const TEMP_ID_PREFIX: &str = "temp-";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh permanent id
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Board identifier
    BoardId
);

string_id!(
    /// List identifier; may be temporary on the client
    ListId
);

string_id!(
    /// Card identifier; may be temporary on the client
    CardId
);

string_id!(
    /// Authenticated user identifier
    UserId
);

impl ListId {
    /// Mint a temporary id for an optimistic list
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4()))
    }

    /// Whether this id was minted locally and is not yet confirmed
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl CardId {
    /// Mint a temporary id for an optimistic card
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4()))
    }

    /// Whether this id was minted locally and is not yet confirmed
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

/// Server-side identity of one persistent client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a new connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Mint a correlation token for an outgoing intent
pub fn correlation_token() -> String {
    format!("ref-{}", Uuid::new_v4())
}
