//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid segment mode value.
    #[error("invalid segment mode: {value}")]
    InvalidMode { value: String },

    /// Invalid transition reason value.
    #[error("invalid transition reason: {value}")]
    InvalidReason { value: String },

    /// Invalid session status value.
    #[error("invalid session status: {value}")]
    InvalidStatus { value: String },

    /// Invalid todo priority value.
    #[error("invalid priority: {value}")]
    InvalidPriority { value: String },
}

/// The activity category of a segment.
///
/// A session's first segment is always [`Mode::Focus`]; later segments
/// take whatever mode the transition requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Actively working on the task.
    Focus,
    /// Temporarily paused.
    Pause,
    /// On a deliberate break.
    Break,
}

impl Mode {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Pause => "pause",
            Self::Break => "break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(Self::Focus),
            "pause" => Ok(Self::Pause),
            "break" => Ok(Self::Break),
            _ => Err(ValidationError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Why a non-initial segment began.
///
/// The first segment of a session carries no reason; every transition
/// records one, defaulting to [`Reason::Manual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    /// The client detected user inactivity.
    Idle,
    /// The tracking surface was hidden or backgrounded.
    Hidden,
    /// The user requested the transition.
    Manual,
    /// An alert or reminder triggered the transition.
    Alert,
}

impl Reason {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hidden => "hidden",
            Self::Manual => "manual",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Reason {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "hidden" => Ok(Self::Hidden),
            "manual" => Ok(Self::Manual),
            "alert" => Ok(Self::Alert),
            _ => Err(ValidationError::InvalidReason {
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The session is running and has exactly one open segment.
    Active,
    /// The session has been stopped. Terminal.
    Ended,
}

impl SessionStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Priority of a todo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Med,
    /// High priority.
    High,
}

impl Priority {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "med" => Ok(Self::Med),
            "high" => Ok(Self::High),
            _ => Err(ValidationError::InvalidPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated user identifier.
    ///
    /// Users are owned by an external identity provider; the core only
    /// scopes data by this opaque reference.
    UserId, "user ID"
);

define_string_id!(
    /// A validated todo identifier.
    ///
    /// Todos live in the task store; sessions reference them by ID only.
    TodoId, "todo ID"
);

define_string_id!(
    /// A validated session identifier.
    SessionId, "session ID"
);

define_string_id!(
    /// A validated segment identifier.
    SegmentId, "segment ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_empty() {
        assert!(UserId::new("").is_err());
        assert!(TodoId::new("").is_err());
        assert!(SessionId::new("").is_err());
        assert!(SegmentId::new("").is_err());
        assert!(SessionId::new("sess-1").is_ok());
    }

    #[test]
    fn session_id_serde_roundtrip() {
        let id = SessionId::new("session-abc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"session-abc\"");
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn session_id_serde_rejects_empty() {
        let result: Result<SessionId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("focus".parse::<Mode>().unwrap(), Mode::Focus);
        assert_eq!("pause".parse::<Mode>().unwrap(), Mode::Pause);
        assert_eq!("break".parse::<Mode>().unwrap(), Mode::Break);
        assert!("working".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_as_str_roundtrips() {
        for mode in [Mode::Focus, Mode::Pause, Mode::Break] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn reason_from_str() {
        assert_eq!("idle".parse::<Reason>().unwrap(), Reason::Idle);
        assert_eq!("hidden".parse::<Reason>().unwrap(), Reason::Hidden);
        assert_eq!("manual".parse::<Reason>().unwrap(), Reason::Manual);
        assert_eq!("alert".parse::<Reason>().unwrap(), Reason::Alert);
        assert!("bored".parse::<Reason>().is_err());
    }

    #[test]
    fn status_from_str() {
        assert_eq!("active".parse::<SessionStatus>().unwrap(), SessionStatus::Active);
        assert_eq!("ended".parse::<SessionStatus>().unwrap(), SessionStatus::Ended);
        assert!("paused".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn mode_serde_uses_lowercase() {
        let json = serde_json::to_string(&Mode::Break).unwrap();
        assert_eq!(json, "\"break\"");
        let parsed: Mode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Mode::Break);
    }

    #[test]
    fn priority_defaults_to_med() {
        assert_eq!(Priority::default(), Priority::Med);
        assert_eq!("med".parse::<Priority>().unwrap(), Priority::Med);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
