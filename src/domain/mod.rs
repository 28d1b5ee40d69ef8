//! Domain types for the helpdesk with strong typing.
//!
//! Identifiers are newtypes so that a ticket id can never be passed where a
//! user id is expected. Products and ticket statuses are closed enums with
//! their wire spellings kept in one place.

pub mod access;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user.
    UserId
);

entity_id!(
    /// Identifier of a support ticket.
    ///
    /// ```rust
    /// use helpdesk::domain::TicketId;
    ///
    /// let id = TicketId::new(7);
    /// assert_eq!(id.value(), 7);
    /// assert_eq!(id.to_string(), "7");
    /// ```
    TicketId
);

entity_id!(
    /// Identifier of a note attached to a ticket.
    NoteId
);

/// Error returned when a product or status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Product line a ticket is filed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "WHSIA")]
    Whsia,
    #[serde(rename = "Pik TV")]
    PikTv,
    #[serde(rename = "HSIA")]
    Hsia,
    #[serde(rename = "Smart Hub")]
    SmartHub,
}

impl Product {
    pub const ALL: [Self; 4] = [Self::Whsia, Self::PikTv, Self::Hsia, Self::SmartHub];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Whsia => "WHSIA",
            Self::PikTv => "Pik TV",
            Self::Hsia => "HSIA",
            Self::SmartHub => "Smart Hub",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ParseEnumError {
                kind: "product",
                value: s.to_string(),
            })
    }
}

/// Lifecycle status of a ticket.
///
/// `New` is the initial state, `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    New,
    Open,
    Closed,
}

/// A status change the lifecycle does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move ticket from '{from}' to '{to}'")]
pub struct TransitionError {
    pub from: TicketStatus,
    pub to: TicketStatus,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Notes may be added to any ticket that is not closed.
    #[must_use]
    pub const fn accepts_notes(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Validates a move to `next`. Staying in a non-terminal state is a no-op.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        match (self, next) {
            (Self::New, Self::New | Self::Open | Self::Closed)
            | (Self::Open, Self::Open | Self::Closed) => Ok(next),
            _ => Err(TransitionError {
                from: self,
                to: next,
            }),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                kind: "ticket status",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_conversions() {
        let id = TicketId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(TicketId::from(42), id);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&NoteId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: NoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NoteId::new(9));
    }

    #[test]
    fn product_wire_names() {
        assert_eq!(serde_json::to_string(&Product::PikTv).unwrap(), "\"Pik TV\"");
        assert_eq!("Smart Hub".parse::<Product>().unwrap(), Product::SmartHub);
        assert_eq!("WHSIA".parse::<Product>().unwrap(), Product::Whsia);
        assert!("Fibre".parse::<Product>().is_err());
        assert!("whsia".parse::<Product>().is_err());
    }

    #[test]
    fn status_parsing() {
        assert_eq!("open".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert_eq!("Closed".parse::<TicketStatus>().unwrap(), TicketStatus::Closed);
        assert!("pending".parse::<TicketStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&TicketStatus::New).unwrap(),
            "\"new\""
        );
    }

    #[test]
    fn status_transitions() {
        use TicketStatus::{Closed, New, Open};

        assert_eq!(New.transition(Open), Ok(Open));
        assert_eq!(New.transition(Closed), Ok(Closed));
        assert_eq!(Open.transition(Closed), Ok(Closed));
        assert_eq!(Open.transition(Open), Ok(Open));
        assert!(Open.transition(New).is_err());
        assert!(Closed.transition(Open).is_err());
        assert!(Closed.transition(Closed).is_err());
        assert!(Closed.transition(New).is_err());
    }

    #[test]
    fn only_closed_rejects_notes() {
        assert!(TicketStatus::New.accepts_notes());
        assert!(TicketStatus::Open.accepts_notes());
        assert!(!TicketStatus::Closed.accepts_notes());
        assert!(TicketStatus::Closed.is_terminal());
    }
}
