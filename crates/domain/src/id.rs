//! Typed identifiers.
//!
//! Runtime-generated identifiers ([`SessionId`], [`EventId`]) are UUID
//! newtypes. User-facing keys ([`RoutineId`], [`LightId`]) are string
//! newtypes because they come from configuration and device bridges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

macro_rules! define_key {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a key, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::EmptyId`] when `value` is blank.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                Ok(Self(value))
            }

            /// Borrow the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_key!(
    /// Key of a [`RoutineDefinition`](crate::routine::RoutineDefinition), e.g. `sunrise`.
    RoutineId
);

define_key!(
    /// Address of a single light endpoint on the device bridge, e.g. `"1"`.
    LightId
);

define_id!(
    /// Unique identifier of one run of a routine.
    ///
    /// Restarting a routine yields a fresh session id, which lets a tick that
    /// raced with the restart recognise that its session is gone.
    SessionId
);

define_id!(
    /// Unique identifier for an [`Event`](crate::event::Event).
    EventId
);

impl RoutineId {
    /// Derive a routine key from a human name: lowercase ASCII alphanumerics,
    /// with every other run of characters collapsed into a single `_`
    /// (a leading run is dropped).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] if the name contains no usable
    /// characters.
    pub fn slugify(name: &str) -> Result<Self, ValidationError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('_');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_separator = true;
            }
        }
        if pending_separator && !slug.is_empty() {
            slug.push('_');
        }
        Self::new(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = EventId::new();
        let text = id.to_string();
        let parsed: EventId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_return_error_when_parsing_invalid_uuid() {
        let result = SessionId::from_str("not-a-uuid");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_blank_keys() {
        assert_eq!(RoutineId::new("  "), Err(ValidationError::EmptyId));
        assert_eq!(LightId::from_str(""), Err(ValidationError::EmptyId));
    }

    #[test]
    fn should_serialize_keys_as_plain_strings() {
        let id = LightId::new("3").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3\"");
        let parsed: LightId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_slugify_routine_names() {
        assert_eq!(
            RoutineId::slugify("Good Morning, Sunshine!").unwrap().as_str(),
            "good_morning_sunshine_"
        );
        assert_eq!(RoutineId::slugify("Sunrise").unwrap().as_str(), "sunrise");
        assert_eq!(
            RoutineId::slugify("  wind-down 2 ").unwrap().as_str(),
            "wind_down_2_"
        );
    }

    #[test]
    fn should_fail_to_slugify_name_without_alphanumerics() {
        assert!(RoutineId::slugify("!!!").is_err());
    }
}
