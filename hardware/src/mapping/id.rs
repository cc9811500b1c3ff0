// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Hardware mapping IDs (`type:name`).
//!
//! # Examples
//!
//! ```
//! # use pvemap_hardware::mapping::{id::MappingId, kind::MappingType};
//! #
//! let id = MappingId::parse("usb:front:left").unwrap();
//! assert_eq!(id.kind, MappingType::Usb);
//! assert_eq!(id.name, "front:left");
//! assert_eq!(id.to_string(), "usb:front:left");
//! ```

use std::str::FromStr;

use crate::mapping::kind::{IllegalMappingType, MappingType};

/// A cluster wide hardware mapping identifier.
///
/// Only the first colon separates the type from the name, so names may themselves
/// contain colons.
/// The name is not checked here: an empty name parses fine and is rejected by
/// [`crate::definition::Mapping::validate`] instead.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    rkyv::Archive,
    rkyv::Deserialize,
    rkyv::Serialize,
)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct MappingId {
    /// The category of the mapping.
    pub kind: MappingType,
    /// The name of the mapping within its category.
    pub name: String,
}

/// Errors which can occur when parsing a [`MappingId`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidMappingId {
    /// There is no `:` separating the type from the name.
    #[error("{0:?} is not a valid hardware mapping ID")]
    Syntax(String),
    /// The part before the first `:` is not a mapping type.
    #[error("could not extract type from hardware mapping ID {input:?}")]
    Type {
        /// The whole rejected ID.
        input: String,
        /// Why the type prefix was rejected.
        #[source]
        source: IllegalMappingType,
    },
}

impl MappingId {
    /// Creates a new mapping ID.
    #[must_use]
    pub fn new(kind: MappingType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Parse a `type:name` mapping ID.
    ///
    /// # Errors
    ///
    /// - [`InvalidMappingId::Syntax`] if the input has no colon.
    /// - [`InvalidMappingId::Type`] if the text before the first colon is not a
    ///   [`MappingType`].
    pub fn parse(input: impl AsRef<str>) -> Result<MappingId, InvalidMappingId> {
        let input = input.as_ref();
        let Some((kind, name)) = input.split_once(':') else {
            return Err(InvalidMappingId::Syntax(input.to_string()));
        };
        let kind = MappingType::parse(kind).map_err(|source| InvalidMappingId::Type {
            input: input.to_string(),
            source,
        })?;
        Ok(MappingId::new(kind, name))
    }
}

impl std::fmt::Display for MappingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl From<MappingId> for String {
    fn from(value: MappingId) -> String {
        value.to_string()
    }
}

impl FromStr for MappingId {
    type Err = InvalidMappingId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MappingId::parse(s)
    }
}

impl TryFrom<&str> for MappingId {
    type Error = InvalidMappingId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MappingId::parse(value)
    }
}

impl TryFrom<String> for MappingId {
    type Error = InvalidMappingId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MappingId::parse(value)
    }
}

#[cfg(test)]
mod test {
    use crate::mapping::id::{InvalidMappingId, MappingId};
    use crate::mapping::kind::{IllegalMappingType, MappingType};

    #[test]
    fn parse_and_display() {
        let id = MappingId::parse("pci:gpu0").unwrap();
        assert_eq!(id, MappingId::new(MappingType::Pci, "gpu0"));
        assert_eq!(id.to_string(), "pci:gpu0");
    }

    #[test]
    fn only_first_colon_splits() {
        let id = MappingId::parse("usb:front:left").unwrap();
        assert_eq!(id.kind, MappingType::Usb);
        assert_eq!(id.name, "front:left");
        assert_eq!(id.to_string(), "usb:front:left");
    }

    #[test]
    fn empty_name_is_accepted() {
        let id = MappingId::parse("dir:").unwrap();
        assert_eq!(id.kind, MappingType::Dir);
        assert!(id.name.is_empty());
        assert_eq!(id.to_string(), "dir:");
    }

    #[test]
    fn missing_colon_is_rejected() {
        assert_eq!(
            MappingId::parse("nocolon"),
            Err(InvalidMappingId::Syntax("nocolon".to_string()))
        );
        assert_eq!(
            MappingId::parse(""),
            Err(InvalidMappingId::Syntax(String::new()))
        );
    }

    #[test]
    fn bad_type_is_wrapped() {
        match MappingId::parse("gpu:pci") {
            Err(InvalidMappingId::Type { input, source }) => {
                assert_eq!(input, "gpu:pci");
                assert_eq!(source, IllegalMappingType("gpu".to_string()));
            }
            e => unreachable!("expected a type error, got {e:?}"),
        }
        assert!(matches!(
            MappingId::parse(":gpu0"),
            Err(InvalidMappingId::Type { .. })
        ));
    }

    #[test]
    fn reparse_is_idempotent() {
        bolero::check!()
            .with_type()
            .for_each(|(kind, name): &(MappingType, String)| {
                let id = MappingId::new(*kind, name.clone());
                let reparsed = MappingId::parse(id.to_string()).unwrap();
                assert_eq!(reparsed, id);
                assert_eq!(reparsed.to_string(), id.to_string());
            });
    }

    #[test]
    fn json_is_a_string() {
        let id = MappingId::new(MappingType::Pci, "gpu0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""pci:gpu0""#);
        assert_eq!(serde_json::from_str::<MappingId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<MappingId>(r#""gpu0""#).is_err());
    }
}
