// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Hardware mapping types.
//!
//! # Examples
//!
//! ```
//! # use pvemap_hardware::mapping::kind::MappingType;
//! #
//! assert_eq!(MappingType::parse("pci").unwrap(), MappingType::Pci);
//! assert_eq!(MappingType::Dir.to_string(), "dir");
//! assert!(MappingType::parse("PCI").is_err());
//! ```

use std::str::FromStr;

/// The category of a hardware mapping.
///
/// Each category has its own API endpoint (`/cluster/mapping/<type>`) and its own rules
/// about which [`crate::mapping::MapEntry`] attributes apply.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    rkyv::Archive,
    rkyv::Deserialize,
    rkyv::Serialize,
    strum::Display,
    strum::EnumIs,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "&'static str")
)]
#[strum(serialize_all = "lowercase")]
#[rkyv(attr(derive(PartialEq, Eq, Debug)))]
pub enum MappingType {
    /// PCI(e) devices, addressed by bus path.
    Pci,
    /// USB devices, addressed by ID or by port.
    Usb,
    /// Host directories (e.g. for virtiofs).
    Dir,
}

/// Error returned for a string which names no [`MappingType`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("illegal hardware mapping type {0:?}")]
pub struct IllegalMappingType(pub String);

impl MappingType {
    /// Parse a mapping type from its exact (lowercase) wire name.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMappingType`] for anything but `pci`, `usb` or `dir`.
    /// Matching is case sensitive and nothing is trimmed.
    pub fn parse(input: impl AsRef<str>) -> Result<MappingType, IllegalMappingType> {
        let input = input.as_ref();
        // strum's `EnumString` is case sensitive unless told otherwise
        <MappingType as FromStr>::from_str(input).map_err(|_| IllegalMappingType(input.to_string()))
    }

    /// The wire name of this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl TryFrom<String> for MappingType {
    type Error = IllegalMappingType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MappingType::parse(value)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::mapping::kind::MappingType;

    impl bolero::TypeGenerator for MappingType {
        fn generate<D: bolero::Driver>(driver: &mut D) -> Option<Self> {
            Some(match driver.produce::<u8>()? % 3 {
                0 => MappingType::Pci,
                1 => MappingType::Usb,
                _ => MappingType::Dir,
            })
        }
    }
}
