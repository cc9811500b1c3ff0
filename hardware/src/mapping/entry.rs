// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per device entries of a hardware mapping.
//!
//! Proxmox VE describes each device of a mapping with a "property string": a comma
//! separated list of `key=value` attributes such as
//!
//! ```text
//! id=8086:5916,node=pve1,path=0000:00:02.0,iommugroup=12,subsystem-id=1028:0704
//! ```
//!
//! There is no escaping: a value can contain neither `,` nor `=`.
//! This is the format the API itself speaks, so it is preserved as is.
//!
//! # Examples
//!
//! ```
//! # use pvemap_hardware::mapping::entry::MapEntry;
//! #
//! let entry = MapEntry::parse("node=pve1,path=/mnt/data").unwrap();
//! assert_eq!(entry.node, "pve1");
//! assert_eq!(entry.path.as_deref(), Some("/mnt/data"));
//! assert!(entry.id.is_none());
//!
//! // attributes are always written back in the same order
//! let entry = MapEntry::parse("path=0000:00:02.0,node=pve1,id=8086:5916").unwrap();
//! assert_eq!(entry.to_string(), "id=8086:5916,node=pve1,path=0000:00:02.0");
//! ```

use std::str::FromStr;

use tracing::debug;

use crate::mapping::device_id::{DeviceId, InvalidDeviceId};

/// One device (or directory) of a hardware mapping on one node.
///
/// The parser is permissive: any subset of the known attributes is accepted, in any
/// order.
/// Which attributes a mapping type requires is checked by
/// [`crate::definition::Mapping::validate`].
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    rkyv::Archive,
    rkyv::Deserialize,
    rkyv::Serialize,
)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct MapEntry {
    /// Vendor and device ID of the device (absent for directory mappings).
    pub id: Option<DeviceId>,
    /// The cluster node which owns the device.
    pub node: String,
    /// Bus path (PCI), port (USB), or host directory (dir).
    pub path: Option<String>,
    /// Free text comment.
    pub description: Option<String>,
    /// IOMMU group of a PCI device.
    ///
    /// `Some(0)` is a real group, distinct from `None`.
    pub iommu_group: Option<i64>,
    /// Subsystem vendor and device ID of a PCI device.
    pub subsystem_id: Option<DeviceId>,
}

/// Errors which can occur when parsing a [`MapEntry`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidMapEntry {
    /// A comma separated token is not exactly one `key=value` pair.
    #[error("invalid \"key=value\" format for hardware mapping attribute {0:?}")]
    Format(String),
    /// The key is not one of the known attributes.
    #[error("unknown hardware mapping attribute {0:?}")]
    UnknownAttribute(String),
    /// The value of `id` or `subsystem-id` is not a device ID.
    #[error("invalid format {value:?} for hardware mapping {attribute:?} attribute")]
    DeviceId {
        /// The attribute which held the value.
        attribute: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        #[source]
        source: InvalidDeviceId,
    },
    /// The value of `iommugroup` is not a base 10 integer.
    #[error("invalid format {value:?} for hardware mapping \"iommugroup\" attribute")]
    IommuGroup {
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        #[source]
        source: std::num::ParseIntError,
    },
}

impl MapEntry {
    /// Attribute name of the device ID.
    pub const ATTR_ID: &'static str = "id";
    /// Attribute name of the node.
    pub const ATTR_NODE: &'static str = "node";
    /// Attribute name of the path.
    pub const ATTR_PATH: &'static str = "path";
    /// Attribute name of the comment.
    pub const ATTR_DESCRIPTION: &'static str = "description";
    /// Attribute name of the IOMMU group.
    pub const ATTR_IOMMU_GROUP: &'static str = "iommugroup";
    /// Attribute name of the subsystem ID.
    pub const ATTR_SUBSYSTEM_ID: &'static str = "subsystem-id";

    const ATTR_SEPARATOR: char = ',';
    const VALUE_SEPARATOR: char = '=';
    const ATTR_COUNT_MAX: usize = 6;

    /// Creates an entry holding only a node name.
    #[must_use]
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..Self::default()
        }
    }

    /// Parse a property string.
    ///
    /// If a key appears more than once, the last value wins.
    ///
    /// # Errors
    ///
    /// - [`InvalidMapEntry::Format`] if a token does not split on `=` into exactly two parts
    ///   (so a value containing `=` is rejected as well).
    /// - [`InvalidMapEntry::UnknownAttribute`] for keys other than `id`, `node`, `path`,
    ///   `description`, `iommugroup` and `subsystem-id`.
    /// - [`InvalidMapEntry::DeviceId`] / [`InvalidMapEntry::IommuGroup`] if a value does not
    ///   parse as the type its key calls for.
    pub fn parse(input: impl AsRef<str>) -> Result<MapEntry, InvalidMapEntry> {
        let mut entry = MapEntry::default();
        let mut seen: Vec<&str> = Vec::with_capacity(Self::ATTR_COUNT_MAX);
        for attr in input.as_ref().split(Self::ATTR_SEPARATOR) {
            let mut parts = attr.split(Self::VALUE_SEPARATOR);
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(InvalidMapEntry::Format(attr.to_string()));
            };
            if seen.contains(&key) {
                debug!("hardware mapping attribute {key:?} given more than once, keeping {value:?}");
            } else {
                seen.push(key);
            }
            match key {
                Self::ATTR_ID => entry.id = Some(Self::device_id(Self::ATTR_ID, value)?),
                Self::ATTR_NODE => entry.node = value.to_string(),
                Self::ATTR_PATH => entry.path = Some(value.to_string()),
                Self::ATTR_DESCRIPTION => entry.description = Some(value.to_string()),
                Self::ATTR_IOMMU_GROUP => {
                    let group = value
                        .parse::<i64>()
                        .map_err(|source| InvalidMapEntry::IommuGroup {
                            value: value.to_string(),
                            source,
                        })?;
                    entry.iommu_group = Some(group);
                }
                Self::ATTR_SUBSYSTEM_ID => {
                    entry.subsystem_id = Some(Self::device_id(Self::ATTR_SUBSYSTEM_ID, value)?);
                }
                _ => return Err(InvalidMapEntry::UnknownAttribute(key.to_string())),
            }
        }
        Ok(entry)
    }

    fn device_id(attribute: &'static str, value: &str) -> Result<DeviceId, InvalidMapEntry> {
        DeviceId::parse(value).map_err(|source| InvalidMapEntry::DeviceId {
            attribute,
            value: value.to_string(),
            source,
        })
    }

    /// The `(key, value)` pairs of this entry, in wire order, skipping unset attributes.
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::with_capacity(Self::ATTR_COUNT_MAX);
        if let Some(id) = &self.id {
            attrs.push((Self::ATTR_ID, id.to_string()));
        }
        attrs.push((Self::ATTR_NODE, self.node.clone()));
        if let Some(path) = &self.path {
            attrs.push((Self::ATTR_PATH, path.clone()));
        }
        if let Some(description) = &self.description {
            attrs.push((Self::ATTR_DESCRIPTION, description.clone()));
        }
        if let Some(group) = self.iommu_group {
            attrs.push((Self::ATTR_IOMMU_GROUP, group.to_string()));
        }
        if let Some(subsystem_id) = &self.subsystem_id {
            attrs.push((Self::ATTR_SUBSYSTEM_ID, subsystem_id.to_string()));
        }
        attrs
    }
}

impl std::fmt::Display for MapEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, (key, value)) in self.attributes().iter().enumerate() {
            if idx > 0 {
                write!(f, "{}", Self::ATTR_SEPARATOR)?;
            }
            write!(f, "{key}{}{value}", Self::VALUE_SEPARATOR)?;
        }
        Ok(())
    }
}

impl From<MapEntry> for String {
    fn from(value: MapEntry) -> String {
        value.to_string()
    }
}

impl FromStr for MapEntry {
    type Err = InvalidMapEntry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MapEntry::parse(s)
    }
}

impl TryFrom<&str> for MapEntry {
    type Error = InvalidMapEntry;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MapEntry::parse(value)
    }
}

impl TryFrom<String> for MapEntry {
    type Error = InvalidMapEntry;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MapEntry::parse(value)
    }
}

/// Test contract support for property-based testing.
///
/// Generated text values never contain `,` or `=`, which the wire format cannot carry.
#[cfg(any(test, feature = "bolero"))]
mod contract {
    use bolero::{Driver, TypeGenerator};

    use crate::mapping::entry::MapEntry;

    fn word<D: Driver>(driver: &mut D, prefix: &str) -> Option<String> {
        let n = driver.produce::<u16>()?;
        Some(format!("{prefix}{n}"))
    }

    fn maybe<D: Driver, T>(
        driver: &mut D,
        f: impl FnOnce(&mut D) -> Option<T>,
    ) -> Option<Option<T>> {
        if driver.produce::<bool>()? {
            Some(Some(f(driver)?))
        } else {
            Some(None)
        }
    }

    impl TypeGenerator for MapEntry {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(MapEntry {
                id: driver.produce()?,
                node: word(driver, "pve")?,
                path: maybe(driver, |d| word(d, "/mnt/data"))?,
                description: maybe(driver, |d| word(d, "device "))?,
                iommu_group: driver.produce()?,
                subsystem_id: driver.produce()?,
            })
        }
    }
}
