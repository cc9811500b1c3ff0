// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Complete hardware mappings as a user declares them.
//!
//! The [`crate::mapping`] codec accepts any combination of attributes.
//! [`Mapping::validate`] enforces which attributes each mapping type requires or
//! allows:
//!
//! | attribute      | `pci`    | `usb`    | `dir`    |
//! |----------------|----------|----------|----------|
//! | `id`           | required | required | -        |
//! | `node`         | required | required | required |
//! | `path`         | required | optional | required |
//! | `description`  | optional | optional | optional |
//! | `iommugroup`   | optional | -        | -        |
//! | `subsystem-id` | optional | -        | -        |
//!
//! Mediated devices can only be enabled on PCI mappings.

use tracing::trace;

#[cfg(any(test, feature = "serde"))]
use crate::api::{
    CreateRequestBody, DESCRIPTION_PARAM, GetResponseData, MEDIATED_DEVICES_PARAM, MappingData,
    NumericBool, UpdateRequestBody,
};
use crate::mapping::entry::MapEntry;
use crate::mapping::id::MappingId;
use crate::mapping::kind::MappingType;
use crate::mapping::path::InvalidPath;

/// A hardware mapping: a cluster wide name for a set of devices (or directories) on
/// specific nodes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mapping {
    /// The category of the mapping.
    pub kind: MappingType,
    /// The name of the mapping.
    pub name: String,
    /// Comment of the whole mapping (the API calls it `description`).
    pub comment: Option<String>,
    /// The mapped devices.
    pub entries: Vec<MapEntry>,
    /// Whether mediated devices are enabled.
    pub mediated_devices: bool,
}

/// Reasons a [`Mapping`] can be rejected by [`Mapping::validate`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidMapping {
    /// The mapping name is empty.
    #[error("the name of a {0} hardware mapping must not be empty")]
    EmptyName(MappingType),
    /// The mapping has no entries.
    #[error("hardware mapping {0} must map at least one device")]
    NoEntries(MappingId),
    /// An entry lacks an attribute its mapping type requires.
    #[error("entry {index} of hardware mapping {id} is missing the {attribute:?} attribute")]
    MissingAttribute {
        /// The mapping holding the entry.
        id: MappingId,
        /// Position of the entry in the mapping.
        index: usize,
        /// The missing attribute.
        attribute: &'static str,
    },
    /// An entry sets an attribute its mapping type does not have.
    #[error("entry {index} of hardware mapping {id} sets the {attribute:?} attribute, which {kind} mappings do not support", kind = .id.kind)]
    UnsupportedAttribute {
        /// The mapping holding the entry.
        id: MappingId,
        /// Position of the entry in the mapping.
        index: usize,
        /// The offending attribute.
        attribute: &'static str,
    },
    /// An entry path does not suit the mapping type.
    #[error("entry {index} of hardware mapping {id} has an invalid path")]
    Path {
        /// The mapping holding the entry.
        id: MappingId,
        /// Position of the entry in the mapping.
        index: usize,
        /// Why the path was rejected.
        #[source]
        source: InvalidPath,
    },
    /// Mediated devices were requested on a mapping which is not PCI.
    #[error("mediated devices are only supported by pci hardware mappings, not by {0}")]
    MediatedDevices(MappingId),
}

impl Mapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new(kind: MappingType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            comment: None,
            entries: Vec::new(),
            mediated_devices: false,
        }
    }

    /// The `type:name` ID of this mapping.
    #[must_use]
    pub fn id(&self) -> MappingId {
        MappingId::new(self.kind, self.name.clone())
    }

    /// Check the mapping against the rules of its type.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found, see [`InvalidMapping`].
    pub fn validate(&self) -> Result<(), InvalidMapping> {
        if self.name.is_empty() {
            return Err(InvalidMapping::EmptyName(self.kind));
        }
        let id = self.id();
        if self.entries.is_empty() {
            return Err(InvalidMapping::NoEntries(id));
        }
        if self.mediated_devices && !self.kind.is_pci() {
            return Err(InvalidMapping::MediatedDevices(id));
        }
        for (index, entry) in self.entries.iter().enumerate() {
            self.validate_entry(&id, index, entry)?;
        }
        trace!("hardware mapping {id} is valid");
        Ok(())
    }

    fn validate_entry(
        &self,
        id: &MappingId,
        index: usize,
        entry: &MapEntry,
    ) -> Result<(), InvalidMapping> {
        let missing = |attribute| InvalidMapping::MissingAttribute {
            id: id.clone(),
            index,
            attribute,
        };
        let unsupported = |attribute| InvalidMapping::UnsupportedAttribute {
            id: id.clone(),
            index,
            attribute,
        };

        if entry.node.is_empty() {
            return Err(missing(MapEntry::ATTR_NODE));
        }
        match self.kind {
            MappingType::Pci | MappingType::Usb => {
                if entry.id.is_none() {
                    return Err(missing(MapEntry::ATTR_ID));
                }
            }
            MappingType::Dir => {
                if entry.id.is_some() {
                    return Err(unsupported(MapEntry::ATTR_ID));
                }
            }
        }
        if !self.kind.is_pci() {
            if entry.iommu_group.is_some() {
                return Err(unsupported(MapEntry::ATTR_IOMMU_GROUP));
            }
            if entry.subsystem_id.is_some() {
                return Err(unsupported(MapEntry::ATTR_SUBSYSTEM_ID));
            }
        }
        match (&entry.path, self.kind) {
            (None, MappingType::Usb) => Ok(()),
            (None, MappingType::Pci | MappingType::Dir) => Err(missing(MapEntry::ATTR_PATH)),
            (Some(path), kind) => {
                kind.check_path(path)
                    .map_err(|source| InvalidMapping::Path {
                        id: id.clone(),
                        index,
                        source,
                    })
            }
        }
    }
}

#[cfg(any(test, feature = "serde"))]
impl Mapping {
    fn to_data(&self) -> MappingData {
        MappingData {
            description: self.comment.clone(),
            map: self.entries.clone(),
            mdev: self
                .kind
                .is_pci()
                .then_some(NumericBool(self.mediated_devices)),
        }
    }

    /// Build the body creating this mapping.
    #[must_use]
    pub fn to_create_request(&self) -> CreateRequestBody {
        CreateRequestBody {
            data: self.to_data(),
            id: self.name.clone(),
        }
    }

    /// Build the body turning `current` into this mapping.
    ///
    /// Attributes which are set in `current` but cleared here are listed in `delete`, since
    /// omitting a parameter leaves it unchanged.
    /// Mediated devices are reset explicitly whenever a PCI mapping does not enable them.
    #[must_use]
    pub fn to_update_request(&self, current: &Mapping) -> UpdateRequestBody {
        let mut delete = Vec::new();
        if self.comment.is_none() && current.comment.is_some() {
            delete.push(DESCRIPTION_PARAM.to_string());
        }
        if self.kind.is_pci() && !self.mediated_devices {
            delete.push(MEDIATED_DEVICES_PARAM.to_string());
        }
        UpdateRequestBody {
            data: self.to_data(),
            delete,
        }
    }

    /// Rebuild a mapping from the API's description of it.
    #[must_use]
    pub fn from_response(name: impl Into<String>, response: GetResponseData) -> Self {
        let GetResponseData { data, kind } = response;
        Self {
            kind,
            name: name.into(),
            comment: data.description,
            entries: data.map,
            mediated_devices: data.mdev.is_some_and(bool::from),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::api::{GetResponseData, MappingData, NumericBool};
    use crate::definition::{InvalidMapping, Mapping};
    use crate::mapping::entry::MapEntry;
    use crate::mapping::id::MappingId;
    use crate::mapping::kind::MappingType;

    fn entry(s: &str) -> MapEntry {
        MapEntry::parse(s).unwrap()
    }

    fn mapping(kind: MappingType, name: &str, entries: &[&str]) -> Mapping {
        Mapping {
            entries: entries.iter().map(|s| entry(s)).collect(),
            ..Mapping::new(kind, name)
        }
    }

    #[test]
    fn valid_mappings() {
        for m in [
            mapping(
                MappingType::Pci,
                "gpu",
                &[
                    "id=8086:5916,node=pve1,path=0000:00:02.0,iommugroup=0,subsystem-id=1028:0704",
                    "id=8086:5916,node=pve2,path=0000:00:02.0,description=second node",
                ],
            ),
            mapping(MappingType::Usb, "dongle", &["id=046d:c52b,node=pve1"]),
            mapping(MappingType::Usb, "port", &["id=046d:c52b,node=pve1,path=1-5.2"]),
            mapping(MappingType::Dir, "share", &["node=pve1,path=/mnt/data"]),
        ] {
            assert_eq!(m.validate(), Ok(()), "{m:?}");
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let m = mapping(MappingType::Dir, "", &["node=pve1,path=/mnt/data"]);
        assert_eq!(m.validate(), Err(InvalidMapping::EmptyName(MappingType::Dir)));
    }

    #[test]
    fn at_least_one_entry() {
        let m = Mapping::new(MappingType::Usb, "dongle");
        assert_eq!(
            m.validate(),
            Err(InvalidMapping::NoEntries(MappingId::new(
                MappingType::Usb,
                "dongle"
            )))
        );
    }

    #[test]
    fn required_attributes() {
        for (kind, raw, attribute) in [
            (MappingType::Pci, "node=pve1,path=0000:00:02.0", "id"),
            (MappingType::Pci, "id=8086:5916,node=pve1", "path"),
            (MappingType::Pci, "id=8086:5916,path=0000:00:02.0", "node"),
            (MappingType::Usb, "node=pve1", "id"),
            (MappingType::Dir, "node=pve1", "path"),
            (MappingType::Dir, "path=/mnt/data", "node"),
        ] {
            let m = mapping(kind, "m", &[raw]);
            assert_eq!(
                m.validate(),
                Err(InvalidMapping::MissingAttribute {
                    id: m.id(),
                    index: 0,
                    attribute
                }),
                "{raw}"
            );
        }
    }

    #[test]
    fn unsupported_attributes() {
        for (kind, raw, attribute) in [
            (MappingType::Usb, "id=046d:c52b,node=pve1,iommugroup=3", "iommugroup"),
            (MappingType::Usb, "id=046d:c52b,node=pve1,subsystem-id=1028:0704", "subsystem-id"),
            (MappingType::Dir, "id=046d:c52b,node=pve1,path=/mnt/data", "id"),
            (MappingType::Dir, "node=pve1,path=/mnt/data,iommugroup=1", "iommugroup"),
        ] {
            let m = mapping(kind, "m", &[raw]);
            assert_eq!(
                m.validate(),
                Err(InvalidMapping::UnsupportedAttribute {
                    id: m.id(),
                    index: 0,
                    attribute
                }),
                "{raw}"
            );
        }
    }

    #[test]
    fn paths_are_checked_per_type() {
        let m = mapping(
            MappingType::Pci,
            "gpu",
            &[
                "id=8086:5916,node=pve1,path=0000:00:02.0",
                "id=8086:5916,node=pve2,path=0000:00:02.0.1",
            ],
        );
        match m.validate() {
            Err(InvalidMapping::Path { id, index, source }) => {
                assert_eq!(id, m.id());
                assert_eq!(index, 1);
                assert_eq!(source.kind, MappingType::Pci);
                assert_eq!(source.path, "0000:00:02.0.1");
            }
            e => unreachable!("expected a path error, got {e:?}"),
        }
        let m = mapping(MappingType::Dir, "share", &["node=pve1,path=mnt/data"]);
        assert!(matches!(m.validate(), Err(InvalidMapping::Path { .. })));
        // an empty USB path means "mapped by ID"
        let m = mapping(MappingType::Usb, "dongle", &["id=046d:c52b,node=pve1,path="]);
        assert_eq!(m.validate(), Ok(()));
    }

    #[test]
    fn mediated_devices_are_pci_only() {
        let mut m = mapping(MappingType::Usb, "dongle", &["id=046d:c52b,node=pve1"]);
        m.mediated_devices = true;
        assert_eq!(
            m.validate(),
            Err(InvalidMapping::MediatedDevices(m.id()))
        );
    }

    #[test]
    fn create_request() {
        let mut m = mapping(
            MappingType::Pci,
            "gpu",
            &["id=8086:5916,node=pve1,path=0000:00:02.0"],
        );
        m.comment = Some("GPU".to_string());
        m.mediated_devices = true;
        let body = m.to_create_request();
        assert_eq!(body.id, "gpu");
        assert_eq!(body.data.description.as_deref(), Some("GPU"));
        assert_eq!(body.data.mdev, Some(NumericBool(true)));
        assert_eq!(body.data.map, m.entries);

        let dir = mapping(MappingType::Dir, "share", &["node=pve1,path=/mnt/data"]);
        assert_eq!(dir.to_create_request().data.mdev, None);
    }

    #[test]
    fn update_request_deletes_cleared_attributes() {
        let mut current = mapping(
            MappingType::Pci,
            "gpu",
            &["id=8086:5916,node=pve1,path=0000:00:02.0"],
        );
        current.comment = Some("GPU".to_string());
        current.mediated_devices = true;

        let desired = Mapping {
            comment: None,
            mediated_devices: false,
            ..current.clone()
        };
        let body = desired.to_update_request(&current);
        assert_eq!(body.delete, vec!["description".to_string(), "mdev".to_string()]);
        assert_eq!(body.data.mdev, Some(NumericBool(false)));

        let unchanged = current.to_update_request(&current);
        assert!(unchanged.delete.is_empty());
    }

    #[test]
    fn update_request_for_usb_never_touches_mdev() {
        let current = Mapping {
            comment: Some("dongle".to_string()),
            ..mapping(MappingType::Usb, "dongle", &["id=046d:c52b,node=pve1"])
        };
        let desired = Mapping {
            comment: None,
            ..current.clone()
        };
        let body = desired.to_update_request(&current);
        assert_eq!(body.delete, vec!["description".to_string()]);
        assert_eq!(body.data.mdev, None);
    }

    #[test]
    fn from_response_round_trip() {
        let m = Mapping {
            comment: Some("GPU".to_string()),
            mediated_devices: true,
            ..mapping(
                MappingType::Pci,
                "gpu",
                &["id=8086:5916,node=pve1,path=0000:00:02.0,iommugroup=12"],
            )
        };
        let response = GetResponseData {
            data: m.to_create_request().data,
            kind: m.kind,
        };
        assert_eq!(Mapping::from_response("gpu", response), m);

        let response = GetResponseData {
            data: MappingData {
                map: vec![entry("node=pve1,path=/mnt/data")],
                ..MappingData::default()
            },
            kind: MappingType::Dir,
        };
        let dir = Mapping::from_response("share", response);
        assert!(!dir.mediated_devices);
        assert_eq!(dir.comment, None);
        assert_eq!(dir.validate(), Ok(()));
    }
}
