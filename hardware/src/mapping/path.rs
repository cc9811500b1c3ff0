// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The syntax of the `path` attribute depends on the mapping type.
//!
//! | type  | pattern                                                  | example        |
//! |-------|----------------------------------------------------------|----------------|
//! | `pci` | `^[a-f0-9]{4,}:[a-f0-9]{2}:[a-f0-9]{2}(\.[a-f0-9])?$`     | `0000:00:02.0` |
//! | `usb` | `^\d+-(\d+)(\.\d+)?$` (or empty)                         | `1-5.2`        |
//! | `dir` | `^/.+$`                                                  | `/mnt/data`    |
//!
//! Note that PCI paths are lowercase only, unlike device IDs.

use crate::mapping::kind::MappingType;

/// Error returned for a path which does not suit its mapping type.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid path {path:?} for a hardware mapping of type {kind}: expected a value matching {pattern}", pattern = .kind.path_pattern())]
pub struct InvalidPath {
    /// The mapping type the path was checked against.
    pub kind: MappingType,
    /// The rejected path.
    pub path: String,
}

fn is_lower_hex(c: u8) -> bool {
    c.is_ascii_digit() || (b'a'..=b'f').contains(&c)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

fn is_pci_path(path: &str) -> bool {
    let (bus_path, function) = match path.split_once('.') {
        Some((bus_path, function)) => (bus_path, Some(function)),
        None => (path, None),
    };
    if let Some(function) = function {
        if function.len() != 1 || !function.bytes().all(is_lower_hex) {
            return false;
        }
    }
    let parts: Vec<_> = bus_path.split(':').collect();
    let [domain, bus, device] = parts.as_slice() else {
        return false;
    };
    domain.len() >= 4
        && bus.len() == 2
        && device.len() == 2
        && [domain, bus, device]
            .iter()
            .all(|part| part.bytes().all(is_lower_hex))
}

fn is_usb_path(path: &str) -> bool {
    if path.is_empty() {
        // mapped by ID rather than by port
        return true;
    }
    let Some((bus, port)) = path.split_once('-') else {
        return false;
    };
    let (port, subport) = match port.split_once('.') {
        Some((port, subport)) => (port, Some(subport)),
        None => (port, None),
    };
    is_digits(bus) && is_digits(port) && subport.is_none_or(is_digits)
}

fn is_dir_path(path: &str) -> bool {
    path.strip_prefix('/')
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('\n'))
}

impl MappingType {
    /// The accepted `path` syntax for this type, as a regular expression.
    #[must_use]
    pub fn path_pattern(self) -> &'static str {
        match self {
            MappingType::Pci => r"^[a-f0-9]{4,}:[a-f0-9]{2}:[a-f0-9]{2}(\.[a-f0-9])?$",
            MappingType::Usb => r"^\d+-(\d+)(\.\d+)?$",
            MappingType::Dir => r"^/.+$",
        }
    }

    /// Whether `path` is a valid `path` attribute for this type.
    ///
    /// An empty path is accepted for USB mappings only (the device is then mapped by its
    /// ID instead of its port).
    #[must_use]
    pub fn accepts_path(self, path: &str) -> bool {
        match self {
            MappingType::Pci => is_pci_path(path),
            MappingType::Usb => is_usb_path(path),
            MappingType::Dir => is_dir_path(path),
        }
    }

    /// Check that `path` is a valid `path` attribute for this type.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`] if [`MappingType::accepts_path`] does not hold.
    pub fn check_path(self, path: &str) -> Result<(), InvalidPath> {
        if self.accepts_path(path) {
            Ok(())
        } else {
            Err(InvalidPath {
                kind: self,
                path: path.to_string(),
            })
        }
    }
}
