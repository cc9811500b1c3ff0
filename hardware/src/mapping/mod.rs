// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Proxmox VE hardware mapping codec.
//!
//! Everything in here is a pure function of its input: no I/O, no shared state.

/// Vendor:device identifiers.
pub mod device_id;
/// Per device entries of a mapping (the property string codec).
pub mod entry;
/// Compound `type:name` identifiers.
pub mod id;
/// Hardware mapping categories.
pub mod kind;
/// Path syntax per mapping type.
pub mod path;

pub use device_id::{DeviceId, InvalidDeviceId};
pub use entry::{InvalidMapEntry, MapEntry};
pub use id::{InvalidMappingId, MappingId};
pub use kind::{IllegalMappingType, MappingType};
pub use path::InvalidPath;
