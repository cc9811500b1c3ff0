// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Hardware mapping device IDs.
//!
//! A [`DeviceId`] is one of
//!
//! - a vendor ID and device ID pair, naming the class of the device, or
//! - a subsystem vendor ID and subsystem device ID pair, naming the assembly the device is
//!   part of (subsystem vendors share the namespace of device vendors).
//!
//! Either way the wire form is two 4-digit hexadecimal numbers separated by a colon, for
//! example `8086:5916`.
//!
//! # Examples
//!
//! ```
//! # use pvemap_hardware::mapping::device_id::DeviceId;
//! #
//! let id = DeviceId::parse("8086:5916").unwrap();
//! assert_eq!(id.vendor(), 0x8086);
//! assert_eq!(id.device(), 0x5916);
//! assert_eq!(id.to_string(), "8086:5916");
//!
//! // The case of the hex digits is preserved.
//! assert_eq!(DeviceId::parse("10DE:1db6").unwrap().as_str(), "10DE:1db6");
//!
//! assert!(DeviceId::parse("12345:6789").is_err());
//! ```

use std::str::FromStr;

/// A validated `VVVV:DDDD` hexadecimal identifier pair.
///
/// The parsed string is kept verbatim (no case normalization), so [`DeviceId::as_str`]
/// returns exactly what was parsed.
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
#[repr(transparent)]
pub struct DeviceId(String);

/// Error returned when a string is not a valid [`DeviceId`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid hardware mapping device ID {input:?}: expected a value matching {pattern}", pattern = DeviceId::PATTERN)]
pub struct InvalidDeviceId {
    input: String,
}

impl InvalidDeviceId {
    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl DeviceId {
    /// The accepted syntax, as a regular expression.
    pub const PATTERN: &'static str = "^[0-9A-Fa-f]{4}:[0-9A-Fa-f]{4}$";

    /// Length of the wire form (`VVVV:DDDD`).
    const LENGTH: usize = 9;

    /// Parse a device ID.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDeviceId`] unless the whole input is four hexadecimal digits, a
    /// colon, and four more hexadecimal digits.
    pub fn parse(input: impl AsRef<str>) -> Result<DeviceId, InvalidDeviceId> {
        let input = input.as_ref();
        if Self::is_valid(input) {
            Ok(DeviceId(input.to_string()))
        } else {
            Err(InvalidDeviceId {
                input: input.to_string(),
            })
        }
    }

    fn is_valid(input: &str) -> bool {
        let bytes = input.as_bytes();
        bytes.len() == Self::LENGTH
            && bytes[4] == b':'
            && bytes[..4].iter().all(u8::is_ascii_hexdigit)
            && bytes[5..].iter().all(u8::is_ascii_hexdigit)
    }

    /// The identifier exactly as it was parsed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first (vendor or subsystem vendor) half of the identifier.
    #[must_use]
    pub fn vendor(&self) -> u16 {
        Self::half(&self.0[..4])
    }

    /// The second (device or subsystem device) half of the identifier.
    #[must_use]
    pub fn device(&self) -> u16 {
        Self::half(&self.0[5..])
    }

    fn half(digits: &str) -> u16 {
        // checked in parse
        u16::from_str_radix(digits, 16).unwrap_or_else(|_| unreachable!())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl FromStr for DeviceId {
    type Err = InvalidDeviceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::parse(s)
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = InvalidDeviceId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DeviceId::parse(value)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = InvalidDeviceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if DeviceId::is_valid(&value) {
            Ok(DeviceId(value))
        } else {
            Err(InvalidDeviceId { input: value })
        }
    }
}

/// Test contract support for property-based testing.
#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::mapping::device_id::DeviceId;

    impl bolero::TypeGenerator for DeviceId {
        fn generate<D: bolero::Driver>(driver: &mut D) -> Option<Self> {
            let vendor = driver.produce::<u16>()?;
            let device = driver.produce::<u16>()?;
            let s = if driver.produce::<bool>()? {
                format!("{vendor:04X}:{device:04X}")
            } else {
                format!("{vendor:04x}:{device:04x}")
            };
            DeviceId::parse(s).ok()
        }
    }
}
