// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![doc = include_str!("README.md")]
#![deny(clippy::pedantic, clippy::unwrap_used)]

#[cfg(any(test, feature = "serde"))]
pub mod api;
pub mod definition;
pub mod mapping;
