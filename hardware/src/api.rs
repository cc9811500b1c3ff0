// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Request and response bodies of the `/cluster/mapping/<type>` API endpoints.
//!
//! Responses are JSON.
//! Requests are sent as form parameters (see [`CreateRequestBody::form_pairs`] and
//! [`UpdateRequestBody::form_pairs`]), where every device entry of a mapping is one
//! repeated `map` parameter holding a property string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::mapping::entry::MapEntry;
use crate::mapping::kind::MappingType;

/// API parameter name of the "mediated devices" flag of PCI mappings.
pub const MEDIATED_DEVICES_PARAM: &str = "mdev";

/// API parameter name of the mapping comment.
pub const DESCRIPTION_PARAM: &str = MapEntry::ATTR_DESCRIPTION;

/// A boolean which the API writes as `1`/`0`.
///
/// Reading also accepts JSON booleans and the strings `"1"`/`"0"`/`"true"`/`"false"`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct NumericBool(pub bool);

impl From<bool> for NumericBool {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<NumericBool> for bool {
    fn from(value: NumericBool) -> Self {
        value.0
    }
}

impl Serialize for NumericBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(self.0))
    }
}

impl<'de> Deserialize<'de> for NumericBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = NumericBool;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a boolean, 0 or 1")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(NumericBool(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(NumericBool(v == 1))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(NumericBool(v == 1))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(NumericBool(v == "1" || v == "true"))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Attributes shared by every mapping body.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MappingData {
    /// Comment of the whole mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// One entry per mapped device.
    #[serde(default)]
    pub map: Vec<MapEntry>,
    /// Whether mediated devices are enabled (PCI only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdev: Option<NumericBool>,
}

impl MappingData {
    fn push_form_pairs(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(description) = &self.description {
            pairs.push((DESCRIPTION_PARAM, description.clone()));
        }
        pairs.extend(self.map.iter().map(|entry| ("map", entry.to_string())));
        if self.mdev.is_some_and(bool::from) {
            pairs.push((MEDIATED_DEVICES_PARAM, "1".to_string()));
        }
    }
}

/// Body of `POST /cluster/mapping/<type>`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateRequestBody {
    /// The mapping attributes.
    #[serde(flatten)]
    pub data: MappingData,
    /// The name of the new mapping.
    pub id: String,
}

impl CreateRequestBody {
    /// The form parameters of this request, in order.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("id", self.id.clone())];
        self.data.push_form_pairs(&mut pairs);
        pairs
    }
}

/// Body of `PUT /cluster/mapping/<type>/<name>`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UpdateRequestBody {
    /// The mapping attributes.
    #[serde(flatten)]
    pub data: MappingData,
    /// Parameters to reset to their defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
}

impl UpdateRequestBody {
    /// The form parameters of this request, in order.
    ///
    /// `delete` is sent as a single comma separated parameter.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        self.data.push_form_pairs(&mut pairs);
        if !self.delete.is_empty() {
            pairs.push(("delete", self.delete.join(",")));
        }
        pairs
    }
}

/// Body of `GET /cluster/mapping/<type>/<name>`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GetResponseBody {
    /// The mapping, if it exists.
    #[serde(default)]
    pub data: Option<GetResponseData>,
}

/// A single mapping as returned by the API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GetResponseData {
    /// The mapping attributes.
    #[serde(flatten)]
    pub data: MappingData,
    /// The type of the mapping.
    #[serde(rename = "type")]
    pub kind: MappingType,
}

/// Body of `GET /cluster/mapping/<type>`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListResponseBody {
    /// All mappings of the type.
    #[serde(default)]
    pub data: Vec<ListResponseData>,
}

/// One mapping of a list response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ListResponseData {
    /// The mapping attributes.
    #[serde(flatten)]
    pub data: MappingData,
    /// The name of the mapping.
    pub id: String,
    /// The type of the mapping.
    #[serde(rename = "type")]
    pub kind: MappingType,
    /// Node diagnostics of PCI mappings (requested with `check-node`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<NodeCheckDiag>,
    /// Node diagnostics of USB mappings (requested with `check-node`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<NodeCheckDiag>,
}

impl ListResponseData {
    /// All node diagnostics, whichever field the API used for them.
    #[must_use]
    pub fn diagnostics(&self) -> impl Iterator<Item = &NodeCheckDiag> {
        self.checks.iter().chain(self.errors.iter())
    }
}

/// A diagnostic about one mapping entry on the checked node.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeCheckDiag {
    /// Human readable description of the problem.
    #[serde(default)]
    pub message: Option<String>,
    /// Severity, e.g. `warning` or `error`.
    #[serde(default)]
    pub severity: Option<String>,
}
