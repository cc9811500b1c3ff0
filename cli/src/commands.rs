// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use hardware::definition::{InvalidMapping, Mapping};
use hardware::mapping::{
    DeviceId, InvalidDeviceId, InvalidMapEntry, InvalidMappingId, MapEntry, MappingId, MappingType,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::args::{Command, OutputFormat};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliErr {
    #[error(transparent)]
    DeviceId(#[from] InvalidDeviceId),
    #[error(transparent)]
    MappingId(#[from] InvalidMappingId),
    #[error(transparent)]
    Entry(#[from] InvalidMapEntry),
    #[error("unable to parse mapping entry {index}")]
    MappingEntry {
        index: usize,
        #[source]
        source: InvalidMapEntry,
    },
    #[error(transparent)]
    Mapping(#[from] InvalidMapping),
    #[error("unable to render JSON output")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct DeviceIdView<'a> {
    id: &'a str,
    vendor: String,
    device: String,
}

#[derive(Serialize)]
struct MappingIdView<'a> {
    #[serde(rename = "type")]
    kind: MappingType,
    name: &'a str,
}

#[derive(Serialize)]
struct EntryView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    node: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iommugroup: Option<i64>,
    #[serde(rename = "subsystem-id", skip_serializing_if = "Option::is_none")]
    subsystem_id: Option<&'a str>,
}

impl<'a> From<&'a MapEntry> for EntryView<'a> {
    fn from(entry: &'a MapEntry) -> Self {
        Self {
            id: entry.id.as_ref().map(DeviceId::as_str),
            node: &entry.node,
            path: entry.path.as_deref(),
            description: entry.description.as_deref(),
            iommugroup: entry.iommu_group,
            subsystem_id: entry.subsystem_id.as_ref().map(DeviceId::as_str),
        }
    }
}

fn device_id(input: &str, format: OutputFormat) -> Result<String, CliErr> {
    let id = DeviceId::parse(input)?;
    Ok(match format {
        OutputFormat::Text => id.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&DeviceIdView {
            id: id.as_str(),
            vendor: format!("{:04x}", id.vendor()),
            device: format!("{:04x}", id.device()),
        })?,
    })
}

fn mapping_id(input: &str, format: OutputFormat) -> Result<String, CliErr> {
    let id = MappingId::parse(input)?;
    if id.name.is_empty() {
        info!("hardware mapping ID {input:?} has an empty name");
    }
    Ok(match format {
        OutputFormat::Text => format!("type\t{}\nname\t{}", id.kind, id.name),
        OutputFormat::Json => serde_json::to_string_pretty(&MappingIdView {
            kind: id.kind,
            name: &id.name,
        })?,
    })
}

fn entry(input: &str, format: OutputFormat) -> Result<String, CliErr> {
    let entry = MapEntry::parse(input)?;
    let normalized = entry.to_string();
    if normalized != input {
        debug!("normalized {input:?} to {normalized:?}");
    }
    Ok(match format {
        OutputFormat::Text => normalized,
        OutputFormat::Json => serde_json::to_string_pretty(&EntryView::from(&entry))?,
    })
}

fn check(mapping: &Mapping, format: OutputFormat) -> Result<String, CliErr> {
    mapping.validate()?;
    info!(
        "hardware mapping {} with {} entries is valid",
        mapping.id(),
        mapping.entries.len()
    );
    let request = mapping.to_create_request();
    Ok(match format {
        OutputFormat::Text => request
            .form_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(&request)?,
    })
}

/// Execute a command, returning what to print on stdout.
pub(crate) fn run(command: &Command, format: OutputFormat) -> Result<String, CliErr> {
    match command {
        Command::DeviceId { id } => device_id(id, format),
        Command::MappingId { id } => mapping_id(id, format),
        Command::Entry { entry: raw } => entry(raw, format),
        Command::Check {
            kind,
            name,
            comment,
            mdev,
            entries,
        } => {
            let entries = entries
                .iter()
                .enumerate()
                .map(|(index, raw)| {
                    MapEntry::parse(raw).map_err(|source| CliErr::MappingEntry { index, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mapping = Mapping {
                comment: comment.clone(),
                entries,
                mediated_devices: *mdev,
                ..Mapping::new(*kind, name.clone())
            };
            check(&mapping, format)
        }
    }
}
