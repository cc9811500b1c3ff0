// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

pub(crate) use clap::Parser;
use clap::{Subcommand, ValueEnum};
use hardware::mapping::{IllegalMappingType, MappingType};

fn parse_mapping_type(input: &str) -> Result<MappingType, IllegalMappingType> {
    MappingType::parse(input)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human readable output
    #[default]
    Text,
    /// JSON output, one document per invocation
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pvemap")]
#[command(version)]
#[command(about = "Inspect and validate Proxmox VE hardware mappings", long_about = None)]
pub(crate) struct CmdArgs {
    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        default_value = "warn",
        help = "Log filter (e.g. debug, or pvemap_hardware=trace); RUST_LOG takes precedence when set"
    )]
    pub(crate) log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub(crate) enum Command {
    /// Validate a vendor:device ID such as 8086:5916
    DeviceId {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Parse a type:name mapping ID such as pci:gpu0
    MappingId {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Parse a property string such as id=8086:5916,node=pve1,path=0000:00:02.0
    Entry {
        #[arg(value_name = "PROPERTY-STRING", allow_hyphen_values = true)]
        entry: String,
    },
    /// Validate a complete mapping and print the request which would create it
    Check {
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_mapping_type)]
        kind: MappingType,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Comment of the whole mapping")]
        comment: Option<String>,
        #[arg(long, help = "Enable mediated devices (pci only)")]
        mdev: bool,
        #[arg(value_name = "PROPERTY-STRING", required = true)]
        entries: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use hardware::mapping::MappingType;

    use crate::args::{CmdArgs, Command, OutputFormat, Parser};

    #[test]
    fn command_definition_is_consistent() {
        CmdArgs::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = CmdArgs::try_parse_from(["pvemap", "device-id", "8086:5916"]).unwrap();
        assert_eq!(args.log_level, "warn");
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(
            args.command,
            Command::DeviceId {
                id: "8086:5916".to_string()
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CmdArgs::try_parse_from([
            "pvemap",
            "entry",
            "node=pve1,path=/mnt/data",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn check_arguments() {
        let args = CmdArgs::try_parse_from([
            "pvemap",
            "check",
            "--type",
            "pci",
            "--name",
            "gpu",
            "--mdev",
            "id=8086:5916,node=pve1,path=0000:00:02.0",
            "id=8086:5916,node=pve2,path=0000:00:02.0",
        ])
        .unwrap();
        match args.command {
            Command::Check {
                kind,
                name,
                comment,
                mdev,
                entries,
            } => {
                assert_eq!(kind, MappingType::Pci);
                assert_eq!(name, "gpu");
                assert_eq!(comment, None);
                assert!(mdev);
                assert_eq!(entries.len(), 2);
            }
            other => unreachable!("expected check, got {other:?}"),
        }
    }

    #[test]
    fn check_rejects_unknown_type_and_missing_entries() {
        assert!(
            CmdArgs::try_parse_from(["pvemap", "check", "--type", "PCI", "--name", "gpu", "node=pve1"])
                .is_err()
        );
        assert!(CmdArgs::try_parse_from(["pvemap", "check", "--type", "dir", "--name", "share"]).is_err());
    }
}
