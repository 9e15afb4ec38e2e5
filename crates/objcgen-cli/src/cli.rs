use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use objcgen_abi::{ClassSchema, TargetData};
use objcgen_emit::{AbiMode, EmitConfig, GcMode, InstanceSizePolicy};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            // Piping either stream turns colors off.
            ColorChoice::Auto => {
                std::io::IsTerminal::is_terminal(&std::io::stdout())
                    && std::io::IsTerminal::is_terminal(&std::io::stderr())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AbiChoice {
    Fragile,
    NonFragile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemaChoice {
    Legacy,
    Extended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GcChoice {
    None,
    RefCounted,
    GcOnly,
    Hybrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TargetChoice {
    Lp64,
    Ilp32,
    Llp64,
}

#[derive(Parser)]
#[command(name = "objcgen", bin_name = "objcgen")]
#[command(about = "Emit Objective-C runtime metadata from class descriptions")]
pub struct Cli {
    /// Log emitter decisions to stderr (overrides OBJCGEN_LOG)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Emit a unit and print its globals
    #[command(after_help = r#"EXAMPLES:
  objcgen dump unit.json
  objcgen dump unit.json --abi non-fragile --schema extended
  objcgen dump unit.json --target ilp32 --color never"#)]
    Dump {
        /// Unit description (JSON)
        #[arg(value_name = "UNIT")]
        unit: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Emit a unit and write its metadata image
    #[command(after_help = r#"EXAMPLES:
  objcgen emit unit.json -o unit.objm
  objcgen emit unit.json -o unit.objm --runtime-version 10 --gc gc-only"#)]
    Emit {
        /// Unit description (JSON)
        #[arg(value_name = "UNIT")]
        unit: PathBuf,

        /// Image file to write
        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Validate a metadata image and print its contents
    Inspect {
        /// Image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Configuration overrides; unset flags keep the unit file's values.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Ivar layout convention
    #[arg(long, value_name = "ABI")]
    pub abi: Option<AbiChoice>,

    /// Class structure layout
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<SchemaChoice>,

    /// Memory management mode recorded in the module descriptor
    #[arg(long, value_name = "MODE")]
    pub gc: Option<GcChoice>,

    /// Runtime version recorded in the module descriptor
    #[arg(long, value_name = "N")]
    pub runtime_version: Option<u32>,

    /// Data layout of the target platform
    #[arg(long, value_name = "TARGET")]
    pub target: Option<TargetChoice>,
}

impl ConfigArgs {
    /// Apply the flags on top of `config`.
    ///
    /// Switching to the non-fragile ABI also switches to relative instance
    /// sizes, and back.
    pub fn apply(&self, mut config: EmitConfig) -> EmitConfig {
        if let Some(abi) = self.abi {
            (config.abi, config.instance_size) = match abi {
                AbiChoice::Fragile => (AbiMode::Fragile, InstanceSizePolicy::Absolute),
                AbiChoice::NonFragile => (AbiMode::NonFragile, InstanceSizePolicy::RelativeSentinel),
            };
        }
        if let Some(schema) = self.schema {
            config.schema = match schema {
                SchemaChoice::Legacy => ClassSchema::Legacy,
                SchemaChoice::Extended => ClassSchema::Extended,
            };
        }
        if let Some(gc) = self.gc {
            config.gc = match gc {
                GcChoice::None => GcMode::None,
                GcChoice::RefCounted => GcMode::RefCounted,
                GcChoice::GcOnly => GcMode::GcOnly,
                GcChoice::Hybrid => GcMode::Hybrid,
            };
        }
        if let Some(version) = self.runtime_version {
            config.runtime_version = version;
        }
        if let Some(target) = self.target {
            config.target = match target {
                TargetChoice::Lp64 => TargetData::LP64,
                TargetChoice::Ilp32 => TargetData::ILP32,
                TargetChoice::Llp64 => TargetData::LLP64,
            };
        }
        config
    }
}

#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Colorize output (auto-detected by default)
    #[arg(long, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,
}
