//! Unit descriptions: reading the JSON file and driving the emitter with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use objcgen_abi::ObjectUnit;
use objcgen_emit::{
    CategoryDescriptor, ClassDescriptor, EmitConfig, EmitError, ProtocolDescriptor, Unit,
};

use crate::cli::ConfigArgs;

/// Everything one compilation unit hands the emitter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UnitFile {
    /// Embedded in the module descriptor; defaults to the description's path.
    pub source_path: Option<String>,
    pub config: Option<EmitConfig>,
    pub protocols: Vec<ProtocolDescriptor>,
    pub classes: Vec<ClassDescriptor>,
    pub categories: Vec<CategoryDescriptor>,
    /// Selectors messaged by the unit's code.
    pub selectors: Vec<String>,
    /// Constant string literals.
    pub strings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid unit description {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

pub fn load_unit_file(path: &Path) -> Result<UnitFile, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl UnitFile {
    /// Config from the file, then command-line overrides.
    pub fn effective_config(&self, overrides: &ConfigArgs) -> EmitConfig {
        overrides.apply(self.config.clone().unwrap_or_default())
    }

    /// Run the emitter over the description.
    ///
    /// Protocols go first so classes adopting them find them defined.
    pub fn emit(&self, config: EmitConfig, default_source: &str) -> Result<Option<ObjectUnit>, EmitError> {
        let source_path = self.source_path.as_deref().unwrap_or(default_source);
        let mut unit = Unit::new(config, source_path)?;

        for protocol in &self.protocols {
            unit.define_protocol(protocol)?;
        }
        for class in &self.classes {
            unit.generate_class(class)?;
        }
        for category in &self.categories {
            unit.generate_category(category)?;
        }
        for selector in &self.selectors {
            unit.selector(selector);
        }
        for text in &self.strings {
            unit.constant_string(text);
        }

        unit.finalize()
    }
}

/// Load, configure, and emit in one step. Returns the configuration used
/// alongside the emitted unit.
pub fn emit_unit(
    path: &Path,
    overrides: &ConfigArgs,
) -> Result<(EmitConfig, Option<ObjectUnit>), LoadError> {
    let file = load_unit_file(path)?;
    let config = file.effective_config(overrides);
    tracing::debug!(path = %path.display(), abi = ?config.abi, schema = ?config.schema, "emitting unit");
    let object = file.emit(config.clone(), &path.display().to_string())?;
    Ok((config, object))
}
