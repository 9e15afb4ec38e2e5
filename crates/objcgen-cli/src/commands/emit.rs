use std::fs;
use std::path::PathBuf;

use objcgen_abi::encode;

use super::unit_loader::emit_unit;
use crate::cli::ConfigArgs;

pub struct EmitArgs {
    pub unit: PathBuf,
    pub output: PathBuf,
    pub config: ConfigArgs,
}

pub fn run(args: EmitArgs) {
    let (config, object) = match emit_unit(&args.unit, &args.config) {
        Ok(emitted) => emitted,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Empty unit: nothing to register, nothing to write.
    let Some(object) = object else {
        return;
    };

    let bytes = match encode(&object, &config.target) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::write(&args.output, &bytes) {
        eprintln!("error: failed to write {}: {}", args.output.display(), e);
        std::process::exit(1);
    }
    tracing::debug!(path = %args.output.display(), bytes = bytes.len(), "image written");
}
