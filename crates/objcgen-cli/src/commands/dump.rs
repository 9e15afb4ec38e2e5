use std::path::PathBuf;

use objcgen_abi::dump;
use objcgen_core::Colors;

use super::unit_loader::emit_unit;
use crate::cli::ConfigArgs;

pub struct DumpArgs {
    pub unit: PathBuf,
    pub config: ConfigArgs,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let object = match emit_unit(&args.unit, &args.config) {
        Ok((_, object)) => object,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    match object {
        Some(object) => print!("{}", dump(&object, Colors::new(args.color))),
        None => eprintln!("nothing to register in {}", args.unit.display()),
    }
}
