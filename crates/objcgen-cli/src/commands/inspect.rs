use std::fs;
use std::path::PathBuf;

use objcgen_abi::{Image, dump_image};
use objcgen_core::Colors;

pub struct InspectArgs {
    pub image: PathBuf,
    pub color: bool,
}

pub fn run(args: InspectArgs) {
    let bytes = match fs::read(&args.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", args.image.display(), e);
            std::process::exit(1);
        }
    };

    let rendered = Image::load(&bytes).and_then(|image| dump_image(&image, Colors::new(args.color)));
    match rendered {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("error: {}: {}", args.image.display(), e);
            std::process::exit(1);
        }
    }
}
