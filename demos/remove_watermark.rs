//! Remove the Gemini watermark from a single PNG.
//!
//! Usage:
//! ```sh
//! cargo run --example remove_watermark -- <assets_dir> input.png output.png
//! ```

use std::env;
use std::process;

use gemini_watermark_png::{DirMaskSource, ProcessOptions, WatermarkRemover};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <assets_dir> <input> <output>", args[0]);
        process::exit(1);
    }

    let remover = WatermarkRemover::new(DirMaskSource::new(&args[1]));
    let opts = ProcessOptions::default();
    let result = remover.process_file(args[2].as_ref(), args[3].as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
