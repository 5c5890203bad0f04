use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, warn, LevelFilter};

use gemini_watermark_png::png::MAX_COMPRESSION_LEVEL;
use gemini_watermark_png::{
    default_output_path, DirMaskSource, ProcessOptions, ProcessResult, WatermarkRemover,
    WatermarkSize,
};

#[derive(Parser)]
#[command(
    name = "gemini-watermark",
    about = "Remove visible Gemini AI watermarks from PNG images via reverse alpha blending",
    version,
    after_help = "Simple usage: gemini-watermark <image.png>  (writes <image>_cleaned.png)\n\n\
                  NOTE: This tool only removes the VISIBLE Gemini watermark (star/sparkle logo).\n\
                  It cannot remove SynthID (invisible watermark)."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input PNG file or directory
    input: String,

    /// Output file or directory (default: {name}_cleaned.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory holding bg_48.png and bg_96.png (default: <exe dir>/assets)
    #[arg(long, env = "GEMINI_WATERMARK_ASSETS")]
    assets: Option<PathBuf>,

    /// Force 48x48 watermark size (for images <= 1024px)
    #[arg(long)]
    force_small: bool,

    /// Force 96x96 watermark size (for images > 1024px)
    #[arg(long)]
    force_large: bool,

    /// Process images even if they are too small to hold the watermark
    #[arg(long)]
    include_small: bool,

    /// zlib compression level for the output (0-9)
    #[arg(short, long, default_value_t = 6)]
    level: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.as_str()),
    )
    .format_timestamp(None)
    .init();

    if cli.force_small && cli.force_large {
        error!("Cannot specify both --force-small and --force-large");
        process::exit(1);
    }

    if cli.level > MAX_COMPRESSION_LEVEL {
        error!("Compression level must be between 0 and {MAX_COMPRESSION_LEVEL}");
        process::exit(1);
    }

    let force_size = if cli.force_small {
        Some(WatermarkSize::Small)
    } else if cli.force_large {
        Some(WatermarkSize::Large)
    } else {
        None
    };

    let opts = ProcessOptions {
        force_size,
        skip_small: !cli.include_small,
        compression_level: cli.level,
    };

    let source = match &cli.assets {
        Some(dir) => DirMaskSource::new(dir),
        None => match DirMaskSource::beside_executable() {
            Ok(source) => source,
            Err(e) => {
                error!("Fatal: cannot locate asset directory: {e}");
                process::exit(1);
            }
        },
    };
    let remover = WatermarkRemover::new(source).with_compression_level(cli.level);

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        error!("Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = cli.output.as_ref().map(PathBuf::from) else {
            error!("Output directory is required for batch processing");
            error!("Usage: gemini-watermark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        remover.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![remover.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.quiet);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !quiet {
            warn!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !quiet {
            eprintln!("[OK] {filename}");
        }
    } else {
        error!("[FAIL] {filename}: {}", result.message);
    }
}
