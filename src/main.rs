// Demo CLI runner for the `pixelart_engine` library. It plays the role of the
// external collaborators the engine itself refuses to be: it decodes the input
// file, hands a raw pixel buffer to the pipeline, and encodes the result.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueHint};
use pixelart_engine::pipeline::{
    ImageOutcome, PipelineConfig, PixelBuffer, convert_image,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pixelart_engine", version, about = "Convert an image into palette-quantized pixelart")]
struct Cli {
    /// Input image path
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    /// Output image path
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Side length of one pixelart block, in source pixels
    #[arg(short = 'b', long = "block-size", default_value_t = 8)]
    block_size: u32,

    /// Palette file: one color per line as comma-separated `r,g,b`
    #[arg(short = 'p', long = "palette", default_value = "palette_16")]
    palette: PathBuf,

    /// Snap every pixel to the palette before block averaging
    #[arg(long = "exact", action = ArgAction::SetTrue)]
    exact: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = PipelineConfig {
        block_size: cli.block_size,
        palette_source: cli.palette,
        exact_mode: cli.exact,
        ..PipelineConfig::default()
    };

    let decoded = image::open(&cli.input)
        .with_context(|| format!("failed to open image {:?}", cli.input))?
        .to_rgb8();
    let buffer = PixelBuffer::from_image(&decoded);

    match convert_image(buffer, &config)? {
        ImageOutcome::Pixelated(output) => {
            output
                .into_image()
                .save(&cli.output)
                .with_context(|| format!("failed to save image {:?}", cli.output))?;
            Ok(())
        }
        ImageOutcome::Unmodified { error, .. } => {
            bail!("palette could not be loaded: {error}")
        }
    }
}
