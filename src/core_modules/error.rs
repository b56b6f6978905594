// THEORY:
// Every failure the engine can produce is named here, one kind per way the
// pipeline can go wrong. The propagation policy is strict: a palette problem or
// any per-frame problem during video conversion aborts the entire run — partial
// results are never handed back as if they were complete. The single deliberate
// exception lives in the image pipeline, which returns the caller's original
// buffer untouched when the palette cannot be loaded.

use std::io;
use thiserror::Error;

/// Failures while loading or parsing a palette source.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// The source could not be read at all.
    #[error("palette source could not be read")]
    Source(#[from] io::Error),
    /// The source was readable but contained no color records.
    #[error("palette source contains no color records")]
    EmptySource,
    /// A record did not decode to exactly three integers.
    #[error("malformed palette record on line {line}: {record:?}")]
    Parse { line: usize, record: String },
}

/// Failures while pixelating a single buffer.
#[derive(Debug, Error)]
pub enum PixelateError {
    #[error("block size must be at least 1")]
    InvalidBlockSize,
    /// The buffer had zero area once cropped to a block-size multiple.
    #[error("buffer of {width}x{height} has zero area after cropping to block size {block_size}")]
    EmptyBuffer {
        width: u32,
        height: u32,
        block_size: u32,
    },
}

/// The frame decode collaborator failed to produce a frame. The engine treats
/// the cause as opaque; it only needs to know the sequence is unusable.
#[derive(Debug, Error)]
#[error("frame source failed: {0}")]
pub struct FrameAccessError(pub Box<dyn std::error::Error + Send + Sync>);

impl FrameAccessError {
    pub fn new(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        FrameAccessError(Box::new(cause))
    }

    pub fn message(message: impl Into<String>) -> Self {
        FrameAccessError(message.into().into())
    }
}

/// A whole-conversion failure from the frame batch driver. Carries the frame
/// index where relevant so callers can report where the sequence broke.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Palette(#[from] PaletteError),
    /// The configuration could not produce a pixelator (zero block size).
    #[error("invalid pipeline configuration")]
    Config(#[source] PixelateError),
    #[error("failed to access frame {index}")]
    FrameAccess {
        index: usize,
        #[source]
        source: FrameAccessError,
    },
    #[error("transform failed on frame {index}")]
    Transform {
        index: usize,
        #[source]
        source: PixelateError,
    },
    /// The caller raised the abort flag; the conversion stopped at a chunk
    /// boundary without producing output.
    #[error("conversion aborted by caller")]
    Aborted,
    /// A worker task went away before replying. Only reachable if the runtime
    /// is shutting down underneath the driver.
    #[error("pixelation worker pool is no longer running")]
    PoolClosed,
}
