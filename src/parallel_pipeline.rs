// THEORY:
// The `parallel_pipeline` module is the frame batch driver: it runs the
// pixelator over an arbitrarily long frame sequence while holding only a
// bounded number of frames in memory at once. The sequence is consumed in
// fixed-size chunks; each chunk is materialized from the decode collaborator,
// fanned out to a pool of worker tasks, reassembled in order, and discarded
// before the next chunk is touched.
//
// Key architectural principles:
// 1.  **Bounded residency**: Peak memory is one chunk of input frames plus the
//     growing output, regardless of how long the video is. The chunk loop is
//     sequential as a scheduling policy, not a data dependency.
// 2.  **Order-preserving parallelism**: Frames within a chunk share no mutable
//     state beyond the read-only palette, so they are pixelated concurrently.
//     Results are awaited in submission order, so chunking and parallelism can
//     never alter or reorder per-frame output.
// 3.  **All-or-nothing**: Any frame access failure or transform failure aborts
//     the entire conversion. A partially pixelated sequence is never returned.
// 4.  **Prompt abort**: Callers hold an `AbortHandle`; the flag is checked at
//     every chunk boundary so an abandoned conversion stops within one chunk
//     instead of running to completion.

use crate::core_modules::error::{ConversionError, PixelateError};
use crate::core_modules::frame::{FrameSequence, FrameSource, PixelBuffer};
use crate::core_modules::palette::Palette;
use crate::core_modules::pixelator::Pixelator;
use crate::pipeline::PipelineConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

/// A cloneable flag for stopping a running conversion. Checked at chunk
/// boundaries only; mid-chunk work is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

struct FrameTask {
    frame: PixelBuffer,
    result_sender: oneshot::Sender<Result<PixelBuffer, PixelateError>>,
}

/// A fixed pool of pixelation workers fed round-robin from a dispatcher task.
/// Every worker shares one `Arc<Pixelator>`; the palette inside is read-only,
/// so no synchronization exists beyond the channels themselves.
#[derive(Debug)]
struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    fn new(pixelator: Arc<Pixelator>) -> Self {
        let worker_count = num_cpus::get().max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();

        // Create a single dispatcher that distributes tasks to workers.
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        let dispatcher_senders = worker_senders;
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = dispatcher_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % dispatcher_senders.len();
            }
        });

        let mut workers = Vec::new();
        for mut worker_receiver in worker_receivers {
            let worker_pixelator = Arc::clone(&pixelator);
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = worker_pixelator.pixelate(task.frame);
                    let _ = task.result_sender.send(result);
                }
            });
            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    fn submit(
        &self,
        frame: PixelBuffer,
    ) -> Result<oneshot::Receiver<Result<PixelBuffer, PixelateError>>, ConversionError> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(FrameTask {
                frame,
                result_sender,
            })
            .map_err(|_| ConversionError::PoolClosed)?;
        Ok(result_receiver)
    }
}

/// The main struct for video conversion: a chunked, parallel frame batch
/// driver around the single-buffer `Pixelator`.
#[derive(Debug)]
pub struct BatchPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
    abort: AbortHandle,
}

impl BatchPipeline {
    /// Loads the palette named by the config and builds the worker pool.
    /// Must be called from within a tokio runtime.
    pub fn new(config: PipelineConfig) -> Result<Self, ConversionError> {
        log::info!("opening palette {:?}", config.palette_source);
        let palette = Arc::new(Palette::load_path(&config.palette_source)?);
        Self::with_palette(config, palette)
    }

    /// Builds the driver around an already-loaded palette.
    pub fn with_palette(
        config: PipelineConfig,
        palette: Arc<Palette>,
    ) -> Result<Self, ConversionError> {
        let pixelator = Pixelator::new(config.block_size, config.exact_mode, palette)
            .map_err(ConversionError::Config)?;
        let worker_pool = WorkerPool::new(Arc::new(pixelator));
        Ok(Self {
            config,
            worker_pool,
            abort: AbortHandle::default(),
        })
    }

    /// A handle the caller can keep to stop this conversion early.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Converts the whole sequence. On any failure the error propagates and no
    /// output is returned; the source is never modified.
    pub async fn process(
        &self,
        source: &mut dyn FrameSource,
        target_duration: Option<f64>,
    ) -> Result<FrameSequence, ConversionError> {
        let total = source.frame_count();
        let frame_rate = self
            .config
            .output_frame_rate
            .unwrap_or_else(|| source.frame_rate());
        // A zero chunk size would never advance the window; treat it as 1.
        let chunk_size = self.config.chunk_size.max(1);

        log::info!(
            "processing {total} frames in chunks of {chunk_size} at {frame_rate} fps"
        );

        let mut frames = Vec::with_capacity(total);
        let mut start = 0;
        while start < total {
            if self.abort.is_aborted() {
                log::warn!("conversion aborted after {start} of {total} frames");
                return Err(ConversionError::Aborted);
            }
            // The final chunk is clamped to the true remainder, never padded
            // out to a full window.
            let end = (start + chunk_size).min(total);

            let mut pending = Vec::with_capacity(end - start);
            for index in start..end {
                let frame = source
                    .fetch(index)
                    .map_err(|source| ConversionError::FrameAccess { index, source })?;
                pending.push((index, self.worker_pool.submit(frame)?));
            }

            // Await in submission order so parallelism never reorders output.
            let (indices, receivers): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
            let results = futures::future::join_all(receivers).await;
            for (index, result) in indices.into_iter().zip(results) {
                let frame = result
                    .map_err(|_| ConversionError::PoolClosed)?
                    .map_err(|source| ConversionError::Transform { index, source })?;
                frames.push(frame);
            }

            log::info!("progress: {} / {total} frames", frames.len());
            start = end;
        }

        Ok(FrameSequence {
            frames,
            frame_rate,
            target_duration,
        })
    }
}
