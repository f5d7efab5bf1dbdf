//! Parallel export with in-order delivery.
//!
//! Frames are rendered on a pool of worker threads, each owning its own
//! decoders and surface. Results come back in any order and are released
//! to the sink strictly by sequence number. A credit channel bounds the
//! number of frames in flight so a slow frame cannot make the reorder
//! buffer grow without limit.

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::is_in_cut_region;

use crate::compositor::FrameRenderer;
use crate::export::{
    in_stage, CancelFlag, ExportPlan, ExportStage, ExportSummary, ProgressCallback,
    ProgressReporter,
};
use crate::source::{FrameSink, MediaSources};

/// How often the collector wakes to check cancellation and sink health.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Frames allowed in flight per worker.
const CREDITS_PER_WORKER: usize = 2;

/// Holds out-of-order items until every earlier sequence number arrived.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> ReorderBuffer<T> {
    pub fn new(start: u64) -> Self {
        Self {
            next: start,
            pending: BTreeMap::new(),
        }
    }

    /// Queue `item`. Sequence numbers already released are dropped.
    pub fn push(&mut self, seq: u64, item: T) {
        if seq < self.next {
            tracing::warn!(seq, next = self.next, "Dropping stale frame");
            return;
        }
        self.pending.insert(seq, item);
    }

    /// Release the next item in sequence, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// The sequence number the buffer is waiting for.
    pub fn next_seq(&self) -> u64 {
        self.next
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct FrameJob {
    seq: u64,
    index: u64,
    time_secs: f64,
}

struct RenderedFrame {
    seq: u64,
    index: u64,
    rgba: Vec<u8>,
}

fn render_job(
    renderer: &mut FrameRenderer,
    sources: &mut MediaSources,
    job: FrameJob,
) -> ReframeResult<Vec<u8>> {
    sources.seek_all(job.time_secs)?;
    renderer
        .render_sources(job.time_secs, sources)
        .map_err(|e| in_stage("rendering", job.time_secs, e))?;
    Ok(renderer.rgba())
}

/// Render `plan` on `workers` threads and stream frames to `sink` in order.
///
/// `open_sources` is called once per worker, so every worker seeks its own
/// decoders. Like [`crate::export::export_frames`], the sink is neither
/// finished nor aborted here.
#[allow(clippy::too_many_arguments)]
pub fn export_frames_parallel<F>(
    renderer: &FrameRenderer,
    open_sources: F,
    workers: usize,
    plan: &ExportPlan,
    sink: &mut dyn FrameSink,
    cancel: &CancelFlag,
    progress: Option<&ProgressCallback>,
) -> ReframeResult<ExportSummary>
where
    F: Fn() -> ReframeResult<MediaSources> + Sync,
{
    let workers = workers.max(1);
    let total = plan.total_frames();
    let cuts = &renderer.scene().cut_regions;

    let jobs: Vec<FrameJob> = (0..total)
        .map(|index| (index, plan.frame_time(index)))
        .filter(|(_, t)| !is_in_cut_region(*t, cuts))
        .enumerate()
        .map(|(seq, (index, time_secs))| FrameJob {
            seq: seq as u64,
            index,
            time_secs,
        })
        .collect();
    let indices: Vec<u64> = jobs.iter().map(|job| job.index).collect();
    let expected = jobs.len() as u64;

    let reporter = ProgressReporter::new(total, progress);
    let mut summary = ExportSummary {
        total_frames: total,
        frames_skipped: total - expected,
        ..ExportSummary::default()
    };
    tracing::info!(
        total_frames = total,
        output_frames = expected,
        workers,
        "Rendering frames in parallel"
    );
    reporter.report(0, 0, ExportStage::Preparing);

    let credits = workers * CREDITS_PER_WORKER;
    let (credit_tx, credit_rx) = bounded::<()>(credits);
    for _ in 0..credits {
        let _ = credit_tx.send(());
    }
    let (job_tx, job_rx) = bounded::<FrameJob>(workers);
    let (result_tx, result_rx) = unbounded::<ReframeResult<RenderedFrame>>();
    let stop = CancelFlag::new();

    let outcome = std::thread::scope(|scope| {
        scope.spawn(move || {
            for job in jobs {
                if credit_rx.recv().is_err() || job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let mut renderer = renderer.clone();
            let open_sources = &open_sources;
            let cancel = cancel.clone();
            let stop = stop.clone();
            scope.spawn(move || {
                let mut sources = match open_sources() {
                    Ok(sources) => sources,
                    Err(err) => {
                        let _ = result_tx.send(Err(in_stage("preparing", 0.0, err)));
                        return;
                    }
                };
                tracing::debug!(worker, "Render worker started");
                for job in job_rx.iter() {
                    if cancel.is_cancelled() || stop.is_cancelled() {
                        break;
                    }
                    let result = render_job(&mut renderer, &mut sources, job).map(|rgba| {
                        RenderedFrame {
                            seq: job.seq,
                            index: job.index,
                            rgba,
                        }
                    });
                    let failed = result.is_err();
                    if result_tx.send(result).is_err() || failed {
                        break;
                    }
                }
                tracing::debug!(worker, "Render worker stopped");
            });
        }
        drop(job_rx);
        drop(result_tx);

        let mut buffer = ReorderBuffer::new(0);
        let outcome = 'collect: loop {
            if summary.frames_written >= expected {
                break Ok(());
            }
            if cancel.is_cancelled() {
                let frame = indices
                    .get(buffer.next_seq() as usize)
                    .copied()
                    .unwrap_or(total);
                break Err(ReframeError::Cancelled { frame });
            }
            if let Some(reason) = sink.fatal_error() {
                break Err(ReframeError::export("encoding", reason));
            }

            match result_rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(frame)) => buffer.push(frame.seq, (frame.index, frame.rgba)),
                Ok(Err(err)) => break Err(err),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    break Err(ReframeError::export(
                        "rendering",
                        "Render workers stopped before the last frame",
                    ));
                }
            }

            while let Some((index, rgba)) = buffer.pop_ready() {
                if let Err(err) = sink.write_frame(&rgba) {
                    break 'collect Err(in_stage("encoding", plan.frame_time(index), err));
                }
                summary.frames_written += 1;
                let _ = credit_tx.send(());
                reporter.report(index + 1, summary.frames_written, ExportStage::Rendering);
            }
        };

        // Unblock the feeder and make pending worker sends fail.
        drop(credit_tx);
        drop(result_rx);
        if outcome.is_err() {
            stop.cancel();
        }
        outcome
    });

    outcome?;
    summary.elapsed_secs = reporter.elapsed_secs();
    Ok(summary)
}
