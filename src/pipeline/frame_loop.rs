use super::{PipelineContext, StageTimings};
use crate::background::Frame;
use crate::capture::{CaptureSource, ScopedCapture};
use crate::config::LoopConfig;
use crate::control::{ControlEvent, ControlSource};
use crate::error::{PipelineError, Result};
use crate::output::{mask_to_rgb, stamp_frame_number, DisplaySink, Window};
use std::time::{Duration, Instant};

/// Lifecycle of the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// Outcome of a loop that stopped on request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub final_state: LoopState,
}

#[derive(Default)]
struct LoopStats {
    frames: u64,
    capture: Duration,
    stages: StageTimings,
    output: Duration,
}

impl LoopStats {
    fn report(&self) {
        let per_frame = |d: Duration| d.as_secs_f64() * 1000.0 / self.frames.max(1) as f64;
        let capture_ms = per_frame(self.capture);
        let model_ms = per_frame(self.stages.model);
        let clean_ms = per_frame(self.stages.clean);
        let extract_ms = per_frame(self.stages.extract + self.stages.render);
        let output_ms = per_frame(self.output);
        let total_ms = capture_ms + model_ms + clean_ms + extract_ms + output_ms;

        tracing::info!(
            "Frame {}: capture={:.1}ms, models={:.1}ms, clean={:.1}ms, contours={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
            self.frames,
            capture_ms,
            model_ms,
            clean_ms,
            extract_ms,
            output_ms,
            total_ms,
            1000.0 / total_ms.max(f64::EPSILON)
        );
    }
}

/// Drives acquire, process, display and poll, one frame at a time
pub struct FrameLoop {
    context: PipelineContext,
    config: LoopConfig,
    state: LoopState,
    frames: u64,
}

impl FrameLoop {
    pub fn new(context: PipelineContext, config: LoopConfig) -> Self {
        Self {
            context,
            config,
            state: LoopState::Stopped,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PipelineContext {
        &mut self.context
    }

    /// Run until a quit request, the frame limit, or a fatal error
    ///
    /// The capture source is released before this returns on every path.
    pub fn run<C, D, K>(&mut self, capture: C, sink: &mut D, control: &mut K) -> Result<RunSummary>
    where
        C: CaptureSource,
        D: DisplaySink + ?Sized,
        K: ControlSource + ?Sized,
    {
        let mut capture = ScopedCapture::new(capture);
        let mut stats = LoopStats::default();
        self.frames = 0;
        self.state = LoopState::Running;

        tracing::info!("Starting frame loop on {}", capture.describe());

        loop {
            match self.state {
                LoopState::Running => {
                    if let Err(err) = self.step(&mut *capture, sink, control, &mut stats) {
                        tracing::error!("Stopping after frame {}: {}", self.frames, err);
                        self.state = LoopState::Stopped;
                        return Err(err);
                    }
                }
                LoopState::Stopping => {
                    capture.release();
                    self.state = LoopState::Stopped;
                }
                LoopState::Stopped => break,
            }
        }

        tracing::info!("Frame loop stopped after {} frames", self.frames);
        Ok(RunSummary {
            frames: self.frames,
            final_state: self.state,
        })
    }

    fn step<C, D, K>(
        &mut self,
        capture: &mut C,
        sink: &mut D,
        control: &mut K,
        stats: &mut LoopStats,
    ) -> Result<()>
    where
        C: CaptureSource,
        D: DisplaySink + ?Sized,
        K: ControlSource + ?Sized,
    {
        let capture_start = Instant::now();
        let mut frame = capture
            .read_frame()?
            .ok_or(PipelineError::EndOfStream { frame: self.frames })?;
        stats.capture += capture_start.elapsed();

        if self.frames == 0 {
            log_frame_properties(&frame);
        }

        let outputs = self.context.process(&frame);
        stats.stages += outputs.timings;
        self.frames += 1;

        let output_start = Instant::now();
        stamp_frame_number(&mut frame, self.frames);
        sink.show(Window::Source, self.frames, &frame)?;
        sink.show(Window::CleanedMask, self.frames, &mask_to_rgb(&outputs.cleaned))?;
        sink.show(Window::Contours, self.frames, &outputs.overlay)?;
        stats.output += output_start.elapsed();

        stats.frames += 1;
        if self.config.stats_interval > 0 && stats.frames % self.config.stats_interval == 0 {
            stats.report();
        }

        match control.poll(self.config.wait) {
            Some(ControlEvent::Quit) => {
                tracing::info!("Quit requested");
                self.state = LoopState::Stopping;
            }
            Some(ControlEvent::SetEdgeThreshold(value)) => {
                self.context.parameters_mut().request_edge_threshold(value)
            }
            Some(ControlEvent::SetKernelSize(value)) => {
                self.context.parameters_mut().request_kernel_size(value)
            }
            None => {}
        }

        if self.config.max_frames.is_some_and(|max| self.frames >= max) {
            tracing::info!("Reached frame limit of {}", self.frames);
            self.state = LoopState::Stopping;
        }

        Ok(())
    }
}

fn log_frame_properties(frame: &Frame) {
    tracing::info!(
        width = frame.width(),
        height = frame.height(),
        channels = 3,
        depth = "u8",
        "First frame received"
    );
}
