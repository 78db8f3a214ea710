//! Play/pause state machine that keeps a single self-rescheduling draw chain.
//!
//! The chain is explicit: every scheduled tick is a [`FrameScheduler::request_frame`]
//! call and the host answers it by calling [`Loopable::tick`]. A tick checks
//! the run flag first, so a stop request takes effect on the very next tick
//! without drawing. `pending_tick` records whether a tick is already queued,
//! which is what keeps `run(true)` from ever starting a second chain.

use tracing::{debug, warn};

use crate::backend::FrameScheduler;
use crate::drawable::Drawable;
use crate::error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

impl LoopState {
    pub fn is_running(self) -> bool {
        matches!(self, LoopState::Running)
    }

    /// Label for a play/pause control: the action the control would perform.
    pub fn control_label(self) -> &'static str {
        match self {
            LoopState::Running => "pause",
            LoopState::Stopped => "play",
        }
    }
}

/// How a [`Loopable`] behaves when it is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopOptions {
    /// State the loop starts in. `Running` starts the chain right away.
    pub initial: LoopState,
    /// Draw one frame at construction even when starting stopped, so the
    /// surface shows the first frame while paused.
    pub draw_on_start: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            initial: LoopState::Stopped,
            draw_on_start: true,
        }
    }
}

/// Outcome of a single scheduled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn and another tick requested.
    Drew,
    /// The loop is stopped; the chain ended without drawing.
    Halted,
}

pub struct Loopable<D: Drawable, S: FrameScheduler> {
    drawable: D,
    scheduler: S,
    state: LoopState,
    pending_tick: bool,
}

impl<D: Drawable, S: FrameScheduler> Loopable<D, S> {
    pub fn new(drawable: D, scheduler: S, options: LoopOptions) -> Result<Self, RenderError> {
        let mut looper = Self {
            drawable,
            scheduler,
            state: LoopState::Stopped,
            pending_tick: false,
        };
        match options.initial {
            LoopState::Running => looper.run(true)?,
            LoopState::Stopped if options.draw_on_start => looper.drawable.draw()?,
            LoopState::Stopped => {}
        }
        Ok(looper)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// True while a scheduled tick has been requested but not yet delivered.
    pub fn has_pending_tick(&self) -> bool {
        self.pending_tick
    }

    pub fn drawable(&self) -> &D {
        &self.drawable
    }

    pub fn drawable_mut(&mut self) -> &mut D {
        &mut self.drawable
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Starts or stops the loop.
    ///
    /// Starting draws one frame synchronously and makes sure exactly one tick
    /// is queued; starting while running does nothing. Stopping only flips the
    /// flag and lets the queued tick halt the chain.
    pub fn run(&mut self, should_run: bool) -> Result<(), RenderError> {
        if !should_run {
            if self.state.is_running() {
                debug!("render loop stopping");
            }
            self.state = LoopState::Stopped;
            return Ok(());
        }
        if self.state.is_running() {
            return Ok(());
        }

        self.state = LoopState::Running;
        debug!(frame = self.drawable.frame(), "render loop starting");
        self.draw_and_reschedule()
    }

    /// Flips between running and stopped, returning the new running state.
    pub fn toggle(&mut self) -> Result<bool, RenderError> {
        self.run(!self.is_running())?;
        Ok(self.is_running())
    }

    /// Delivers a scheduled tick.
    pub fn tick(&mut self) -> Result<TickOutcome, RenderError> {
        self.pending_tick = false;
        if !self.state.is_running() {
            debug!("render loop halted");
            return Ok(TickOutcome::Halted);
        }
        self.draw_and_reschedule()?;
        Ok(TickOutcome::Drew)
    }

    /// Repaints the current frame after the host invalidated the surface.
    ///
    /// Only acts while stopped with no tick queued; a running chain repaints
    /// on its own. The frame counter is left untouched. Returns whether a
    /// repaint happened.
    pub fn refresh(&mut self) -> Result<bool, RenderError> {
        if self.state.is_running() || self.pending_tick {
            return Ok(false);
        }
        if let Err(err) = self.drawable.redraw() {
            warn!(error = %err, "repaint failed");
            return Err(err);
        }
        Ok(true)
    }

    fn draw_and_reschedule(&mut self) -> Result<(), RenderError> {
        if let Err(err) = self.drawable.draw() {
            warn!(error = %err, "draw failed; stopping render loop");
            self.state = LoopState::Stopped;
            return Err(err);
        }
        if !self.pending_tick {
            self.pending_tick = true;
            self.scheduler.request_frame();
        }
        Ok(())
    }
}
