use tracing::debug;

use crate::backend::{
    ClearColor, ColorAttachment, CommandEncoder, GraphicsDevice, PresentableFrame,
    RenderPassRecorder, Surface,
};
use crate::error::RenderError;
use crate::pipeline::{PipelineState, QUAD_VERTEX_COUNT};
use crate::surface::SurfaceBinding;

const FRAME_LOG_INTERVAL: u32 = 120;

/// Something that renders one frame per call.
pub trait Drawable {
    fn draw(&mut self) -> Result<(), RenderError>;

    /// Repaints the most recent frame without advancing the frame number,
    /// for targets whose contents were invalidated while paused.
    fn redraw(&mut self) -> Result<(), RenderError>;

    /// Frame number the next `draw` will upload.
    fn frame(&self) -> u32;
}

/// Frame number uploaded to the shader. Wraps to zero after `u32::MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter(u32);

impl FrameCounter {
    pub fn new(start: u32) -> Self {
        Self(start)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns the current value and moves to the next one.
    pub fn advance(&mut self) -> u32 {
        let current = self.0;
        self.0 = current.wrapping_add(1);
        current
    }

    /// Uniform buffer contents for `frame`.
    pub fn encode(frame: u32) -> [u8; 4] {
        frame.to_le_bytes()
    }
}

/// Draws the full-screen quad into the bound surface, one frame per call.
pub struct FrameExecutor<D: GraphicsDevice, S: Surface<D>> {
    device: D,
    binding: SurfaceBinding<D, S>,
    state: PipelineState<D>,
    counter: FrameCounter,
    last_frame: Option<u32>,
}

impl<D: GraphicsDevice, S: Surface<D>> FrameExecutor<D, S> {
    pub fn new(device: D, binding: SurfaceBinding<D, S>, state: PipelineState<D>) -> Self {
        Self::with_start_frame(device, binding, state, 0)
    }

    pub fn with_start_frame(
        device: D,
        binding: SurfaceBinding<D, S>,
        state: PipelineState<D>,
        start: u32,
    ) -> Self {
        Self {
            device,
            binding,
            state,
            counter: FrameCounter::new(start),
            last_frame: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn binding(&self) -> &SurfaceBinding<D, S> {
        &self.binding
    }

    pub fn pipeline_state(&self) -> &PipelineState<D> {
        &self.state
    }

    /// Forwards a window resize to the surface binding.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.binding.resize(&self.device, width, height)
    }
}

impl<D: GraphicsDevice, S: Surface<D>> FrameExecutor<D, S> {
    fn render(&mut self, frame_number: u32) -> Result<(), RenderError> {
        let uniform = FrameCounter::encode(frame_number);
        self.device
            .write_buffer(&self.state.uniform_buffer, 0, &uniform);

        let frame = self.binding.acquire(&self.device)?;
        let mut encoder = self.device.create_command_encoder("frame encoder");
        let state = &self.state;
        encoder.record_pass(
            "quad pass",
            ColorAttachment {
                view: frame.view(),
                clear: ClearColor::TRANSPARENT,
            },
            &mut |pass: &mut dyn RenderPassRecorder<D>| {
                pass.set_pipeline(&state.pipeline);
                pass.set_bind_group(0, &state.uniform_bind_group);
                pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
            },
        );
        self.device.submit(encoder.finish());
        frame.present();
        Ok(())
    }
}

impl<D: GraphicsDevice, S: Surface<D>> Drawable for FrameExecutor<D, S> {
    fn draw(&mut self) -> Result<(), RenderError> {
        self.device.ensure_alive()?;

        let frame_number = self.counter.advance();
        self.last_frame = Some(frame_number);
        self.render(frame_number)?;

        if frame_number % FRAME_LOG_INTERVAL == 0 {
            debug!(frame = frame_number, "drew frame");
        }
        Ok(())
    }

    /// Before the first draw this paints the upcoming frame number, which the
    /// next `draw` then uploads again.
    fn redraw(&mut self) -> Result<(), RenderError> {
        self.device.ensure_alive()?;
        let frame_number = self.last_frame.unwrap_or(self.counter.value());
        self.render(frame_number)?;
        debug!(frame = frame_number, "repainted frame");
        Ok(())
    }

    fn frame(&self) -> u32 {
        self.counter.value()
    }
}
