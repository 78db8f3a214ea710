//! Render-loop core for the wgslplay demo.
//!
//! The crate turns a compiled shader into a full-screen quad renderer and
//! drives it with a play/pause loop:
//!
//! ```text
//!   surface::configure ──▶ pipeline::build_pipeline ──▶ FrameExecutor::draw
//!                                                             ▲
//!   UI toggle ──▶ Loopable::run / toggle ──▶ FrameScheduler ──┘ (tick)
//! ```
//!
//! Everything above is written against the traits in [`backend`]; the `wgpu`
//! implementation lives in [`gpu`]. The host event loop owns the scheduling
//! primitive: it calls [`Loopable::tick`] whenever a requested frame arrives.

pub mod backend;
mod drawable;
mod error;
pub mod gpu;
mod loop_controller;
mod pipeline;
mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    Acquired, ClearColor, FrameScheduler, GraphicsDevice, ShaderStage, ShaderStages, ShaderUnit,
    Surface, SurfaceConfig, TextureUsages,
};
pub use drawable::{Drawable, FrameCounter, FrameExecutor};
pub use error::RenderError;
pub use loop_controller::{LoopOptions, LoopState, Loopable, TickOutcome};
pub use pipeline::{
    build_pipeline, PipelineState, FRAGMENT_ENTRY, QUAD_VERTEX_COUNT, UNIFORM_BUFFER_SIZE,
    VERTEX_ENTRY,
};
pub use surface::{configure, surface_usage, SurfaceBinding};

/// Configures `surface` and builds the quad pipeline for `shader`, returning
/// a frame executor that starts counting at `start_frame`.
///
/// Nothing is returned on failure, so a rejected shader never reaches a loop.
pub fn setup_renderer<D, S>(
    device: D,
    surface: S,
    shader: &D::Shader,
    debug: bool,
    start_frame: u32,
) -> Result<FrameExecutor<D, S>, RenderError>
where
    D: GraphicsDevice,
    S: Surface<D>,
{
    let binding = configure(&device, surface, debug)?;
    let state = build_pipeline(&device, shader, binding.format())?;
    Ok(FrameExecutor::with_start_frame(
        device,
        binding,
        state,
        start_frame,
    ))
}
