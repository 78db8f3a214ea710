/// Failures surfaced by the surface configurator, pipeline builder, and frame
/// executor.
///
/// Construction-time variants abort startup before any loop state exists.
/// Mid-session the executor reports `DeviceLost`, `GpuFault`, or
/// `SurfaceUnavailable`; any of them stops the loop controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible graphics backend available: {0}")]
    NoDeviceCapability(String),
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("pipeline compilation failed: {0}")]
    PipelineCompilation(String),
    #[error("graphics device lost: {0}")]
    DeviceLost(String),
    #[error("GPU reported an error outside any error scope: {0}")]
    GpuFault(String),
}

impl RenderError {
    /// True for errors that leave the device unusable for the rest of the session.
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(self, RenderError::DeviceLost(_))
    }
}
