use tracing::{debug, warn};

use crate::backend::{Acquired, GraphicsDevice, Surface, SurfaceConfig, TextureUsages};
use crate::error::RenderError;

/// A surface bound to a device with its presentation configuration.
///
/// The binding owns the surface so the frame executor can acquire one frame
/// per draw. Reconfiguring (via [`configure`] or [`SurfaceBinding::resize`])
/// replaces the previous configuration.
pub struct SurfaceBinding<D: GraphicsDevice, S: Surface<D>> {
    surface: S,
    config: SurfaceConfig<D::Format>,
}

impl<D: GraphicsDevice, S: Surface<D>> SurfaceBinding<D, S> {
    pub fn config(&self) -> &SurfaceConfig<D::Format> {
        &self.config
    }

    pub fn format(&self) -> D::Format {
        self.config.format
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// True when the configuration allows pixel readback from presented frames.
    pub fn readback_enabled(&self) -> bool {
        self.config.usage.contains(TextureUsages::COPY_SRC)
    }

    /// Applies a new size, keeping format and usage. Zero-sized requests are
    /// ignored (minimised windows report them).
    pub fn resize(&mut self, device: &D, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if (self.config.width, self.config.height) == (width, height) {
            return Ok(());
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config)?;
        debug!(width, height, "reconfigured surface");
        Ok(())
    }

    /// Acquires the next frame. A stale swapchain is reconfigured once with
    /// the current configuration and re-acquired; a second stale answer is
    /// [`RenderError::SurfaceUnavailable`].
    pub(crate) fn acquire(&mut self, device: &D) -> Result<S::Frame, RenderError> {
        if let Acquired::Frame(frame) = self.surface.acquire(device)? {
            return Ok(frame);
        }

        warn!("swapchain outdated; reconfiguring before acquiring again");
        device.ensure_alive()?;
        self.surface.configure(device, &self.config)?;
        match self.surface.acquire(device)? {
            Acquired::Frame(frame) => Ok(frame),
            Acquired::Outdated => Err(RenderError::SurfaceUnavailable(
                "swapchain still outdated after reconfiguration".to_string(),
            )),
        }
    }
}

/// Texture usages for a presentation surface; `debug` adds readback.
pub fn surface_usage(debug: bool) -> TextureUsages {
    let mut usage = TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_DST;
    if debug {
        usage |= TextureUsages::COPY_SRC;
    }
    usage
}

/// Configures `surface` for `device` using the backend's preferred
/// presentation format.
///
/// Usage requests render-attachment and copy-destination; `debug`
/// additionally requests copy-source so frames can be read back. Requested
/// usages the surface cannot offer are dropped with a warning, except
/// render-attachment, without which the surface is unavailable.
pub fn configure<D, S>(device: &D, mut surface: S, debug: bool) -> Result<SurfaceBinding<D, S>, RenderError>
where
    D: GraphicsDevice,
    S: Surface<D>,
{
    let format = preferred_format(device, &surface)?;
    let usage = negotiate_usage(surface_usage(debug), surface.supported_usages(device))?;
    let (width, height) = surface.size();
    let config = SurfaceConfig {
        format,
        usage,
        width: width.max(1),
        height: height.max(1),
    };
    surface.configure(device, &config)?;
    debug!(
        ?format,
        width = config.width,
        height = config.height,
        readback = usage.contains(TextureUsages::COPY_SRC),
        "configured presentation surface"
    );
    Ok(SurfaceBinding { surface, config })
}

fn negotiate_usage(
    requested: TextureUsages,
    supported: TextureUsages,
) -> Result<TextureUsages, RenderError> {
    if !supported.contains(TextureUsages::RENDER_ATTACHMENT) {
        return Err(RenderError::SurfaceUnavailable(format!(
            "surface cannot be rendered to (supports {supported:?})"
        )));
    }
    let usage = requested & supported;
    if usage != requested {
        warn!(
            ?requested,
            ?supported,
            "surface lacks some requested usages; continuing without them"
        );
    }
    Ok(usage)
}

/// Picks the first non-sRGB format the surface offers, falling back to the
/// first format when every option is sRGB. Shaders write gamma-encoded values.
fn preferred_format<D, S>(device: &D, surface: &S) -> Result<D::Format, RenderError>
where
    D: GraphicsDevice,
    S: Surface<D>,
{
    let formats = surface.supported_formats(device);
    let fallback = formats.first().copied().ok_or_else(|| {
        RenderError::SurfaceUnavailable("surface reports no supported formats".to_string())
    })?;
    Ok(formats
        .iter()
        .copied()
        .find(|format| !surface.is_srgb(*format))
        .unwrap_or(fallback))
}
