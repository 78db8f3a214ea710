use tracing::debug;

use crate::backend::{
    Acquired, GraphicsDevice, PresentableFrame, Surface, SurfaceConfig, TextureUsages,
};
use crate::error::RenderError;

use super::context::WgpuDevice;

/// A window surface and its last known size.
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    size: (u32, u32),
}

impl WgpuSurface {
    pub(crate) fn new(surface: wgpu::Surface<'static>, size: (u32, u32)) -> Self {
        Self { surface, size }
    }
}

fn from_wgpu_usages(usage: wgpu::TextureUsages) -> TextureUsages {
    let mut mapped = TextureUsages::empty();
    if usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
        mapped |= TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.contains(wgpu::TextureUsages::COPY_DST) {
        mapped |= TextureUsages::COPY_DST;
    }
    if usage.contains(wgpu::TextureUsages::COPY_SRC) {
        mapped |= TextureUsages::COPY_SRC;
    }
    mapped
}

fn texture_usages(usage: TextureUsages) -> wgpu::TextureUsages {
    let mut mapped = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsages::RENDER_ATTACHMENT) {
        mapped |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.contains(TextureUsages::COPY_DST) {
        mapped |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsages::COPY_SRC) {
        mapped |= wgpu::TextureUsages::COPY_SRC;
    }
    mapped
}

impl Surface<WgpuDevice> for WgpuSurface {
    type Frame = WgpuFrame;

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn supported_formats(&self, device: &WgpuDevice) -> Vec<wgpu::TextureFormat> {
        self.surface.get_capabilities(&device.adapter).formats
    }

    fn is_srgb(&self, format: wgpu::TextureFormat) -> bool {
        format.is_srgb()
    }

    fn supported_usages(&self, device: &WgpuDevice) -> TextureUsages {
        from_wgpu_usages(self.surface.get_capabilities(&device.adapter).usages)
    }

    fn configure(
        &mut self,
        device: &WgpuDevice,
        config: &SurfaceConfig<wgpu::TextureFormat>,
    ) -> Result<(), RenderError> {
        let caps = self.surface.get_capabilities(&device.adapter);
        let usage = texture_usages(config.usage);
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            caps.present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage,
            format: config.format,
            width: config.width.max(1),
            height: config.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        self.surface.configure(&device.device, &surface_config);
        self.size = (surface_config.width, surface_config.height);
        debug!(?present_mode, ?alpha_mode, "applied surface configuration");
        Ok(())
    }

    fn acquire(&mut self, device: &WgpuDevice) -> Result<Acquired<WgpuFrame>, RenderError> {
        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                return Ok(Acquired::Outdated);
            }
            Err(err) => {
                device.ensure_alive()?;
                return Err(RenderError::SurfaceUnavailable(err.to_string()));
            }
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Acquired::Frame(WgpuFrame { texture, view }))
    }
}

/// The current swapchain texture and a view onto it.
pub struct WgpuFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl PresentableFrame for WgpuFrame {
    type View = wgpu::TextureView;

    fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    fn present(self) {
        self.texture.present();
    }
}
