use std::borrow::Cow;
use std::collections::HashMap;

use tracing::debug;

use crate::backend::{ShaderStage, ShaderUnit};
use crate::error::RenderError;

use super::context::WgpuDevice;

/// A WGSL module compiled for a [`WgpuDevice`], with its entry points indexed.
pub struct WgpuShader {
    module: wgpu::ShaderModule,
    entry_points: HashMap<String, ShaderStage>,
}

impl WgpuShader {
    /// Parses `source` to discover entry points, then creates the shader module.
    ///
    /// Parse and validation failures become [`RenderError::PipelineCompilation`]
    /// carrying the rendered diagnostic.
    pub fn compile(device: &WgpuDevice, label: &str, source: &str) -> Result<Self, RenderError> {
        let entry_points = entry_points(source)?;

        device
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });
        if let Some(err) = pollster::block_on(device.device.pop_error_scope()) {
            return Err(RenderError::PipelineCompilation(err.to_string()));
        }

        debug!(
            label,
            entry_points = entry_points.len(),
            "compiled shader module"
        );
        Ok(Self {
            module,
            entry_points,
        })
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}

impl ShaderUnit for WgpuShader {
    fn entry_point(&self, name: &str) -> Option<ShaderStage> {
        self.entry_points.get(name).copied()
    }
}

/// Entry point names and stages declared by a WGSL source.
pub fn entry_points(source: &str) -> Result<HashMap<String, ShaderStage>, RenderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| RenderError::PipelineCompilation(err.emit_to_string(source)))?;
    Ok(module
        .entry_points
        .iter()
        .map(|entry| {
            let stage = match entry.stage {
                naga::ShaderStage::Vertex => ShaderStage::Vertex,
                naga::ShaderStage::Fragment => ShaderStage::Fragment,
                _ => ShaderStage::Compute,
            };
            (entry.name.clone(), stage)
        })
        .collect())
}
