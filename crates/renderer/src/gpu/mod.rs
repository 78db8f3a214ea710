//! `wgpu` implementation of the backend traits.
//!
//! - `context` acquires the instance, adapter, device, and surface, and
//!   watches for device loss.
//! - `device` maps buffers, layouts, pipelines, and command recording onto
//!   `wgpu` calls.
//! - `surface` configures the swapchain and hands out one frame per draw,
//!   reconfiguring once when the swapchain reports itself outdated.
//! - `shader` compiles WGSL and indexes its entry points with `naga`.

mod context;
mod device;
mod shader;
mod surface;

pub use context::{acquire, AdapterProfile, PowerPreference, WgpuDevice};
pub use device::WgpuEncoder;
pub use shader::{entry_points, WgpuShader};
pub use surface::{WgpuFrame, WgpuSurface};
