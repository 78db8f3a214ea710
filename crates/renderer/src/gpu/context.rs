use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::error::RenderError;

use super::surface::WgpuSurface;

/// Adapter preference forwarded to `wgpu::RequestAdapterOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    Low,
    #[default]
    High,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(value: PowerPreference) -> Self {
        match value {
            PowerPreference::Low => wgpu::PowerPreference::LowPower,
            PowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Summary of the adapter the device was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub driver: String,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            driver: info.driver.clone(),
        }
    }

    /// True for CPU rasterizers such as llvmpipe or WARP.
    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Failures `wgpu` reports through callbacks rather than return values.
///
/// Device loss is sticky. An uncaptured error is reported once, by the next
/// check, so the draw that follows it fails instead of rendering on.
#[derive(Clone, Default)]
pub(crate) struct DeviceHealth {
    lost: Arc<Mutex<Option<String>>>,
    fault: Arc<Mutex<Option<String>>>,
}

impl DeviceHealth {
    pub(crate) fn mark_lost(&self, reason: String) {
        let mut slot = lock(&self.lost);
        if slot.is_none() {
            *slot = Some(reason);
        }
    }

    /// Keeps the first fault until it has been reported.
    pub(crate) fn record_fault(&self, message: String) {
        let mut slot = lock(&self.fault);
        if slot.is_none() {
            *slot = Some(message);
        }
    }

    pub(crate) fn check(&self) -> Result<(), RenderError> {
        if let Some(reason) = lock(&self.lost).clone() {
            return Err(RenderError::DeviceLost(reason));
        }
        match lock(&self.fault).take() {
            Some(message) => Err(RenderError::GpuFault(message)),
            None => Ok(()),
        }
    }
}

fn lock(slot: &Mutex<Option<String>>) -> MutexGuard<'_, Option<String>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A `wgpu` device and queue plus the adapter they came from.
///
/// Device-lost and uncaptured-error callbacks feed a shared health record so later
/// draws report [`RenderError::DeviceLost`] or [`RenderError::GpuFault`]
/// instead of failing silently.
pub struct WgpuDevice {
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    profile: AdapterProfile,
    pub(crate) health: DeviceHealth,
}

impl WgpuDevice {
    pub fn profile(&self) -> &AdapterProfile {
        &self.profile
    }
}

/// Creates the instance, surface, adapter, and device for `target`.
///
/// Blocks on the asynchronous adapter and device requests. Fails with
/// [`RenderError::NoDeviceCapability`] when no adapter can present to the
/// target, and [`RenderError::SurfaceUnavailable`] when the target cannot be
/// turned into a surface at all.
pub fn acquire(
    target: impl Into<wgpu::SurfaceTarget<'static>>,
    size: (u32, u32),
    power: PowerPreference,
) -> Result<(WgpuDevice, WgpuSurface), RenderError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let surface = instance
        .create_surface(target)
        .map_err(|err| RenderError::SurfaceUnavailable(err.to_string()))?;

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: power.into(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .map_err(|err| RenderError::NoDeviceCapability(format!("no suitable GPU adapter: {err}")))?;

    let profile = AdapterProfile::from_wgpu(&adapter.get_info());
    debug!(
        name = %profile.name,
        backend = ?profile.backend,
        device_type = ?profile.device_type,
        driver = %profile.driver,
        "selected GPU adapter"
    );
    if profile.is_software() {
        warn!(adapter = %profile.name, "software rasterizer selected; expect low frame rates");
    }

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("wgslplay device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_webgl2_defaults()
            .using_resolution(adapter.limits()),
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::default(),
    }))
    .map_err(|err| RenderError::NoDeviceCapability(format!("failed to create GPU device: {err}")))?;

    let health = DeviceHealth::default();
    let lost = health.clone();
    device.set_device_lost_callback(move |reason, message| {
        error!(?reason, %message, "GPU device lost");
        lost.mark_lost(format!("{reason:?}: {message}"));
    });
    let faults = health.clone();
    device.on_uncaptured_error(Box::new(move |err| {
        error!(error = %err, "uncaptured GPU error");
        faults.record_fault(err.to_string());
    }));

    let surface = WgpuSurface::new(surface, size);
    Ok((
        WgpuDevice {
            adapter,
            device,
            queue,
            profile,
            health,
        },
        surface,
    ))
}
