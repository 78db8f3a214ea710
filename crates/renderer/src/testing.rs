//! In-memory backend that records every device, surface, and pass call.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::rc::Rc;

use crate::backend::{
    Acquired, ClearColor, ColorAttachment, CommandEncoder, FrameScheduler, GraphicsDevice,
    PresentableFrame, PrimitiveTopology, RenderPassRecorder, RenderPipelineDesc, ShaderStage,
    ShaderStages, ShaderUnit, Surface, SurfaceConfig, TextureUsages,
};
use crate::drawable::Drawable;
use crate::error::RenderError;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateLayout,
    CreatePipelineLayout,
    CreatePipeline,
    CreateBuffer { size: u64 },
    CreateBindGroup,
    WriteBuffer { buffer: u32, offset: u64, data: Vec<u8> },
    AcquireFrame,
    AcquireOutdated,
    BeginPass { clear: ClearColor },
    SetPipeline,
    SetBindGroup { index: u32 },
    Draw { vertices: Range<u32>, instances: Range<u32> },
    EndPass,
    Submit,
    Present,
}

type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeFormat {
    Unorm,
    Srgb,
}

#[derive(Debug)]
pub struct FakeBuffer {
    pub id: u32,
    pub size: u64,
}

#[derive(Debug)]
pub struct FakeLayout {
    pub visibility: ShaderStages,
}

#[derive(Debug)]
pub struct FakeBindGroup {
    pub buffer_id: u32,
}

#[derive(Debug)]
pub struct FakePipeline {
    pub topology: PrimitiveTopology,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub format: FakeFormat,
}

#[derive(Debug)]
pub struct FakeView;

pub struct FakeCommandBuffer;

#[derive(Default)]
pub struct FakeShader {
    entries: HashMap<String, ShaderStage>,
}

impl FakeShader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shader exposing `vertexMain` and `fragmentMain`.
    pub fn quad() -> Self {
        Self::new()
            .with_entry("vertexMain", ShaderStage::Vertex)
            .with_entry("fragmentMain", ShaderStage::Fragment)
    }

    pub fn with_entry(mut self, name: &str, stage: ShaderStage) -> Self {
        self.entries.insert(name.to_string(), stage);
        self
    }
}

impl ShaderUnit for FakeShader {
    fn entry_point(&self, name: &str) -> Option<ShaderStage> {
        self.entries.get(name).copied()
    }
}

pub struct FakeDevice {
    log: CallLog,
    next_id: Cell<u32>,
    lost: RefCell<Option<String>>,
    fault: RefCell<Option<String>>,
    reject_pipelines: Option<String>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            log: Rc::default(),
            next_id: Cell::new(1),
            lost: RefCell::new(None),
            fault: RefCell::new(None),
            reject_pipelines: None,
        }
    }

    pub fn rejecting_pipelines(mut self, message: &str) -> Self {
        self.reject_pipelines = Some(message.to_string());
        self
    }

    pub fn lose(&self, reason: &str) {
        *self.lost.borrow_mut() = Some(reason.to_string());
    }

    /// Queues an asynchronous GPU error; the next liveness check reports it once.
    pub fn fault(&self, message: &str) {
        *self.fault.borrow_mut() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    /// Frame numbers written to uniform buffers, in upload order.
    pub fn uploaded_frames(&self) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::WriteBuffer { data, .. } => {
                    let bytes: [u8; 4] = data.as_slice().try_into().ok()?;
                    Some(u32::from_le_bytes(bytes))
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl GraphicsDevice for FakeDevice {
    type Format = FakeFormat;
    type Shader = FakeShader;
    type Buffer = FakeBuffer;
    type BindGroupLayout = FakeLayout;
    type BindGroup = FakeBindGroup;
    type PipelineLayout = ();
    type RenderPipeline = FakePipeline;
    type TextureView = FakeView;
    type CommandBuffer = FakeCommandBuffer;
    type Encoder = FakeEncoder;

    fn create_uniform_buffer(&self, _label: &str, size: u64) -> FakeBuffer {
        self.record(Call::CreateBuffer { size });
        FakeBuffer {
            id: self.next_id(),
            size,
        }
    }

    fn create_uniform_layout(&self, _label: &str, visibility: ShaderStages) -> FakeLayout {
        self.record(Call::CreateLayout);
        FakeLayout { visibility }
    }

    fn create_pipeline_layout(&self, _label: &str, _layouts: &[&FakeLayout]) {
        self.record(Call::CreatePipelineLayout);
    }

    fn create_render_pipeline(
        &self,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<FakePipeline, RenderError> {
        if let Some(message) = &self.reject_pipelines {
            return Err(RenderError::PipelineCompilation(message.clone()));
        }
        self.record(Call::CreatePipeline);
        Ok(FakePipeline {
            topology: desc.topology,
            vertex_entry: desc.vertex_entry.to_string(),
            fragment_entry: desc.fragment_entry.to_string(),
            format: desc.target_format,
        })
    }

    fn create_uniform_bind_group(
        &self,
        _label: &str,
        _layout: &FakeLayout,
        buffer: &FakeBuffer,
    ) -> FakeBindGroup {
        self.record(Call::CreateBindGroup);
        FakeBindGroup { buffer_id: buffer.id }
    }

    fn write_buffer(&self, buffer: &FakeBuffer, offset: u64, data: &[u8]) {
        self.record(Call::WriteBuffer {
            buffer: buffer.id,
            offset,
            data: data.to_vec(),
        });
    }

    fn create_command_encoder(&self, _label: &str) -> FakeEncoder {
        FakeEncoder {
            log: self.log.clone(),
        }
    }

    fn submit(&self, _commands: FakeCommandBuffer) {
        self.record(Call::Submit);
    }

    fn ensure_alive(&self) -> Result<(), RenderError> {
        if let Some(reason) = self.lost.borrow().as_ref() {
            return Err(RenderError::DeviceLost(reason.clone()));
        }
        match self.fault.borrow_mut().take() {
            Some(message) => Err(RenderError::GpuFault(message)),
            None => Ok(()),
        }
    }
}

pub struct FakeEncoder {
    log: CallLog,
}

impl CommandEncoder<FakeDevice> for FakeEncoder {
    fn record_pass(
        &mut self,
        _label: &str,
        attachment: ColorAttachment<'_, FakeView>,
        record: &mut dyn FnMut(&mut dyn RenderPassRecorder<FakeDevice>),
    ) {
        self.log.borrow_mut().push(Call::BeginPass {
            clear: attachment.clear,
        });
        let mut pass = FakePass {
            log: self.log.clone(),
        };
        record(&mut pass);
        self.log.borrow_mut().push(Call::EndPass);
    }

    fn finish(self) -> FakeCommandBuffer {
        FakeCommandBuffer
    }
}

struct FakePass {
    log: CallLog,
}

impl RenderPassRecorder<FakeDevice> for FakePass {
    fn set_pipeline(&mut self, _pipeline: &FakePipeline) {
        self.log.borrow_mut().push(Call::SetPipeline);
    }

    fn set_bind_group(&mut self, index: u32, _group: &FakeBindGroup) {
        self.log.borrow_mut().push(Call::SetBindGroup { index });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.log
            .borrow_mut()
            .push(Call::Draw { vertices, instances });
    }
}

/// Scripted answer for one `FakeSurface::acquire` call.
#[derive(Clone, Debug)]
pub enum FakeAcquire {
    Frame,
    Outdated,
    /// The device is lost while the frame is being acquired.
    LoseDevice(&'static str),
}

pub struct FakeSurface {
    size: (u32, u32),
    formats: Vec<FakeFormat>,
    usages: TextureUsages,
    script: VecDeque<FakeAcquire>,
    configs: Vec<SurfaceConfig<FakeFormat>>,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            formats: vec![FakeFormat::Unorm],
            usages: TextureUsages::all(),
            script: VecDeque::new(),
            configs: Vec::new(),
        }
    }

    pub fn with_usages(mut self, usages: TextureUsages) -> Self {
        self.usages = usages;
        self
    }

    /// Answers for the next acquisitions; once exhausted every call yields a frame.
    pub fn with_acquire_script(mut self, script: Vec<FakeAcquire>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_formats(mut self, formats: Vec<FakeFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn configure_count(&self) -> usize {
        self.configs.len()
    }

    pub fn last_config(&self) -> Option<&SurfaceConfig<FakeFormat>> {
        self.configs.last()
    }
}

impl Surface<FakeDevice> for FakeSurface {
    type Frame = FakeFrame;

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn supported_formats(&self, _device: &FakeDevice) -> Vec<FakeFormat> {
        self.formats.clone()
    }

    fn is_srgb(&self, format: FakeFormat) -> bool {
        format == FakeFormat::Srgb
    }

    fn supported_usages(&self, _device: &FakeDevice) -> TextureUsages {
        self.usages
    }

    fn configure(
        &mut self,
        _device: &FakeDevice,
        config: &SurfaceConfig<FakeFormat>,
    ) -> Result<(), RenderError> {
        self.size = (config.width, config.height);
        self.configs.push(config.clone());
        Ok(())
    }

    fn acquire(&mut self, device: &FakeDevice) -> Result<Acquired<FakeFrame>, RenderError> {
        match self.script.pop_front().unwrap_or(FakeAcquire::Frame) {
            FakeAcquire::Outdated => {
                device.record(Call::AcquireOutdated);
                return Ok(Acquired::Outdated);
            }
            FakeAcquire::LoseDevice(reason) => device.lose(reason),
            FakeAcquire::Frame => {}
        }
        device.ensure_alive()?;
        device.record(Call::AcquireFrame);
        Ok(Acquired::Frame(FakeFrame {
            log: device.log.clone(),
            view: FakeView,
        }))
    }
}

pub struct FakeFrame {
    log: CallLog,
    view: FakeView,
}

impl PresentableFrame for FakeFrame {
    type View = FakeView;

    fn view(&self) -> &FakeView {
        &self.view
    }

    fn present(self) {
        self.log.borrow_mut().push(Call::Present);
    }
}

/// Shared, ordered record of drawable and scheduler events.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<&'static str>>>);

impl EventLog {
    fn push(&self, event: &'static str) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}

#[derive(Default)]
pub struct CountingDrawable {
    frames: u32,
    redraws: u32,
    failure: Option<RenderError>,
    log: Option<EventLog>,
}

impl CountingDrawable {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn redraws(&self) -> u32 {
        self.redraws
    }

    /// Makes the next draw fail with `err`.
    pub fn fail_with(&mut self, err: RenderError) {
        self.failure = Some(err);
    }
}

impl Drawable for CountingDrawable {
    fn draw(&mut self) -> Result<(), RenderError> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        self.frames = self.frames.wrapping_add(1);
        if let Some(log) = &self.log {
            log.push("draw");
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        self.redraws += 1;
        if let Some(log) = &self.log {
            log.push("redraw");
        }
        Ok(())
    }

    fn frame(&self) -> u32 {
        self.frames
    }
}

#[derive(Default)]
pub struct ManualScheduler {
    requests: usize,
    log: Option<EventLog>,
}

impl ManualScheduler {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            requests: 0,
            log: Some(log),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.requests += 1;
        if let Some(log) = &self.log {
            log.push("request_frame");
        }
    }
}
