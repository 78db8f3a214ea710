use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use renderer::gpu::{self, WgpuDevice, WgpuShader, WgpuSurface};
use renderer::{
    setup_renderer, Drawable, FrameExecutor, FrameScheduler, LoopState, Loopable, RenderError,
    TickOutcome,
};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::config::Settings;
use crate::{panel, shaders};

type DemoLoop = Loopable<FrameExecutor<WgpuDevice, WgpuSurface>, RedrawScheduler>;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Answers tick requests with a winit redraw; the matching
/// `RedrawRequested` event becomes [`Loopable::tick`].
pub struct RedrawScheduler {
    window: Arc<Window>,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Exit,
}

pub fn action_for_key(key: &Key) -> Option<Action> {
    match key {
        Key::Named(NamedKey::Space) => Some(Action::Toggle),
        Key::Character(value) if value.as_str() == " " => Some(Action::Toggle),
        Key::Named(NamedKey::Escape) => Some(Action::Exit),
        _ => None,
    }
}

pub fn window_title(state: LoopState) -> String {
    let status = if state.is_running() { "playing" } else { "paused" };
    format!("wgslplay ({status}) - space to {}", state.control_label())
}

pub fn run(settings: Settings) -> Result<()> {
    let linked = shaders::load(&settings.origin, &settings.root)?;
    if settings.print_source {
        print!("{}", panel::render(&linked));
    }

    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let (width, height) = settings.size;
    let window = WindowBuilder::new()
        .with_title(window_title(settings.loop_options.initial))
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let (device, surface) = gpu::acquire(window.clone(), settings.size, settings.power)
        .context("failed to acquire GPU device")?;
    tracing::info!(
        adapter = %device.profile().name,
        backend = ?device.profile().backend,
        "GPU ready"
    );
    let shader = WgpuShader::compile(&device, &settings.root, &linked.linked)
        .context("failed to compile linked shader")?;
    let executor = setup_renderer(
        device,
        surface,
        &shader,
        settings.debug_surface,
        settings.start_frame,
    )
    .context("failed to build render pipeline")?;

    let scheduler = RedrawScheduler {
        window: window.clone(),
    };
    let mut looper: DemoLoop = Loopable::new(executor, scheduler, settings.loop_options)
        .context("failed to draw the first frame")?;
    window.set_title(&window_title(looper.state()));
    tracing::info!(
        state = ?looper.state(),
        frame = looper.drawable().frame(),
        "render loop ready; space or left click toggles playback"
    );

    let mut fatal: Option<RenderError> = None;
    let run_result = event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        let Event::WindowEvent { window_id, event } = event else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        let outcome = match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
                Ok(())
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match action_for_key(&event.logical_key) {
                    Some(Action::Toggle) => toggle(&mut looper, &window),
                    Some(Action::Exit) => {
                        elwt.exit();
                        Ok(())
                    }
                    None => Ok(()),
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => toggle(&mut looper, &window),
            WindowEvent::Resized(size) => looper
                .drawable_mut()
                .resize(size.width, size.height)
                .map(|()| {
                    if !looper.is_running() {
                        window.request_redraw();
                    }
                }),
            WindowEvent::RedrawRequested if looper.has_pending_tick() => {
                looper.tick().map(|outcome| {
                    if outcome == TickOutcome::Halted {
                        tracing::debug!(frame = looper.drawable().frame(), "render loop idle");
                    }
                })
            }
            WindowEvent::RedrawRequested => looper.refresh().map(|_| ()),
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            window.set_title(&window_title(looper.state()));
            if err.is_fatal_for_session() {
                tracing::error!(error = %err, "rendering cannot continue; exiting");
                fatal = Some(err);
                elwt.exit();
            } else {
                tracing::error!(error = %err, "frame failed; playback paused");
            }
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    match fatal {
        Some(err) => Err(anyhow::Error::new(err).context("render loop aborted")),
        None => Ok(()),
    }
}

fn toggle(looper: &mut DemoLoop, window: &Window) -> Result<(), RenderError> {
    let result = looper.toggle();
    window.set_title(&window_title(looper.state()));
    let running = result?;
    tracing::info!(running, frame = looper.drawable().frame(), "playback toggled");
    Ok(())
}
