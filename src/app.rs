//! Application event loop
//!
//! Startup runs in a fixed order: window, GPU context, shader program, vertex
//! upload. Any failure is reported once and the frame loop never starts.
//! After that the app only reacts to the scheduler, resizes and close requests.

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    window::WindowId,
};
use web_time::Instant;

use octagon_render::{
    shader::load_program, ContextError, FrameDriver, RenderContext, ShaderError,
    ShaderSourceProvider, VertexData,
};

use crate::config::AppConfig;
use crate::systems::{FrameScheduler, RenderError, RenderSystem, WindowError, WindowSystem};

#[cfg(target_arch = "wasm32")]
type ContextReceiver = futures::channel::oneshot::Receiver<Result<RenderContext, ContextError>>;

/// Anything that stops the app from reaching its first frame
#[derive(Debug)]
pub enum InitError {
    Window(WindowError),
    Context(ContextError),
    Shader(ShaderError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::Window(e) => write!(f, "{}", e),
            InitError::Context(e) => write!(f, "{}", e),
            InitError::Shader(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Window(e) => Some(e),
            InitError::Context(e) => Some(e),
            InitError::Shader(e) => Some(e),
        }
    }
}

impl From<WindowError> for InitError {
    fn from(e: WindowError) -> Self {
        InitError::Window(e)
    }
}

impl From<ContextError> for InitError {
    fn from(e: ContextError) -> Self {
        InitError::Context(e)
    }
}

impl From<ShaderError> for InitError {
    fn from(e: ShaderError) -> Self {
        InitError::Shader(e)
    }
}

/// Tell the user that startup failed
///
/// In the browser this is a blocking alert; natively it is an error log.
pub fn report_fatal(error: &InitError) {
    log::error!("{}", error);
    #[cfg(target_arch = "wasm32")]
    crate::web::alert(&error.to_string());
}

#[cfg(not(target_arch = "wasm32"))]
fn shader_sources() -> Result<Box<dyn ShaderSourceProvider>, ShaderError> {
    Ok(Box::new(octagon_render::EmbeddedShaders::octagon()))
}

#[cfg(target_arch = "wasm32")]
fn shader_sources() -> Result<Box<dyn ShaderSourceProvider>, ShaderError> {
    crate::web::DocumentShaders::current()
        .map(|shaders| Box::new(shaders) as Box<dyn ShaderSourceProvider>)
        .ok_or_else(|| ShaderError::NotFound("document".to_string()))
}

/// Main application state
pub struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    driver: Option<FrameDriver>,
    scheduler: FrameScheduler,
    /// Set once startup failed; nothing is retried
    failed: bool,
    #[cfg(target_arch = "wasm32")]
    context_receiver: Option<ContextReceiver>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let scheduler = FrameScheduler::from_millis(
            config.animation.initial_delay_ms,
            config.animation.frame_delay_ms,
        );
        Self {
            config,
            window: None,
            render: None,
            driver: None,
            scheduler,
            failed: false,
            #[cfg(target_arch = "wasm32")]
            context_receiver: None,
        }
    }

    /// Whether frames are being produced
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: InitError) {
        report_fatal(&error);
        self.failed = true;
        self.scheduler.stop();
        event_loop.exit();
    }

    /// Link the program, upload the mesh and start the frame loop
    fn finish_init(&mut self, context: RenderContext) -> Result<(), InitError> {
        log::info!("Graphics context ready ({}x{})", context.size.width, context.size.height);

        let sources = shader_sources()?;
        let program = load_program(
            sources.as_ref(),
            &self.config.shaders.vertex_id,
            &self.config.shaders.fragment_id,
        )?;

        let vertices = VertexData::octagon();
        program.check_vertex_data(&vertices).map_err(ShaderError::from)?;
        let driver = FrameDriver::new(program, vertices, self.config.to_frame_settings());
        let topology = driver.draw_call().topology;
        let render = RenderSystem::new(context, driver.program(), driver.vertices(), topology)?;

        self.driver = Some(driver);
        self.render = Some(render);
        self.scheduler.start(Instant::now());
        Ok(())
    }

    fn draw_frame(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(driver), Some(render)) = (self.driver.as_mut(), self.render.as_mut()) else {
            return;
        };

        match driver.tick(render) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => render.recover_surface(),
            Err(RenderError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                self.scheduler.stop();
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Skipping frame: {}", e),
        }

        self.scheduler.complete(Instant::now());
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_context(&mut self, event_loop: &ActiveEventLoop) {
        let Some(receiver) = self.context_receiver.as_mut() else {
            return;
        };
        let result = match receiver.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(_) => Err(ContextError::Device("initialisation was cancelled".to_string())),
        };
        self.context_receiver = None;

        if let Err(e) = result.map_err(InitError::from).and_then(|ctx| self.finish_init(ctx)) {
            self.fail(event_loop, e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failed {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let handle = window.window().clone();
        self.window = Some(window);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = pollster::block_on(RenderContext::new(handle))
                .map_err(InitError::from)
                .and_then(|ctx| self.finish_init(ctx));
            if let Err(e) = result {
                self.fail(event_loop, e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.context_receiver = Some(receiver);
            wasm_bindgen_futures::spawn_local(async move {
                if sender.send(RenderContext::new(handle).await).is_err() {
                    log::warn!("Graphics context finished after the app went away");
                }
            });
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.scheduler.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(render) = self.render.as_mut() {
                    render.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if self.scheduler.is_due(Instant::now()) {
                    self.draw_frame(event_loop);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(target_arch = "wasm32")]
        {
            self.poll_context(event_loop);
            if self.context_receiver.is_some() {
                event_loop.set_control_flow(ControlFlow::Poll);
                return;
            }
        }

        let now = Instant::now();
        match self.scheduler.deadline() {
            Some(_) if self.scheduler.is_due(now) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(driver) = &self.driver {
            log::info!("Exiting after {} frames", driver.frame_count());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octagon_render::LinkError;

    #[test]
    fn test_init_error_display_passes_through() {
        let err = InitError::from(ContextError::NoAdapter);
        assert_eq!(err.to_string(), ContextError::NoAdapter.to_string());

        let err = InitError::from(ShaderError::Link(LinkError::MissingUniform("uPMatrix")));
        assert_eq!(err.to_string(), "Could not initialise shaders: uniform 'uPMatrix' not found");
    }

    #[test]
    fn test_init_error_source() {
        use std::error::Error;
        let err = InitError::from(ShaderError::NotFound("shader-vs".to_string()));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_new_app_is_idle() {
        let app = App::new(AppConfig::default());
        assert!(!app.is_running());
    }
}
