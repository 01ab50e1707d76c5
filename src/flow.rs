//! Flow control and application event loop.
//!
//! A "flow" is a scene that reacts to input, updates itself every frame and
//! describes what it wants drawn. The engine owns the window and the GPU
//! context, drives all flows from winit's event loop and renders their
//! output in a single pass.
//!
//! # Lifecycle
//!
//! 1. The window and [`Context`] are created, then every flow constructor is awaited
//! 2. `on_init` lets each flow adjust the context (clear colour, camera)
//! 3. Window and device events are forwarded to all flows
//! 4. On every redraw: `on_update(dt)`, camera update, `on_render`, present
//! 5. `on_exit` is called once before the event loop stops

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{model::DrawModel, texture::Texture},
    render::{Instanced, Render},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable scene.
///
/// 1. `on_init()` is called once after construction; configure the context here
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame with the time since the previous frame
/// 4. `on_render()` is called every frame and specifies how to render `self`
/// 5. `on_exit()` is called once before the application shuts down
pub trait GraphicsFlow<S> {
    /// This is the only place to modify the Context, e.g. the background
    /// colour or the camera start position.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S);

    /// Update state every frame. Use for animations and other per-frame logic.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration);

    /// Handle raw device events.
    fn on_device_events(&mut self, _ctx: &Context, _state: &mut S, _event: &DeviceEvent) {}

    /// Handle window events (keyboard, mouse, resizing, etc.).
    fn on_window_events(&mut self, _ctx: &Context, _state: &mut S, _event: &WindowEvent) {}

    /// Collect this flow's renderable objects into a [`Render`].
    fn on_render(&self) -> Render<'_>;

    /// Release per-frame hooks and other registrations.
    fn on_exit(&mut self, _ctx: &Context, _state: &mut S) {}

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _ctx: &Context,
        _state: &mut S,
        _texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> anyhow::Result<ImageTestResult> {
        Ok(ImageTestResult::Passed)
    }
}

impl<State> Debug for dyn GraphicsFlow<State> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Factory for a flow.
///
/// Takes an [`InitContext`] and asynchronously returns a boxed
/// [`GraphicsFlow`], which allows resources to be loaded before the first
/// frame. A constructor that fails is logged and skipped.
pub type FlowConstructor<S> = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<S>>>>>>,
>;

/// Identifies a callback registered with [`FrameObservers::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Callbacks invoked once per frame with a mutable target and the frame time.
pub struct FrameObservers<T> {
    next: u64,
    observers: Vec<(ObserverHandle, Box<dyn FnMut(&mut T, Duration)>)>,
}

impl<T> FrameObservers<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            observers: Vec::new(),
        }
    }

    pub fn add(&mut self, observer: impl FnMut(&mut T, Duration) + 'static) -> ObserverHandle {
        let handle = ObserverHandle(self.next);
        self.next += 1;
        self.observers.push((handle, Box::new(observer)));
        handle
    }

    /// Unregister an observer. Returns `false` if it was already removed.
    pub fn remove(&mut self, handle: ObserverHandle) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(h, _)| *h != handle);
        before != self.observers.len()
    }

    /// Run every observer in registration order.
    pub fn notify(&mut self, target: &mut T, dt: Duration) {
        for (_, observer) in self.observers.iter_mut() {
            observer(target, dt);
        }
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> Default for FrameObservers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for FrameObservers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameObservers")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d, format: wgpu::TextureFormat) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Render target size for readback. Rows must be a multiple of 256 bytes,
    /// so the width is rounded up to a multiple of 64 RGBA pixels.
    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let width = self.ctx.config.width.div_ceil(64) * 64;
        wgpu::Extent3d {
            width,
            height: self.ctx.config.height,
            depth_or_array_layers: 1,
        }
    }

    fn render(
        &mut self,
        graphics_flows: &mut [Box<dyn GraphicsFlow<State>>],
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] event_loop: &winit::event_loop::EventLoopProxy<
            FlowEvent<State>,
        >,
    ) -> Result<(), wgpu::CurrentSurfaceTexture> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(t) | wgpu::CurrentSurfaceTexture::Suboptimal(t) => t,
            other => return Err(other),
        };

        #[cfg(not(feature = "integration-tests"))]
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(not(feature = "integration-tests"))]
        let depth_view = &self.ctx.depth_texture.view;

        #[cfg(feature = "integration-tests")]
        let (tex, view, test_depth) = {
            let extent3d = self.get_test_3d_extent();
            let tex = self.get_test_texture(extent3d, self.ctx.config.format);
            let depth = Texture::create_depth_texture(
                &self.ctx.device,
                [extent3d.width, extent3d.height],
                "test_depth_texture",
            );
            let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
            (tex, view, depth)
        };
        #[cfg(feature = "integration-tests")]
        let depth_view = &test_depth.view;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let mut basics: Vec<Instanced> = Vec::new();
            graphics_flows
                .iter()
                .for_each(|flow| flow.on_render().set_pipelines(&mut basics));

            render_pass.set_pipeline(&self.ctx.pipelines.basic);
            for instanced in basics {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("Skipping model {} without instances", instanced.id);
                    continue;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_instanced(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let extent3d = self.get_test_3d_extent();
            let bytes_per_row = 4 * extent3d.width;
            let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                size: (bytes_per_row * extent3d.height) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: Some("Golden Image Test Output Buffer"),
                mapped_at_creation: false,
            });
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bytes_per_row),
                        rows_per_image: Some(extent3d.height),
                    },
                },
                extent3d,
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        {
            let extent3d = self.get_test_3d_extent();
            let verdict = async_runtime.block_on(async {
                let mut img = read_back(&self.ctx.device, &output_buffer, extent3d).await?;
                let mut all_passed = true;
                for flow in graphics_flows.iter() {
                    match flow.render_to_texture(&self.ctx, &mut self.state, &mut img)? {
                        ImageTestResult::Passed => (),
                        ImageTestResult::Waiting => all_passed = false,
                        ImageTestResult::Failed => anyhow::bail!("Golden image assertion failed"),
                    }
                }
                anyhow::Ok(all_passed)
            });
            match verdict {
                Ok(true) => {
                    if event_loop.send_event(FlowEvent::Exit).is_err() {
                        log::error!("All assertions passed but the event loop is already closed");
                    }
                }
                Ok(false) => (),
                // The readback path only exists for tests, a failure must abort them.
                Err(e) => panic!("{:#}", e),
            }
        }

        output.present();
        Ok(())
    }
}

#[cfg(feature = "integration-tests")]
async fn read_back(
    device: &wgpu::Device,
    output_buffer: &wgpu::Buffer,
    extent3d: wgpu::Extent3d,
) -> anyhow::Result<image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>> {
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: Some(Duration::from_secs(3)),
    })?;
    rx.receive()
        .await
        .ok_or_else(|| anyhow::anyhow!("buffer mapping was cancelled"))??;
    let data = buffer_slice.get_mapped_range();
    image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(extent3d.width, extent3d.height, data)
        .ok_or_else(|| anyhow::anyhow!("readback buffer is smaller than the image"))
}

pub struct App<State: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State>>,
    state: Option<AppState<State>>,
    // Fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State>>>,
    // Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor<State>>>,
    last_time: Instant,
}

impl<State: 'static> App<State> {
    fn new(
        event_loop: &EventLoop<FlowEvent<State>>,
        constructors: Vec<FlowConstructor<State>>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            self.graphics_flows
                .iter_mut()
                .for_each(|flow| flow.on_exit(&state.ctx, &mut state.state));
        }
        self.graphics_flows.clear();
        event_loop.exit();
    }
}

pub(crate) enum FlowEvent<State: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State>>>,
    },
    #[allow(dead_code)]
    Exit,
}

impl<State> Debug for FlowEvent<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Exit => f.write_str("Exit"),
        }
    }
}

async fn construct_flows<State>(
    ctx: InitContext,
    constructors: Vec<FlowConstructor<State>>,
) -> Vec<Box<dyn GraphicsFlow<State>>> {
    // InitContext clones only bump the internal Arcs of device and queue
    let flow_futures: Vec<_> = constructors
        .into_iter()
        .map(|constructor| constructor(ctx.clone()))
        .collect();
    futures::future::join_all(flow_futures)
        .await
        .into_iter()
        .filter_map(|flow| match flow {
            Ok(flow) => Some(flow),
            Err(e) => {
                log::error!("Skipping a flow that failed to initialize: {:#}", e);
                None
            }
        })
        .collect()
}

impl<State: 'static + Default> ApplicationHandler<FlowEvent<State>> for App<State> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("hamlet");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            let app_state = AppState::<State>::new(window).await?;
            let flows = construct_flows((&app_state.ctx).into(), constructors).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((mut app_state, flows)) => {
                    let size = app_state.ctx.window.inner_size();
                    app_state.resize(size.width, size.height);
                    self.graphics_flows = flows;
                    self.graphics_flows
                        .iter_mut()
                        .for_each(|flow| flow.on_init(&mut app_state.ctx, &mut app_state.state));
                    // Loading time is not part of the first frame
                    self.last_time = Instant::now();
                    self.state = Some(app_state);
                }
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((app_state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized {
                                state: app_state,
                                flows,
                            })
                            .is_err()
                        {
                            log::error!("The event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // Sent by the wasm `spawn_local` above
                let app_state = self.state.insert(state);
                self.graphics_flows = flows;

                // Trigger a resize and redraw now that we are initialized
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                self.graphics_flows
                    .iter_mut()
                    .for_each(|flow| flow.on_init(&mut app_state.ctx, &mut app_state.state));
                self.last_time = Instant::now();
                app_state.ctx.window.request_redraw();
            }
            FlowEvent::Exit => self.exit(event_loop),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        self.graphics_flows
            .iter_mut()
            .for_each(|f| f.on_device_events(&state.ctx, &mut state.state, &event));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        self.graphics_flows
            .iter_mut()
            .for_each(|f| f.on_window_events(&state.ctx, &mut state.state, &event));

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                // Dragging with the left button orbits the camera
                if let MouseButtonState::Left = state.ctx.mouse.pressed {
                    let dx = position.x - state.ctx.mouse.coords.x;
                    let dy = position.y - state.ctx.mouse.coords.y;
                    state.ctx.camera.controller.handle_mouse(dx, dy);
                }
                state.ctx.mouse.coords = position;
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state.ctx.mouse.pressed = match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => MouseButtonState::Left,
                    (MouseButton::Right, true) => MouseButtonState::Right,
                    (_, false) => MouseButtonState::None,
                    _ => state.ctx.mouse.pressed,
                };
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                self.graphics_flows
                    .iter_mut()
                    .for_each(|f| f.on_update(&state.ctx, &mut state.state, dt));

                let camera = &mut state.ctx.camera;
                camera.controller.update(&mut camera.camera);
                camera.write_to_buffer(&state.ctx.queue, &state.ctx.projection);

                match state.render(
                    &mut self.graphics_flows,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &self.proxy,
                ) {
                    Ok(_) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {:?}", e),
                }
            }
            _ => {}
        }
    }
}

/// Open a window, build the context and all flows, and run until the window
/// is closed.
pub fn run<State: 'static + Default>(constructors: Vec<FlowConstructor<State>>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<FlowEvent<State>> = EventLoop::with_user_event().build()?;

    let mut app: App<State> = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
