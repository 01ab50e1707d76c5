#[cfg(feature = "integration-tests")]
use hamlet::{
    context::Context,
    flow::{GraphicsFlow, ImageTestResult},
    render::Render,
};

#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) type Validation = Box<
    dyn Fn(
        &Context,
        &mut FrameCounter,
        &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>,
>;

/// Wraps the flow under test: counts frames, lets the test adjust the
/// context after the flow's own `on_init` and validates the rendered image.
#[cfg(feature = "integration-tests")]
pub(crate) struct TestRender<F> {
    pub(crate) flow: F,
    pub(crate) setup: Box<dyn Fn(&mut Context)>,
    pub(crate) validate: Validation,
}

#[cfg(feature = "integration-tests")]
impl<F: GraphicsFlow<FrameCounter>> TestRender<F> {
    pub(crate) fn new(
        flow: F,
        setup: impl Fn(&mut Context) + 'static,
        validate: impl Fn(
            &Context,
            &mut FrameCounter,
            &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error>
        + 'static,
    ) -> Self {
        Self {
            flow,
            setup: Box::new(setup),
            validate: Box::new(validate),
        }
    }
}

#[cfg(feature = "integration-tests")]
impl<F: GraphicsFlow<FrameCounter>> GraphicsFlow<FrameCounter> for TestRender<F> {
    fn on_init(&mut self, ctx: &mut Context, s: &mut FrameCounter) {
        self.flow.on_init(ctx, s);
        (self.setup)(ctx);
    }

    fn on_update(&mut self, ctx: &Context, s: &mut FrameCounter, dt: instant::Duration) {
        s.progress();
        self.flow.on_update(ctx, s, dt);
    }

    fn on_render(&self) -> Render<'_> {
        self.flow.on_render()
    }

    fn on_exit(&mut self, ctx: &Context, s: &mut FrameCounter) {
        self.flow.on_exit(ctx, s);
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        s: &mut FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(ctx, s, texture)
    }
}

/// Turn a colour into the pixel it is read back as from an sRGB target.
#[cfg(feature = "integration-tests")]
pub(crate) fn to_pixel(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}

#[macro_export]
macro_rules! golden_image_test {
    ($constructor:expr) => {{
        use crate::common::test_utils::FrameCounter;
        use hamlet::context::InitContext;
        use hamlet::flow::{FlowConstructor, GraphicsFlow};
        let model_constructor: FlowConstructor<FrameCounter> = Box::new(
            |ctx: InitContext| -> std::pin::Pin<
                Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<FrameCounter>>>>>,
            > {
                Box::pin(async move {
                    let g_flow: Box<dyn GraphicsFlow<FrameCounter>> =
                        Box::new(($constructor)(ctx).await?);
                    anyhow::Ok(g_flow)
                })
            },
        );

        hamlet::flow::run(vec![model_constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
