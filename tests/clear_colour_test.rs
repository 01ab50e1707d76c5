#[cfg(feature = "integration-tests")]
#[macro_use]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use common::test_utils::{FrameCounter, TestRender, to_pixel};
    use hamlet::{
        context::{Context, InitContext},
        flow::{GraphicsFlow, ImageTestResult},
        render::Render,
    };
    use wgpu::Color;

    struct Empty;
    impl GraphicsFlow<FrameCounter> for Empty {
        fn on_init(&mut self, _: &mut Context, _: &mut FrameCounter) {}

        fn on_update(&mut self, _: &Context, _: &mut FrameCounter, _: instant::Duration) {}

        fn on_render(&self) -> Render<'_> {
            Render::None
        }
    }

    golden_image_test!(|_: InitContext| async move {
        anyhow::Ok(TestRender::new(
            Empty,
            |ctx: &mut Context| ctx.clear_colour = Color::WHITE,
            |_, state: &mut FrameCounter, texture| {
                if state.frame() == 0 {
                    return Ok(ImageTestResult::Waiting);
                }
                let desired_pixel = to_pixel(Color::WHITE);
                for pixel in texture.pixels() {
                    assert_eq!(*pixel, desired_pixel);
                }
                Ok(ImageTestResult::Passed)
            },
        ))
    });
}
