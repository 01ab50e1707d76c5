#[cfg(feature = "integration-tests")]
#[macro_use]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_draw_houses_over_the_clear_colour() {
    use common::test_utils::{FrameCounter, TestRender, to_pixel};
    use hamlet::{
        context::{Context, InitContext},
        flow::{GraphicsFlow, ImageTestResult},
        scene::{
            config::{SceneConfig, Variant},
            village::VillageFlow,
        },
    };
    use wgpu::Color;

    // Magenta reads back the same in RGBA and BGRA surface formats.
    const BACKGROUND: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };

    golden_image_test!(|ctx: InitContext| async move {
        let flow = VillageFlow::new(ctx, SceneConfig::for_variant(Variant::Village)).await?;
        assert_eq!(flow.dwellings().map(|d| d.instances.len()), Some(17));
        // Ground plus seventeen houses.
        let drawn = <VillageFlow as GraphicsFlow<FrameCounter>>::on_render(&flow).instance_count();
        assert_eq!(drawn, 18);
        anyhow::Ok(TestRender::new(
            flow,
            |ctx: &mut Context| ctx.clear_colour = BACKGROUND,
            |_, state: &mut FrameCounter, texture| {
                if state.frame() == 0 {
                    return Ok(ImageTestResult::Waiting);
                }
                let background = to_pixel(BACKGROUND);
                let covered = texture.pixels().filter(|pixel| **pixel != background).count();
                assert!(covered > 0, "nothing was drawn over the clear colour");
                Ok(ImageTestResult::Passed)
            },
        ))
    });
}
