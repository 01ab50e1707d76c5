use hamlet::render::Render;

#[test]
fn empty_renders_draw_nothing() {
    assert_eq!(Render::None.instance_count(), 0);
    assert_eq!(Render::Defaults(Vec::new()).instance_count(), 0);
    let nested = Render::Composed(vec![
        Render::None,
        Render::Composed(vec![Render::Defaults(Vec::new()), Render::None]),
    ]);
    assert_eq!(nested.instance_count(), 0);
}
