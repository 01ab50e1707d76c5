use hamlet::scene::{
    builder::SceneBuilder,
    config::{DEFAULT_SCENE_FILE, SceneConfig, Variant},
    layout::{SINGLE_HOUSE_LAYOUT, VILLAGE_LAYOUT},
    spin::Spin,
};

#[test]
fn parses_every_variant() {
    assert_eq!("village".parse::<Variant>().unwrap(), Variant::Village);
    assert_eq!("house".parse::<Variant>().unwrap(), Variant::SpinningHouse);
    assert_eq!(" Village ".parse::<Variant>().unwrap(), Variant::Village);
    assert_eq!(
        "imported".parse::<Variant>().unwrap(),
        Variant::Imported {
            path: DEFAULT_SCENE_FILE.to_string()
        }
    );
    assert_eq!(
        "imported:meshs/other.glb".parse::<Variant>().unwrap(),
        Variant::Imported {
            path: "meshs/other.glb".to_string()
        }
    );
}

#[test]
fn rejects_unknown_variants() {
    assert!("castle".parse::<Variant>().is_err());
    assert!("village:extra".parse::<Variant>().is_err());
    assert!("imported:".parse::<Variant>().is_err());
}

#[test]
fn missing_argument_defaults_to_the_village() {
    assert_eq!(SceneConfig::from_arg(None).unwrap().variant, Variant::Village);
    assert_eq!(SceneConfig::from_arg(Some("  ")).unwrap().variant, Variant::Village);
    assert_eq!(SceneConfig::default(), SceneConfig::for_variant(Variant::Village));
    assert!(SceneConfig::from_arg(Some("castle")).is_err());
}

#[test]
fn village_config_places_the_whole_table() {
    let config = SceneConfig::for_variant(Variant::Village);

    assert_eq!(config.builder, SceneBuilder::village());
    assert_eq!(config.layout, VILLAGE_LAYOUT.to_vec());
    assert_eq!(config.spin, None);
}

#[test]
fn spinning_house_turns_at_ten_rpm() {
    let config = SceneConfig::from_arg(Some("house")).unwrap();

    assert_eq!(config.builder, SceneBuilder::single_house());
    assert_eq!(config.layout, SINGLE_HOUSE_LAYOUT.to_vec());
    assert_eq!(config.spin, Some(Spin::new(10.0)));
}

#[test]
fn imported_scene_builds_nothing_procedurally() {
    let config = SceneConfig::from_arg(Some("imported")).unwrap();

    assert!(config.layout.is_empty());
    assert_eq!(config.spin, None);
}
