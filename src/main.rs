use hamlet::scene::{self, config::SceneConfig};

fn main() -> anyhow::Result<()> {
    let config = SceneConfig::from_arg(std::env::args().nth(1).as_deref())?;
    scene::run(config)
}
