use std::path::Path;

use vectorloop_demo::AnimationConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => AnimationConfig::load(Path::new(&path))?,
        None => AnimationConfig::default(),
    };
    log::info!(
        "Animating {:?} on a {}x{} canvas at {} fps for {} ms",
        config.shapes,
        config.width,
        config.height,
        config.fps,
        config.duration_ms
    );

    let summary = vectorloop_demo::run(&config)?;
    println!("{}", summary.frame.to_json()?);
    Ok(())
}
