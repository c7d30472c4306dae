mod app;
mod attenuation;
mod clock;
mod config;
mod input;
mod model;
mod pointer;
mod render;
mod sim;
mod transition;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    app::run()
}
