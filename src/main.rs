//! `starhelm` binary entry point: parses CLI arguments, loads settings,
//! and either dumps the default configuration or runs a bounded,
//! headless demonstration of the cooperative logic/render loop described
//! in the simulator's concurrency model (two loops, cooperatively
//! scheduled, yielding between whole frames at a target rate).

use clap::Parser;
use log::info;

use starhelm::camera::Camera;
use starhelm::charmap::draw_ship_view;
use starhelm::command::dispatch::register_core_commands;
use starhelm::command::Controller;
use starhelm::config::Settings;
use starhelm::simulation::universe::Universe;

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::new().filter_level(cli.log_level.to_filter()).init();

    match cli.command {
        Command::DumpConfig { path } => dump_config(path),
        Command::Run { ticks, frame_interval, width, height } => run(&cli, ticks, frame_interval, width, height).await,
    }
}

fn dump_config(path: Option<std::path::PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(Settings::default_path);
    Settings::default().write(&path)?;
    info!("wrote default settings to {}", path.display());
    println!("wrote default settings to {}", path.display());
    Ok(())
}

async fn run(cli: &Cli, ticks: f64, frame_interval: f64, width: u16, height: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load_or_write_default(&config_path)?;
    info!("loaded settings from {}", config_path.display());

    let fps = settings.fps.max(1.0);
    let frame_delay = std::time::Duration::from_secs_f64(1.0 / fps);

    let mut controller = Controller::new();
    register_core_commands(&mut controller)?;

    let mut universe = Universe::genesis(settings);
    let fid = starhelm::simulation::ship::FleetId::new();
    let ship_oid = universe.add_ship(1.0, fid, 'S', "cyan", "Flagship");
    if let Some(target) = universe.random_celestial_oid() {
        for result in controller.dispatch(&mut universe, &format!("fly {ship_oid} {target}")) {
            if let Err(err) = result {
                info!("startup order failed: {err}");
            }
        }
    }

    let mut camera = Camera::new();
    camera.follow(Some(Box::new(move |u: &Universe| u.position_of(ship_oid))));

    let mut elapsed = 0.0;
    while elapsed < ticks {
        let dt = frame_interval.min(ticks - elapsed);
        universe.do_ticks(dt)?;
        elapsed += dt;

        camera.update(&universe);
        match draw_ship_view(&camera, 2, &universe, ship_oid, (width, height)) {
            Ok(frame) => println!("{frame}"),
            Err(err) => println!("render error: {err}"),
        }
        tokio::time::sleep(frame_delay).await;
    }

    info!("ran {elapsed} ticks");
    Ok(())
}
