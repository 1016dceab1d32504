use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use clap::Parser;
use rs_utils::ClientSettings;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod demo;
mod entity_systems;
mod plugins;
mod timing;

#[derive(Debug, Parser)]
#[command(version, about = "Headless entity simulation client")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, default_value = "settings.toml")]
    config: PathBuf,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    skin_server: Option<String>,
    /// Ticks to simulate before exiting.
    #[arg(long, default_value_t = 200)]
    ticks: u32,
    /// Remote players orbiting the spawn.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=200))]
    players: u8,
    /// Hacks flags as a server would advertise them, e.g. "-fly jumps=2".
    #[arg(long, default_value = "")]
    motd: String,
}

fn main() -> AppExit {
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut settings = match ClientSettings::load(&args.config) {
        Ok(settings) => settings,
        Err(err) => {
            error!("failed to load {}: {err}", args.config.display());
            return AppExit::error();
        }
    };
    if let Some(username) = args.username {
        settings.username = username;
    }
    if let Some(skin_server) = args.skin_server {
        settings.skin_server = skin_server;
    }
    settings.sanitize();
    info!(username = %settings.username, skin_server = %settings.skin_server, "starting client");

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        )
        .add_plugins((
            plugins::ClientEntityPlugin {
                settings,
                world: demo::demo_world(),
            },
            plugins::ClientDemoPlugin {
                config: demo::DemoConfig {
                    players: args.players,
                    ticks: args.ticks,
                    server_name: "demo".to_string(),
                    motd: args.motd,
                },
            },
            plugins::ClientTimingPlugin,
        ))
        .run()
}
