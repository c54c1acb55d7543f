//! Command-line argument parsing for the `starhelm` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A deterministic, tick-driven 3D space simulator with a character-grid
/// bridge display.
#[derive(Debug, Parser)]
#[command(name = "starhelm", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the settings JSON file. Defaults to the OS config
    /// directory; written from defaults if it does not exist.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging verbosity.
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a universe via genesis and run the cooperative logic/render
    /// loop headlessly, printing a charmap frame every `--frame-interval`
    /// ticks until `--ticks` elapse.
    Run {
        /// How many simulated ticks to run for.
        #[arg(long, default_value_t = 100.0)]
        ticks: f64,

        /// How many ticks elapse between printed frames.
        #[arg(long, default_value_t = 10.0)]
        frame_interval: f64,

        /// Character-grid width and height to render at.
        #[arg(long, default_value_t = 80)]
        width: u16,

        #[arg(long, default_value_t = 24)]
        height: u16,
    },
    /// Write the default settings file to `path` (or the config default
    /// path) and exit.
    DumpConfig {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::parse_from(["starhelm", "run"]);
        match cli.command {
            Command::Run { ticks, frame_interval, width, height } => {
                assert_eq!(ticks, 100.0);
                assert_eq!(frame_interval, 10.0);
                assert_eq!(width, 80);
                assert_eq!(height, 24);
            }
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn parses_dump_config_with_explicit_path() {
        let cli = Cli::parse_from(["starhelm", "dump-config", "--path", "/tmp/settings.json"]);
        match cli.command {
            Command::DumpConfig { path } => assert_eq!(path, Some(PathBuf::from("/tmp/settings.json"))),
            _ => panic!("expected DumpConfig"),
        }
    }

    #[test]
    fn log_level_defaults_to_info() {
        let cli = Cli::parse_from(["starhelm", "run"]);
        assert!(matches!(cli.log_level, LogLevel::Info));
    }
}
