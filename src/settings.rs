use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File, FileFormat};
use diffbot_control::Params;
use serde::Deserialize;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Everything the host runtime needs, robot parameters included.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub robot: Params,
    pub network: NetworkSettings,
    pub sim: SimSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Where pose/goal datagrams arrive.
    pub listen_addr: SocketAddr,
    /// Where teleplot lines are sent.
    pub telemetry_addr: SocketAddr,
    /// Parsed updates waiting for the control thread.
    pub update_queue: usize,
    /// Telemetry frames buffered for slow subscribers.
    pub telemetry_queue: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        NetworkSettings {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4242)),
            telemetry_addr: SocketAddr::from(([127, 0, 0, 1], 47269)),
            update_queue: 32,
            telemetry_queue: 64,
        }
    }
}

/// First-order motor model standing in for the drivetrain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Steady-state wheel speed per effective volt.
    pub motor_gain_rads_per_v: f64,
    pub time_constant_s: f64,
    /// PWM counter top of the simulated timer.
    pub max_duty: u16,
    /// Fraction of `max_duty` below which the motor does not turn.
    pub start_ratio: f32,
    /// Period of the control thread's spin loop.
    pub poll_period_us: u64,
}

impl Default for SimSettings {
    fn default() -> Self {
        SimSettings {
            motor_gain_rads_per_v: 20.0 / 12.0,
            time_constant_s: 0.1,
            max_duty: 255,
            start_ratio: 78.0 / 255.0,
            poll_period_us: 1_000,
        }
    }
}

/// Layers `config/default.toml` (if present) under `DIFFBOT__*` environment
/// overrides, e.g. `DIFFBOT__ROBOT__CONTROL__V_MAX_MPS=0.1`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    info!("Loading configuration from {} and DIFFBOT__* overrides", DEFAULT_CONFIG_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix("DIFFBOT").separator("__").try_parsing(true))
        .build()?
        .try_deserialize()?;

    settings
        .robot
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid robot parameters: {e}")))?;
    Ok(settings)
}
