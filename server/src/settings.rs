use std::default::Default;
use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Layer the default file, the run-mode file, the local overrides and the
/// environment, in that order. Nested keys in the environment use a double
/// underscore, e.g. `TAROT_SERVER_GAME__STOCK_VISIBILITY=hidden`.
pub fn load() -> Result<Settings, ConfigError> {
    let mut s = Config::new();
    s.merge(File::with_name(DEFAULT_CFG_PATH))?;
    let env = env::var(RUN_MODE_ENV).unwrap_or_else(|_| "development".into());
    s.merge(File::with_name(&format!("config/{}", env)).required(false))?;
    s.merge(File::with_name(LOCAL_CFG_PATH).required(false))?;
    s.merge(Environment::with_prefix(ENV_PREFIX).separator("__"))?;
    s.try_into()
}

const DEFAULT_CFG_PATH: &str = "config/default";
const LOCAL_CFG_PATH: &str = "config/local";
const RUN_MODE_ENV: &str = "TAROT_SERVER_RUN_MODE";
const ENV_PREFIX: &str = "tarot_server";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: Logging,
    pub runtime: Runtime,
    pub server: Server,
    pub game: tarot_game::server::Settings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Runtime {
    pub threaded: bool,
    pub core_threads: usize,
    pub max_threads: usize,
    pub thread_name: String,
}

impl Default for Runtime {
    fn default() -> Self {
        let num_cores = num_cpus::get_physical();
        Runtime {
            threaded: true,
            core_threads: num_cores,
            max_threads: num_cores * 2,
            thread_name: "async-worker".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind_addr: String,
    /// Directory of static files served to browsers.
    pub client_files_path: String,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            bind_addr: "127.0.0.1:3000".into(),
            client_files_path: "./public/".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_game::session::StockVisibility;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let mut s = Config::new();
        s.merge(File::from_str(
            "[game]\nstock_visibility = \"hidden\"\nshuffle_seed = 9\n",
            config::FileFormat::Toml,
        ))
        .unwrap();
        let settings: Settings = s.try_into().unwrap();
        assert_eq!(settings.game.stock_visibility, StockVisibility::Hidden);
        assert_eq!(settings.game.shuffle_seed, Some(9));
        assert_eq!(settings.game.seats, 5);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.server.bind_addr, "127.0.0.1:3000");
    }
}
