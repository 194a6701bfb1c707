//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

/// Daemon configuration. File: ~/.config/gnss-bridge/config.toml or
/// /etc/gnss-bridge/config.toml.
/// Env overrides: GNSS_BRIDGE_SOCKET, GNSS_BRIDGE_DATA_DIR.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Filesystem path of the native peer's listening socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Directory the downloaded assistance data is written to.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/run/gnss-bridge.sock")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/gnss-bridge")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_else(Config::default);
    if let Some(s) = std::env::var_os("GNSS_BRIDGE_SOCKET") {
        c.socket_path = PathBuf::from(s);
    }
    if let Some(s) = std::env::var_os("GNSS_BRIDGE_DATA_DIR") {
        c.data_dir = PathBuf::from(s);
    }
    c.data_dir = absolutize(c.data_dir);
    c
}

/// Success notifications carry the artifact path verbatim and the peer
/// expects an absolute one, so a relative data directory is resolved
/// against the working directory once, here.
fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/gnss-bridge/config.toml"));
    }
    out.push(PathBuf::from("/etc/gnss-bridge/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}
