//! Server configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8080`).
    pub port: u16,
    /// Maximum players per room (default `50`).
    pub max_players: usize,
    /// Seconds between liveness sweeps (default `30`).
    pub sweep_interval_secs: u64,
    /// Seconds of update silence before a player is evicted (default `60`).
    pub player_timeout_secs: u64,
    /// Seconds between periodic stats log lines (default `60`).
    pub stats_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            max_players: 50,
            sweep_interval_secs: 30,
            player_timeout_secs: 60,
            stats_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Recognized keys: `AERIE_HOST`, `AERIE_PORT` (with plain `PORT` as a
    /// fallback), `AERIE_MAX_PLAYERS`, `AERIE_SWEEP_INTERVAL_SECS`,
    /// `AERIE_PLAYER_TIMEOUT_SECS`, and `AERIE_STATS_INTERVAL_SECS`. Missing
    /// or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests inject closures instead of mutating
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut config = Self {
            host: lookup("AERIE_HOST").unwrap_or_else(|| defaults.host.clone()),
            port: parse_or(
                "AERIE_PORT",
                lookup("AERIE_PORT").or_else(|| lookup("PORT")),
                defaults.port,
            ),
            max_players: parse_or(
                "AERIE_MAX_PLAYERS",
                lookup("AERIE_MAX_PLAYERS"),
                defaults.max_players,
            ),
            sweep_interval_secs: parse_or(
                "AERIE_SWEEP_INTERVAL_SECS",
                lookup("AERIE_SWEEP_INTERVAL_SECS"),
                defaults.sweep_interval_secs,
            ),
            player_timeout_secs: parse_or(
                "AERIE_PLAYER_TIMEOUT_SECS",
                lookup("AERIE_PLAYER_TIMEOUT_SECS"),
                defaults.player_timeout_secs,
            ),
            stats_interval_secs: parse_or(
                "AERIE_STATS_INTERVAL_SECS",
                lookup("AERIE_STATS_INTERVAL_SECS"),
                defaults.stats_interval_secs,
            ),
        };
        if config.max_players == 0 {
            warn!("AERIE_MAX_PLAYERS must be at least 1, using default");
            config.max_players = defaults.max_players;
        }
        // A zero period would panic when the timer is built
        if config.sweep_interval_secs == 0 {
            warn!("AERIE_SWEEP_INTERVAL_SECS must be at least 1, using default");
            config.sweep_interval_secs = defaults.sweep_interval_secs;
        }
        if config.stats_interval_secs == 0 {
            warn!("AERIE_STATS_INTERVAL_SECS must be at least 1, using default");
            config.stats_interval_secs = defaults.stats_interval_secs;
        }
        config
    }

    /// How often the liveness sweeper wakes up.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// How long a player may go without updates before eviction.
    pub fn player_timeout(&self) -> Duration {
        Duration::from_secs(self.player_timeout_secs)
    }

    /// How often the periodic stats line is logged.
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else { return default };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable value");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
    }

    #[test]
    fn default_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn default_max_players() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_players, 50);
    }

    #[test]
    fn default_sweep_interval() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.sweep_interval_secs, 30);
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(30));
    }

    #[test]
    fn default_player_timeout() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.player_timeout_secs, 60);
        assert_eq!(cfg.player_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn default_stats_interval() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.stats_interval_secs, 60);
        assert_eq!(cfg.stats_interval(), Duration::from_secs(60));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_players, cfg.max_players);
        assert_eq!(back.sweep_interval_secs, cfg.sweep_interval_secs);
        assert_eq!(back.player_timeout_secs, cfg.player_timeout_secs);
        assert_eq!(back.stats_interval_secs, cfg.stats_interval_secs);
    }

    #[test]
    fn custom_values() {
        let cfg = ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            max_players: 4,
            sweep_interval_secs: 5,
            player_timeout_secs: 10,
            stats_interval_secs: 15,
        };
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_players, 4);
        assert_eq!(cfg.sweep_interval_secs, 5);
        assert_eq!(cfg.player_timeout_secs, 10);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"10.0.0.1","port":3000,"max_players":8,"sweep_interval_secs":5,"player_timeout_secs":15,"stats_interval_secs":30}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "10.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_players, 8);
    }

    #[test]
    fn from_lookup_empty_env_uses_defaults() {
        let cfg = ServerConfig::from_lookup(|_| None);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_players, 50);
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let cfg = ServerConfig::from_lookup(|key| {
            Some(
                match key {
                    "AERIE_HOST" => "192.168.1.1",
                    "AERIE_PORT" => "9999",
                    "AERIE_MAX_PLAYERS" => "16",
                    "AERIE_SWEEP_INTERVAL_SECS" => "7",
                    "AERIE_PLAYER_TIMEOUT_SECS" => "21",
                    "AERIE_STATS_INTERVAL_SECS" => "42",
                    _ => return None,
                }
                .to_owned(),
            )
        });
        assert_eq!(cfg.host, "192.168.1.1");
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.max_players, 16);
        assert_eq!(cfg.sweep_interval_secs, 7);
        assert_eq!(cfg.player_timeout_secs, 21);
        assert_eq!(cfg.stats_interval_secs, 42);
    }

    #[test]
    fn generic_port_var_is_honored() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            "PORT" => Some("4321".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.port, 4321);
    }

    #[test]
    fn aerie_port_wins_over_generic_port() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            "AERIE_PORT" => Some("1111".to_owned()),
            "PORT" => Some("2222".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.port, 1111);
    }

    #[test]
    fn unparseable_value_uses_default() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            "AERIE_PORT" => Some("not-a-port".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn zero_max_players_is_rejected() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            "AERIE_MAX_PLAYERS" => Some("0".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.max_players, 50);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let cfg = ServerConfig::from_lookup(|key| match key {
            "AERIE_SWEEP_INTERVAL_SECS" | "AERIE_STATS_INTERVAL_SECS" => Some("0".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.sweep_interval_secs, 30);
        assert_eq!(cfg.stats_interval_secs, 60);
    }

    #[test]
    fn zero_player_timeout_is_allowed() {
        // A zero timeout is aggressive but well-defined: everyone whose
        // stamp is even a millisecond old gets swept.
        let cfg = ServerConfig::from_lookup(|key| match key {
            "AERIE_PLAYER_TIMEOUT_SECS" => Some("0".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.player_timeout_secs, 0);
    }
}
