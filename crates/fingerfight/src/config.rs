//! Server configuration.

use std::env;
use std::time::Duration;

use fingerfight_room::RoomConfig;
use fingerfight_session::SessionConfig;

use crate::FingerFightError;

/// Everything the server needs to start.
///
/// Defaults match production: port 3001 on every interface, a 30 s
/// heartbeat, 30 min room TTL and a room sweep every minute.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to listen on. Port 0 picks a free port.
    pub bind_addr: String,

    pub session: SessionConfig,

    pub room: RoomConfig,

    /// How often expired rooms are swept.
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".to_string(),
            session: SessionConfig::default(),
            room: RoomConfig::default(),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the environment:
    ///
    /// | variable | meaning | default |
    /// |---|---|---|
    /// | `FINGERFIGHT_BIND` | listen host | `0.0.0.0` |
    /// | `PORT` | listen port | `3001` |
    /// | `FINGERFIGHT_HEARTBEAT_SECS` | liveness sweep interval | `30` |
    /// | `FINGERFIGHT_ROOM_TTL_SECS` | room lifetime | `1800` |
    ///
    /// # Errors
    /// Returns [`FingerFightError::Config`] when a numeric variable does
    /// not parse.
    pub fn from_env() -> Result<Self, FingerFightError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FingerFightError> {
        let mut config = Self::default();

        let host = lookup("FINGERFIGHT_BIND").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var(&lookup, "PORT")?.unwrap_or(3001);
        config.bind_addr = format!("{host}:{port}");

        if let Some(secs) = parse_var::<u64>(&lookup, "FINGERFIGHT_HEARTBEAT_SECS")? {
            if secs == 0 {
                return Err(FingerFightError::Config {
                    key: "FINGERFIGHT_HEARTBEAT_SECS",
                    value: secs.to_string(),
                });
            }
            config.session.heartbeat_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FINGERFIGHT_ROOM_TTL_SECS")? {
            config.room.ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, FingerFightError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FingerFightError::Config { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
        assert_eq!(config.session.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.room.ttl, Duration::from_secs(1_800));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("FINGERFIGHT_BIND", "127.0.0.1"),
            ("PORT", "8080"),
            ("FINGERFIGHT_HEARTBEAT_SECS", "5"),
            ("FINGERFIGHT_ROOM_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.session.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.room.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, FingerFightError::Config { key: "PORT", .. }));
    }

    #[test]
    fn test_from_lookup_rejects_zero_heartbeat() {
        let err = ServerConfig::from_lookup(lookup(&[("FINGERFIGHT_HEARTBEAT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            FingerFightError::Config {
                key: "FINGERFIGHT_HEARTBEAT_SECS",
                ..
            }
        ));
    }
}
