use crate::config::error::{ConfigError, ConfigResult};
use crate::probe::{EngineConfig, MatchRule, MAX_PROBE_DURATION};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_PING_RATE_SECONDS: u64 = 60;
pub const DEFAULT_PING_THRESHOLD_SECONDS: u64 = 240;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_SETTLE_DELAY_SECONDS: u64 = 5;

/// Credentials and location of one bot account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HomeserverConfig {
    /// Client-server API base URL
    #[serde(default)]
    pub homeserver: String,
    /// Full user id, e.g. `@ping:example.org`
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl HomeserverConfig {
    fn has_credentials(&self) -> bool {
        [&self.password, &self.access_token, &self.device_id]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub own_homeserver: HomeserverConfig,
    #[serde(default)]
    pub remote_homeservers: Vec<HomeserverConfig>,
    /// Room alias or id all probes are sent into
    #[serde(default)]
    pub ping_room: String,
    #[serde(default)]
    pub ping_rate_seconds: u64,
    #[serde(default)]
    pub ping_threshold_seconds: u64,
    #[serde(default)]
    pub poll_interval_seconds: u64,
    #[serde(default)]
    pub settle_delay_seconds: Option<u64>,
    #[serde(default)]
    pub ping_json_url: String,
    #[serde(default)]
    pub match_rule: MatchRule,
    #[serde(default)]
    pub blacklisted_homeservers: Vec<String>,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

impl Config {
    pub fn from_toml(source: &str) -> ConfigResult<Self> {
        let mut config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill defaults and reject incomplete or conflicting settings
    pub fn validate(&mut self) -> ConfigResult<()> {
        if self.ping_room.is_empty() {
            return Err(ConfigError::MissingPingRoom);
        }
        if self.ping_json_url.is_empty() {
            return Err(ConfigError::MissingFeedUrl);
        }

        if self.ping_rate_seconds == 0 {
            self.ping_rate_seconds = DEFAULT_PING_RATE_SECONDS;
        }
        if self.ping_threshold_seconds == 0 {
            self.ping_threshold_seconds = DEFAULT_PING_THRESHOLD_SECONDS;
        }
        if self.poll_interval_seconds == 0 {
            self.poll_interval_seconds = DEFAULT_POLL_INTERVAL_SECONDS;
        }
        self.check_durations()?;
        if self.address.is_empty() {
            self.address = default_address();
        }
        self.listen_addr()?;

        let own = &self.own_homeserver;
        if own.homeserver.is_empty() {
            return Err(ConfigError::MissingOwnHomeserver);
        }
        if own.username.is_empty() {
            return Err(ConfigError::MissingOwnUsername);
        }
        if !own.has_credentials() {
            return Err(ConfigError::MissingOwnCredentials);
        }

        if self.remote_homeservers.is_empty() {
            return Err(ConfigError::NoRemoteHomeservers);
        }
        for (n, remote) in self.remote_homeservers.iter().enumerate() {
            if remote.homeserver.is_empty() {
                return Err(ConfigError::MissingRemoteHomeserver(n));
            }
            if remote.username.is_empty() {
                return Err(ConfigError::MissingRemoteUsername(remote.homeserver.clone()));
            }
            if !remote.has_credentials() {
                return Err(ConfigError::MissingRemoteCredentials(remote.homeserver.clone()));
            }
        }

        for remote in &self.remote_homeservers {
            if self.blacklisted_homeservers.contains(&remote.homeserver) {
                return Err(ConfigError::Blacklisted(remote.homeserver.clone()));
            }
        }

        for (i, remote) in self.remote_homeservers.iter().enumerate() {
            if remote.homeserver == own.homeserver {
                return Err(ConfigError::SameAsOwn(remote.homeserver.clone()));
            }
            if self.remote_homeservers[i + 1..]
                .iter()
                .any(|other| other.homeserver == remote.homeserver)
            {
                return Err(ConfigError::DuplicateRemote(remote.homeserver.clone()));
            }
        }

        Ok(())
    }

    fn check_durations(&self) -> ConfigResult<()> {
        let max = MAX_PROBE_DURATION.as_secs();
        let settings = [
            ("ping_rate_seconds", self.ping_rate_seconds),
            ("ping_threshold_seconds", self.ping_threshold_seconds),
            ("poll_interval_seconds", self.poll_interval_seconds),
            ("settle_delay_seconds", self.settle_delay_seconds.unwrap_or(0)),
        ];
        match settings.into_iter().find(|(_, value)| *value > max) {
            Some((field, value)) => Err(ConfigError::DurationTooLarge { field, value, max }),
            None => Ok(()),
        }
    }

    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        self.address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.address.clone()))
    }

    /// Engine settings for probes sent into `room_id`
    pub fn engine_config(&self, room_id: impl Into<String>) -> EngineConfig {
        EngineConfig {
            room_id: room_id.into(),
            ping_rate: Duration::from_secs(self.ping_rate_seconds),
            threshold: Duration::from_secs(self.ping_threshold_seconds),
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
            settle_delay: Duration::from_secs(
                self.settle_delay_seconds
                    .unwrap_or(DEFAULT_SETTLE_DELAY_SECONDS),
            ),
            match_rule: self.match_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r##"
        ping_room = "#ping:a.example"
        ping_json_url = "https://feed.example/ping.json"

        [own_homeserver]
        homeserver = "https://matrix.a.example"
        username = "@ping:a.example"
        access_token = "syt_local"
        device_id = "LOCAL"

        [[remote_homeservers]]
        homeserver = "https://matrix.b.example"
        username = "@ping:b.example"
        password = "hunter2"

        [[remote_homeservers]]
        homeserver = "https://matrix.c.example"
        username = "@ping:c.example"
        access_token = "syt_c"
    "##;

    fn with(extra_top: &str) -> String {
        format!("{extra_top}\n{VALID}")
    }

    #[test]
    fn test_defaults_filled() {
        let config = Config::from_toml(VALID).unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.ping_rate_seconds, 60);
        assert_eq!(config.ping_threshold_seconds, 240);
        assert_eq!(config.match_rule, MatchRule::TokenExact);
        assert_eq!(config.remote_homeservers.len(), 2);

        let engine = config.engine_config("!abc:a.example");
        assert_eq!(engine.room_id, "!abc:a.example");
        assert_eq!(engine.ping_rate, Duration::from_secs(60));
        assert_eq!(engine.threshold, Duration::from_secs(240));
        assert_eq!(engine.poll_interval, Duration::from_secs(1));
        assert_eq!(engine.settle_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_values_kept() {
        let config = Config::from_toml(&with(
            r#"
            address = "127.0.0.1:9100"
            ping_rate_seconds = 30
            ping_threshold_seconds = 90
            settle_delay_seconds = 0
            match_rule = "known_peer_presence"
            "#,
        ))
        .unwrap();

        assert_eq!(config.listen_addr().unwrap().port(), 9100);
        let engine = config.engine_config("!abc:a.example");
        assert_eq!(engine.ping_rate, Duration::from_secs(30));
        assert_eq!(engine.threshold, Duration::from_secs(90));
        assert_eq!(engine.settle_delay, Duration::ZERO);
        assert_eq!(engine.match_rule, MatchRule::KnownPeerPresence);
    }

    #[test]
    fn test_missing_room_and_feed() {
        let no_room = VALID.replace(r##"ping_room = "#ping:a.example""##, "");
        assert!(matches!(
            Config::from_toml(&no_room),
            Err(ConfigError::MissingPingRoom)
        ));

        let no_feed = VALID.replace(r#"ping_json_url = "https://feed.example/ping.json""#, "");
        assert!(matches!(
            Config::from_toml(&no_feed),
            Err(ConfigError::MissingFeedUrl)
        ));
    }

    #[test]
    fn test_own_homeserver_checks() {
        let mut config = Config::from_toml(VALID).unwrap();

        config.own_homeserver.access_token = None;
        config.own_homeserver.device_id = None;
        assert!(matches!(
            config.clone().validate(),
            Err(ConfigError::MissingOwnCredentials)
        ));

        config.own_homeserver.username.clear();
        assert!(matches!(
            config.clone().validate(),
            Err(ConfigError::MissingOwnUsername)
        ));

        config.own_homeserver.homeserver.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOwnHomeserver)
        ));
    }

    #[test]
    fn test_remote_checks() {
        let mut config = Config::from_toml(VALID).unwrap();

        let mut none = config.clone();
        none.remote_homeservers.clear();
        assert!(matches!(none.validate(), Err(ConfigError::NoRemoteHomeservers)));

        let mut no_creds = config.clone();
        no_creds.remote_homeservers[1].access_token = Some(String::new());
        assert!(matches!(
            no_creds.validate(),
            Err(ConfigError::MissingRemoteCredentials(hs)) if hs == "https://matrix.c.example"
        ));

        let mut no_hs = config.clone();
        no_hs.remote_homeservers[1].homeserver.clear();
        assert!(matches!(
            no_hs.validate(),
            Err(ConfigError::MissingRemoteHomeserver(1))
        ));

        config.remote_homeservers[0].username.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRemoteUsername(_))
        ));
    }

    #[test]
    fn test_blacklisted_same_and_duplicate() {
        let config = Config::from_toml(VALID).unwrap();

        let mut blacklisted = config.clone();
        blacklisted.blacklisted_homeservers = vec!["https://matrix.b.example".to_string()];
        assert!(matches!(
            blacklisted.validate(),
            Err(ConfigError::Blacklisted(hs)) if hs == "https://matrix.b.example"
        ));

        let mut same = config.clone();
        same.remote_homeservers[0].homeserver = "https://matrix.a.example".to_string();
        assert!(matches!(same.validate(), Err(ConfigError::SameAsOwn(_))));

        let mut duplicate = config;
        duplicate.remote_homeservers[1].homeserver = "https://matrix.b.example".to_string();
        assert!(matches!(
            duplicate.validate(),
            Err(ConfigError::DuplicateRemote(hs)) if hs == "https://matrix.b.example"
        ));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let config = Config::from_toml(&with("ping_threshold_seconds = 9223372036854775807"));
        assert!(matches!(
            config,
            Err(ConfigError::DurationTooLarge {
                field: "ping_threshold_seconds",
                ..
            })
        ));

        let config = Config::from_toml(&with("ping_rate_seconds = 604801"));
        assert!(matches!(
            config,
            Err(ConfigError::DurationTooLarge {
                field: "ping_rate_seconds",
                value: 604801,
                max: 604800,
            })
        ));

        let config = Config::from_toml(&with("ping_rate_seconds = 604800")).unwrap();
        assert_eq!(
            config.engine_config("!abc:a.example").oversized_setting(),
            None
        );
    }

    #[test]
    fn test_invalid_address() {
        let config = Config::from_toml(&with(r#"address = "not-an-address""#));
        assert!(matches!(config, Err(ConfigError::InvalidAddress(_))));
    }
}
