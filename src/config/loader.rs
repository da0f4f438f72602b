use crate::config::error::{ConfigError, ConfigResult};
use crate::config::types::Config;
use std::path::Path;
use tracing::info;

/// Read, parse and validate the config file at `path`
pub fn load(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let config = Config::from_toml(&source)?;
    info!(
        path = %path.display(),
        remotes = config.remote_homeservers.len(),
        "Loaded config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
            ping_room = "#ping:a.example"
            ping_json_url = "https://feed.example/ping.json"
            ping_rate_seconds = 120

            [own_homeserver]
            homeserver = "https://matrix.a.example"
            username = "@ping:a.example"
            password = "secret"

            [[remote_homeservers]]
            homeserver = "https://matrix.b.example"
            username = "@ping:b.example"
            access_token = "syt_b"
            "##
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.ping_rate_seconds, 120);
        assert_eq!(config.own_homeserver.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_missing_file() {
        let result = load("/nonexistent/federation-probe.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ping_room = [").unwrap();

        assert!(matches!(load(file.path()), Err(ConfigError::Parse(_))));
    }
}
