// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use davprobe_discovery::{AuthMethod, DiscoveryConfig, Hint};
use tokio::fs;

use crate::APP_NAME;

const DAVPROBE_CONFIG_ENV: &str = "DAVPROBE_CONFIG";

/// Loads the discovery settings.
///
/// The file is `path` if given, else `$DAVPROBE_CONFIG`, else the user configuration directory.
/// A missing default file yields the default settings; an explicitly named file must exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<DiscoveryConfig, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(DAVPROBE_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let Some(config) = default_config_path() else {
            tracing::debug!("user configuration directory not found, using defaults");
            return Ok(DiscoveryConfig::default());
        };
        if !config.exists() {
            tracing::debug!(path = %config.display(), "no config file, using defaults");
            return Ok(DiscoveryConfig::default());
        }
        config
    };

    fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()
        .map(|a| a.discovery)
}

#[derive(Debug, Default, serde::Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    discovery: DiscoveryConfig,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn default_config_path() -> Option<PathBuf> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.map(|dir| dir.join(format!("{APP_NAME}/config.toml")))
}

/// Settings given on the command line, overriding the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// User name for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Credentials {
    /// Applies the overrides to `config`.
    ///
    /// A token selects bearer authentication. Otherwise a user name or a password selects basic
    /// authentication; a missing user name defaults to the account name suggested by `hint`.
    #[must_use]
    pub fn apply(self, mut config: DiscoveryConfig, hint: &Hint) -> DiscoveryConfig {
        if let Some(token) = self.token {
            config.auth = AuthMethod::Bearer { token };
        } else if self.username.is_some() || self.password.is_some() {
            config.auth = AuthMethod::Basic {
                username: self.username.unwrap_or_else(|| hint.account_name()),
                password: self.password.unwrap_or_default(),
            };
        }

        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::OnceLock;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn parses_discovery_table() {
        let raw: ConfigRaw = r#"
[discovery]
timeout_secs = 10
user_agent = "probe/1.0"

[discovery.auth]
type = "basic"
username = "alice"
password = "secret"
"#
        .parse()
        .unwrap();

        assert_eq!(raw.discovery.timeout_secs, 10);
        assert_eq!(raw.discovery.user_agent, "probe/1.0");
        assert!(matches!(
            raw.discovery.auth,
            AuthMethod::Basic { ref username, ref password }
                if username == "alice" && password == "secret"
        ));
    }

    #[test]
    fn missing_table_uses_defaults() {
        let raw: ConfigRaw = "".parse().unwrap();
        assert_eq!(raw.discovery.timeout_secs, 30);
        assert!(matches!(raw.discovery.auth, AuthMethod::None));
    }

    #[test]
    fn parses_client_certificate() {
        let raw: ConfigRaw = r#"
[discovery.auth]
type = "client_certificate"
identity_pem = "/etc/davprobe/me.pem"
"#
        .parse()
        .unwrap();

        assert!(matches!(
            raw.discovery.auth,
            AuthMethod::ClientCertificate { ref identity_pem }
                if identity_pem == &PathBuf::from("/etc/davprobe/me.pem")
        ));
    }

    #[test]
    fn rejects_unknown_auth_type() {
        let result = r#"
[discovery.auth]
type = "kerberos"
"#
        .parse::<ConfigRaw>();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cli_flag_overrides_env_var() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[discovery]\ntimeout_secs = 5\n").unwrap();
        let env_path = temp_dir.path().join("env_config.toml");
        fs::write(&env_path, "[discovery]\ntimeout_secs = 7\n").unwrap();

        let _guard = env_lock().lock().await;
        unsafe {
            std::env::set_var(DAVPROBE_CONFIG_ENV, env_path.to_str().unwrap());
        }

        let config = parse_config(Some(config_path)).await.unwrap();
        assert_eq!(config.timeout_secs, 5);

        let config = parse_config(None).await.unwrap();
        assert_eq!(config.timeout_secs, 7);

        unsafe {
            std::env::remove_var(DAVPROBE_CONFIG_ENV);
        }
    }

    #[tokio::test]
    async fn explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = parse_config(Some(temp_dir.path().join("missing.toml"))).await;
        assert!(result.is_err());
    }

    #[test]
    fn token_takes_precedence() {
        let hint = Hint::parse("alice@example.com").unwrap();
        let credentials = Credentials {
            username: Some("alice".to_string()),
            password: Some("secret".to_string()),
            token: Some("t0k3n".to_string()),
            timeout_secs: None,
        };

        let config = credentials.apply(DiscoveryConfig::default(), &hint);
        assert!(matches!(config.auth, AuthMethod::Bearer { ref token } if token == "t0k3n"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn password_alone_uses_account_name() {
        let hint = Hint::parse("alice@example.com").unwrap();
        let credentials = Credentials {
            password: Some("secret".to_string()),
            timeout_secs: Some(3),
            ..Credentials::default()
        };

        let config = credentials.apply(DiscoveryConfig::default(), &hint);
        assert!(matches!(
            config.auth,
            AuthMethod::Basic { ref username, .. } if username == "alice@example.com"
        ));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn no_credentials_keep_file_auth() {
        let hint = Hint::parse("https://dav.example.com/").unwrap();
        let config = DiscoveryConfig {
            auth: AuthMethod::Bearer {
                token: "from-file".to_string(),
            },
            ..DiscoveryConfig::default()
        };

        let config = Credentials::default().apply(config, &hint);
        assert!(matches!(config.auth, AuthMethod::Bearer { ref token } if token == "from-file"));
    }
}
