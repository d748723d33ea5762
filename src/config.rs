//! Process-wide configuration, read once at startup.
//!
//! # Environment
//!
//! | Variable           | Required | Default        |
//! |--------------------|----------|----------------|
//! | `SECRET_TOKEN`     | yes      |                |
//! | `GIT_PATH`         | yes      |                |
//! | `HOST`             | no       | `127.0.0.1`    |
//! | `PORT`             | no       | `8080`         |
//! | `GIT_TIMEOUT_SECS` | no       | `30`           |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const ENV_SECRET_TOKEN: &str = "SECRET_TOKEN";
pub const ENV_GIT_PATH: &str = "GIT_PATH";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_GIT_TIMEOUT_SECS: &str = "GIT_TIMEOUT_SECS";

/// Default bind host: loopback only.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default bound on the `git tag` subprocess, in seconds.
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

/// Errors from loading the configuration. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the {0} environment variable is not set")]
    Missing(&'static str),

    #[error("the {0} environment variable is empty")]
    Empty(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Receiver configuration.
#[derive(Clone)]
pub struct Config {
    /// HMAC key shared with GitHub.
    pub webhook_secret: Vec<u8>,

    /// The checkout whose tags are compared with incoming refs.
    pub repo_path: PathBuf,

    /// Where the server binds, from `HOST` and `PORT`.
    pub listen_addr: SocketAddr,

    /// Upper bound on a single `git tag` invocation.
    pub git_timeout: Duration,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_secret = required(&lookup, ENV_SECRET_TOKEN)?.into_bytes();
        let repo_path = PathBuf::from(required(&lookup, ENV_GIT_PATH)?);

        let host = match lookup(ENV_HOST) {
            None => DEFAULT_HOST,
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                var: ENV_HOST,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };
        let port = match lookup(ENV_PORT) {
            None => DEFAULT_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: ENV_PORT,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };
        let listen_addr = SocketAddr::new(host, port);

        let git_timeout = match lookup(ENV_GIT_TIMEOUT_SECS) {
            None => Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_GIT_TIMEOUT_SECS,
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: ENV_GIT_TIMEOUT_SECS,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Config {
            webhook_secret,
            repo_path,
            listen_addr,
            git_timeout,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("webhook_secret", &"<redacted>")
            .field("repo_path", &self.repo_path)
            .field("listen_addr", &self.listen_addr)
            .field("git_timeout", &self.git_timeout)
            .finish()
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Err(ConfigError::Missing(var)),
        Some(value) if value.is_empty() => Err(ConfigError::Empty(var)),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn required_values_with_defaults() {
        let config = load(&[("SECRET_TOKEN", "s3cret"), ("GIT_PATH", "/srv/app")]).unwrap();
        assert_eq!(config.webhook_secret, b"s3cret");
        assert_eq!(config.repo_path, PathBuf::from("/srv/app"));
        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.git_timeout, Duration::from_secs(30));
    }

    #[test]
    fn optional_values_override_defaults() {
        let config = load(&[
            ("SECRET_TOKEN", "s3cret"),
            ("GIT_PATH", "/srv/app"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("GIT_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.git_timeout, Duration::from_secs(5));
    }

    #[test]
    fn host_and_port_are_independent() {
        let config = load(&[
            ("SECRET_TOKEN", "s3cret"),
            ("GIT_PATH", "/srv/app"),
            ("PORT", "8443"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8443".parse().unwrap());

        let config = load(&[
            ("SECRET_TOKEN", "s3cret"),
            ("GIT_PATH", "/srv/app"),
            ("HOST", "::1"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "[::1]:8080".parse().unwrap());
    }

    #[test]
    fn missing_secret_is_fatal() {
        assert_eq!(
            load(&[("GIT_PATH", "/srv/app")]).unwrap_err(),
            ConfigError::Missing("SECRET_TOKEN")
        );
    }

    #[test]
    fn empty_secret_is_fatal() {
        assert_eq!(
            load(&[("SECRET_TOKEN", ""), ("GIT_PATH", "/srv/app")]).unwrap_err(),
            ConfigError::Empty("SECRET_TOKEN")
        );
    }

    #[test]
    fn missing_path_is_fatal() {
        assert_eq!(
            load(&[("SECRET_TOKEN", "s3cret")]).unwrap_err(),
            ConfigError::Missing("GIT_PATH")
        );
    }

    #[test]
    fn invalid_optional_values_are_fatal() {
        let err = load(&[
            ("SECRET_TOKEN", "s3cret"),
            ("GIT_PATH", "/srv/app"),
            ("HOST", "not an address"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "HOST", .. }));

        for port in ["", "65536", "-1", "http"] {
            let err = load(&[
                ("SECRET_TOKEN", "s3cret"),
                ("GIT_PATH", "/srv/app"),
                ("PORT", port),
            ])
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
        }

        for timeout in ["0", "-1", "soon"] {
            let err = load(&[
                ("SECRET_TOKEN", "s3cret"),
                ("GIT_PATH", "/srv/app"),
                ("GIT_TIMEOUT_SECS", timeout),
            ])
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    var: "GIT_TIMEOUT_SECS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = load(&[("SECRET_TOKEN", "s3cret"), ("GIT_PATH", "/srv/app")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
