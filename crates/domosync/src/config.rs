//! Profile resolution: the config file plus CLI flag overrides.
//!
//! Flags beat environment variables, which beat the profile, which beats
//! `[defaults]`. With no profile at all, `--host` alone is enough to talk
//! to a server.

use std::time::Duration;

use secrecy::SecretString;

use domosync_config::{Config, Profile};
use domosync_core::{BridgeConfig, ConnectionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The active profile after overrides, with the config it came from.
#[derive(Debug)]
pub struct ProfileContext {
    pub config: Config,
    pub name: String,
    pub profile: Profile,
}

impl ProfileContext {
    /// Resolve the active profile from the config file and flags.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = domosync_config::config_path();
        let config = if path.exists() {
            domosync_config::load_config()?
        } else {
            Config::default()
        };
        let name = active_profile_name(global, &config);

        let profile = match (config.profiles.get(&name), &global.host) {
            (Some(profile), _) => with_overrides(profile.clone(), global),
            (None, Some(host)) => with_overrides(Profile::new(host.clone()), global),
            (None, None) if config.profiles.is_empty() => {
                return Err(CliError::NoConfig {
                    path: path.display().to_string(),
                });
            }
            (None, None) => {
                let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
                available.sort_unstable();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available.join(", "),
                });
            }
        };

        Ok(Self {
            config,
            name,
            profile,
        })
    }

    /// Connection settings for the active profile.
    ///
    /// A `--password` flag beats `password_env`, the keyring, and the
    /// plaintext password.
    pub fn connection_config(&self, global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
        let Some(password) = &global.password else {
            return Ok(domosync_config::profile_to_connection_config(
                &self.profile,
                &self.name,
                &self.config.defaults,
            )?);
        };

        let anonymous = Profile {
            username: None,
            ..self.profile.clone()
        };
        let mut config = domosync_config::profile_to_connection_config(
            &anonymous,
            &self.name,
            &self.config.defaults,
        )?;
        config.username = self.profile.username.clone().filter(|u| !u.is_empty());
        config.password = Some(SecretString::from(password.clone()));
        Ok(config)
    }

    /// Poll settings for a long-running bridge.
    pub fn bridge_config(&self) -> BridgeConfig {
        domosync_config::profile_to_bridge_config(&self.profile, &self.config.defaults)
    }

    /// Bridge settings for one-shot commands: no poll timer.
    pub fn oneshot_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::ZERO,
            ..self.bridge_config()
        }
    }

    /// Write the (overridden) profile back to the config file.
    pub fn save(&mut self) -> Result<std::path::PathBuf, CliError> {
        self.config
            .profiles
            .insert(self.name.clone(), self.profile.clone());
        if self.config.profiles.len() == 1 {
            self.config.default_profile = Some(self.name.clone());
        }
        Ok(domosync_config::save_config(&self.config)?)
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

fn with_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            host: None,
            port: None,
            username: None,
            password: None,
            output: OutputFormat::Table,
            verbose: 0,
            quiet: false,
            insecure: false,
            timeout: None,
        }
    }

    #[test]
    fn flags_override_profile_fields() {
        let mut profile = Profile::new("10.0.0.2");
        profile.port = Some(8080);
        profile.timeout = Some(5);

        let opts = GlobalOpts {
            port: Some(9090),
            username: Some("admin".into()),
            insecure: true,
            ..global()
        };
        let merged = with_overrides(profile, &opts);

        assert_eq!(merged.host, "10.0.0.2");
        assert_eq!(merged.port, Some(9090));
        assert_eq!(merged.username.as_deref(), Some("admin"));
        assert_eq!(merged.insecure, Some(true));
        assert_eq!(merged.timeout, Some(5));
    }

    #[test]
    fn profile_flag_beats_default_profile() {
        let config = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        assert_eq!(active_profile_name(&global(), &config), "home");

        let opts = GlobalOpts {
            profile: Some("cabin".into()),
            ..global()
        };
        assert_eq!(active_profile_name(&opts, &config), "cabin");
    }

    #[test]
    fn password_flag_is_used_verbatim() {
        use secrecy::ExposeSecret;

        let mut profile = Profile::new("dz.local");
        profile.username = Some("admin".into());
        let ctx = ProfileContext {
            config: Config::default(),
            name: "default".into(),
            profile,
        };
        let opts = GlobalOpts {
            password: Some("hunter2".into()),
            ..global()
        };

        let conn = ctx.connection_config(&opts).unwrap();
        assert_eq!(conn.username.as_deref(), Some("admin"));
        assert_eq!(conn.password.unwrap().expose_secret(), "hunter2");
        assert_eq!(conn.url.as_str(), "http://dz.local:8080/");
    }

    #[test]
    fn oneshot_bridge_has_no_timer() {
        let ctx = ProfileContext {
            config: Config::default(),
            name: "default".into(),
            profile: Profile::new("dz.local"),
        };
        assert_eq!(ctx.bridge_config().poll_interval, Duration::from_secs(10));
        assert_eq!(ctx.oneshot_bridge_config().poll_interval, Duration::ZERO);
    }
}
