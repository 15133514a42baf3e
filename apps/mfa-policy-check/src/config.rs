//! Configuration loading for `mfa-policy-check`.

use std::path::Path;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use mfa_trigger::MfaTriggerConfig;
use serde::Deserialize;
use static_mfa_plugin::config::StaticMfaPluginConfig;

/// Prefix of environment overrides, e.g. `MFA_MFA_TRIGGER__GLOBAL_PROVIDER_ID`.
pub const ENV_PREFIX: &str = "MFA_";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub mfa_trigger: MfaTriggerConfig,
    pub static_mfa_plugin: StaticMfaPluginConfig,
}

/// Merge the YAML file (if any) with `MFA_`-prefixed environment variables.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the merged configuration
/// does not deserialize.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        anyhow::ensure!(path.exists(), "config file {} does not exist", path.display());
        figment = figment.merge(Yaml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| match path {
            Some(path) => format!("invalid configuration in {}", path.display()),
            None => "invalid configuration".to_owned(),
        })
}
