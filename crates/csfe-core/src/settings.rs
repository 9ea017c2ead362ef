//! Run settings
//!
//! Read once before a run and passed by reference afterwards. Every purge
//! flag resolves through the chain: its own variable, then
//! `CSFE_PURGE_ON_UNHANDLED`, then `CSFE_PURGE`, then `true`.

use std::path::PathBuf;

use csfe_editor::PurgePolicy;
use csfe_model::AdapterFlavor;

use crate::error::SettingsError;

/// Adapter flavor selector
pub const ADAPTER_VAR: &str = "CSFE_ADAPTER";
/// History file location
pub const HISTORY_PATH_VAR: &str = "CSFE_HISTORY_PATH";
/// Global purge switch, last link of every chain
pub const PURGE_VAR: &str = "CSFE_PURGE";
/// Purge-on-unhandled default for every member kind
pub const PURGE_ON_UNHANDLED_VAR: &str = "CSFE_PURGE_ON_UNHANDLED";
pub const PURGE_CONTENT_TYPE_VAR: &str = "CSFE_PURGE_ON_UNHANDLED_CONTENT_TYPE";
pub const PURGE_DISPLAY_NAME_VAR: &str = "CSFE_PURGE_ON_UNHANDLED_DISPLAY_NAME";
pub const PURGE_SYNC_ADAPTER_VAR: &str = "CSFE_PURGE_ON_UNHANDLED_SYNC_ADAPTER";
pub const PURGE_ASYNC_ADAPTER_VAR: &str = "CSFE_PURGE_ON_UNHANDLED_ASYNC_ADAPTER";

/// Immutable configuration of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Flavor whose adapter pair is generated
    pub adapter: AdapterFlavor,
    /// Purge-on-unhandled flags
    pub purge: PurgePolicy,
    /// History file, when configured explicitly
    pub history_path: Option<PathBuf>,
}

fn parse_bool(var: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Settings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error when a variable holds an unparseable value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error when a variable holds an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let flag = |var: &str| -> Result<Option<bool>, SettingsError> {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .map(|value| parse_bool(var, &value))
                .transpose()
        };

        let fallback = match flag(PURGE_ON_UNHANDLED_VAR)? {
            Some(purge) => purge,
            None => flag(PURGE_VAR)?.unwrap_or(true),
        };
        let purge = PurgePolicy {
            content_type: flag(PURGE_CONTENT_TYPE_VAR)?.unwrap_or(fallback),
            display_name: flag(PURGE_DISPLAY_NAME_VAR)?.unwrap_or(fallback),
            sync_adapter: flag(PURGE_SYNC_ADAPTER_VAR)?.unwrap_or(fallback),
            async_adapter: flag(PURGE_ASYNC_ADAPTER_VAR)?.unwrap_or(fallback),
        };

        let adapter = match lookup(ADAPTER_VAR).filter(|value| !value.trim().is_empty()) {
            Some(value) => value
                .parse()
                .map_err(|source| SettingsError::InvalidAdapter {
                    var: ADAPTER_VAR.to_string(),
                    source,
                })?,
            None => AdapterFlavor::default(),
        };

        let history_path = lookup(HISTORY_PATH_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let settings = Self {
            adapter,
            purge,
            history_path,
        };
        tracing::debug!(?settings, "resolved settings");
        Ok(settings)
    }

    /// With adapter flavor
    #[inline]
    #[must_use]
    pub fn with_adapter(mut self, adapter: AdapterFlavor) -> Self {
        self.adapter = adapter;
        self
    }

    /// With purge policy
    #[inline]
    #[must_use]
    pub fn with_purge(mut self, purge: PurgePolicy) -> Self {
        self.purge = purge;
        self
    }

    /// With history file location
    #[inline]
    #[must_use]
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn empty_environment_purges_everything() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.purge, PurgePolicy::uniform(true));
        assert_eq!(settings.adapter, AdapterFlavor::Synchronous);
    }

    #[test]
    fn specific_flag_wins() {
        let settings = settings(&[
            (PURGE_VAR, "yes"),
            (PURGE_ON_UNHANDLED_VAR, "0"),
            (PURGE_DISPLAY_NAME_VAR, "TRUE"),
        ])
        .unwrap();
        assert!(!settings.purge.content_type);
        assert!(settings.purge.display_name);
        assert!(!settings.purge.sync_adapter);
        assert!(!settings.purge.async_adapter);
    }

    #[test]
    fn global_purge_is_last_resort() {
        let settings = settings(&[(PURGE_VAR, "no"), (PURGE_ASYNC_ADAPTER_VAR, "1")]).unwrap();
        assert_eq!(
            settings.purge,
            PurgePolicy {
                content_type: false,
                display_name: false,
                sync_adapter: false,
                async_adapter: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!(
            settings(&[(PURGE_SYNC_ADAPTER_VAR, "sometimes")]),
            Err(SettingsError::InvalidBool { var, .. }) if var == PURGE_SYNC_ADAPTER_VAR
        ));
        assert!(matches!(
            settings(&[(ADAPTER_VAR, "grpc")]),
            Err(SettingsError::InvalidAdapter { .. })
        ));
    }

    #[test]
    fn adapter_and_history_from_env() {
        let settings = settings(&[(ADAPTER_VAR, "async"), (HISTORY_PATH_VAR, "conf/h.yaml")]).unwrap();
        assert_eq!(settings.adapter, AdapterFlavor::Asynchronous);
        assert_eq!(settings.history_path, Some(PathBuf::from("conf/h.yaml")));
    }

    #[test]
    fn builder_overrides() {
        let settings = Settings::new()
            .with_adapter(AdapterFlavor::Asynchronous)
            .with_purge(PurgePolicy::uniform(false))
            .with_history_path("h.yaml");
        assert!(settings.adapter.is_async());
        assert!(!settings.purge.content_type);
        assert_eq!(settings.history_path, Some(PathBuf::from("h.yaml")));
    }
}
