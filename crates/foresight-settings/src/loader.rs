//! Settings loading: file deep-merge and environment overrides.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::errors::{Result, SettingsError};
use crate::types::ForesightSettings;

/// Environment variables recognized as overrides, with their JSON paths.
const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("FORESIGHT_SERVER_HOST", &["server", "host"]),
    ("FORESIGHT_SERVER_PORT", &["server", "port"]),
    ("FORESIGHT_PROVIDER_BASE_URL", &["provider", "baseUrl"]),
    ("FORESIGHT_PROVIDER_MODEL", &["provider", "model"]),
    ("FORESIGHT_PROVIDER_API_KEY", &["provider", "apiKey"]),
    (
        "FORESIGHT_MAX_CONCURRENT_CALLS",
        &["orchestrator", "maxConcurrentCalls"],
    ),
    (
        "FORESIGHT_REGISTRY_CAPACITY",
        &["orchestrator", "registryCapacity"],
    ),
];

/// Deep-merge `overlay` into `base`: objects merge key-by-key, any other
/// value replaces wholesale.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        let _ = base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

/// Load settings: defaults ← file (if present) ← env overrides.
pub fn load_settings(path: Option<&Path>) -> Result<ForesightSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// [`load_settings`], falling back to defaults (with a logged warning)
/// when the file is unreadable or malformed.
#[must_use]
pub fn load_settings_or_default(path: Option<&Path>) -> ForesightSettings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, ?path, "failed to load settings, using defaults");
            ForesightSettings::default()
        }
    }
}

/// Load with an injectable environment lookup (testable without touching
/// process env).
pub(crate) fn load_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ForesightSettings> {
    let mut merged = serde_json::to_value(ForesightSettings::default())?;

    if let Some(path) = path {
        let raw = std::fs::read_to_string(path)?;
        let overlay: Value = serde_json::from_str(&raw)?;
        deep_merge(&mut merged, overlay);
    }

    for (variable, json_path) in ENV_OVERRIDES {
        if let Some(raw) = env(variable) {
            let value = coerce(&raw);
            set_path(&mut merged, json_path, value);
        }
    }

    Ok(serde_json::from_value(merged)?)
}

/// Numbers and booleans parse as themselves, everything else is a string.
fn coerce(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::from(f);
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Value::from(b);
    }
    Value::from(raw)
}

fn set_path(root: &mut Value, path: &[&str], value: Value) {
    let mut cursor = root;
    for key in &path[..path.len() - 1] {
        cursor = cursor
            .as_object_mut()
            .map(|m| m.entry((*key).to_string()).or_insert_with(|| Value::Object(serde_json::Map::new())))
            .unwrap_or_else(|| unreachable!("settings root is always an object"));
    }
    if let Some(map) = cursor.as_object_mut() {
        let _ = map.insert(path[path.len() - 1].to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn deep_merge_merges_nested_objects() {
        let mut base = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3});
        deep_merge(&mut base, serde_json::json!({"a": {"y": 9}, "c": 4}));
        assert_eq!(base, serde_json::json!({"a": {"x": 1, "y": 9}, "b": 3, "c": 4}));
    }

    #[test]
    fn deep_merge_replaces_scalars_and_arrays() {
        let mut base = serde_json::json!({"list": [1, 2], "n": 1});
        deep_merge(&mut base, serde_json::json!({"list": [9], "n": 2}));
        assert_eq!(base, serde_json::json!({"list": [9], "n": 2}));
    }

    #[test]
    fn missing_file_path_yields_defaults() {
        let settings = load_with_env(None, no_env).unwrap();
        assert_eq!(settings, ForesightSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 9100}}, "provider": {{"model": "local-8b"}}}}"#
        )
        .unwrap();

        let settings = load_with_env(Some(file.path()), no_env).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.provider.model, "local-8b");
        // Untouched values keep defaults
        assert_eq!(settings.orchestrator.max_concurrent_calls, 4);
    }

    #[test]
    fn env_beats_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"server": {{"port": 9100}}}}"#).unwrap();

        let settings = load_with_env(Some(file.path()), |name| {
            (name == "FORESIGHT_SERVER_PORT").then(|| "9999".to_string())
        })
        .unwrap();
        assert_eq!(settings.server.port, 9999);
    }

    #[test]
    fn numeric_env_values_coerce() {
        let settings = load_with_env(None, |name| {
            (name == "FORESIGHT_MAX_CONCURRENT_CALLS").then(|| "8".to_string())
        })
        .unwrap();
        assert_eq!(settings.orchestrator.max_concurrent_calls, 8);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_with_env(Some(file.path()), no_env).is_err());
    }

    #[test]
    fn load_or_default_swallows_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let settings = load_settings_or_default(Some(file.path()));
        assert_eq!(settings, ForesightSettings::default());
    }
}
