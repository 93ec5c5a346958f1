/// Configuration system for yieldcast.
///
/// Layered hierarchy, later layers win key by key:
///
/// 1. **Built-in defaults**: [`schema::YieldcastConfig::default()`]
/// 2. **User global config**: `~/.yieldcast/config.toml`
/// 3. **Project local config**: `.yieldcast.toml` in the current directory
/// 4. **Environment variables**: `YIELDCAST_*` overrides
///
/// A file only overrides the keys it sets; everything else comes from the
/// layers below it. Malformed files are ignored so a broken config never
/// blocks a prediction; `yieldcast config show` prints what actually took
/// effect.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::YieldcastConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> YieldcastConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given files over the built-in defaults, lowest layer first.
fn load_layers(paths: &[Option<PathBuf>]) -> YieldcastConfig {
    let mut merged = toml::Table::new();
    for path in paths {
        if let Some(layer) = read_layer(path.clone()) {
            merge_tables(&mut merged, layer);
        }
    }
    toml::Value::Table(merged).try_into().unwrap_or_default()
}

/// Read one config file as a raw table, `None` if it is absent or malformed.
///
/// A layer must deserialize on its own, so a file with a mistyped key is
/// dropped whole rather than poisoning the merge.
fn read_layer(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let table: toml::Table = toml::from_str(&content).ok()?;
    toml::Value::Table(table.clone())
        .try_into::<YieldcastConfig>()
        .ok()?;
    Some(table)
}

/// Recursively overlay `layer` onto `base`; nested tables merge per key.
fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.yieldcast/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".yieldcast").join("config.toml"))
}

/// `.yieldcast.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".yieldcast.toml"))
}

/// Path of the global config file, for display.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path of the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence).
///
/// - `YIELDCAST_API_URL`: prediction endpoint
/// - `YIELDCAST_TIMEOUT_MS`: transport timeout, `0` for none
/// - `YIELDCAST_PENDING_MS`: minimum pending duration
/// - `YIELDCAST_LOG`: diagnostics journal on/off
fn apply_env_overrides(config: &mut YieldcastConfig) {
    if let Ok(val) = std::env::var("YIELDCAST_API_URL")
        && !val.trim().is_empty()
    {
        config.service.url = val.trim().to_string();
    }
    if let Ok(val) = std::env::var("YIELDCAST_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.service.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("YIELDCAST_PENDING_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.pacing.min_pending_ms = ms;
    }
    if let Ok(val) = std::env::var("YIELDCAST_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.yieldcast/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.yieldcast/ directory")?;
    }

    fs::write(&path, YieldcastConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", " On "] {
            assert!(is_truthy(yes), "{yes:?}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no:?}");
        }
    }

    #[test]
    fn show_effective_config_round_trips() {
        let toml_str = show_effective_config().unwrap();
        let _: YieldcastConfig = toml::from_str(&toml_str).unwrap();
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "yieldcast-{name}-{}.toml",
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_none() {
        let path = std::env::temp_dir().join("yieldcast-does-not-exist.toml");
        assert!(read_layer(Some(path)).is_none());
        assert!(read_layer(None).is_none());
    }

    #[test]
    fn project_layer_keeps_unset_global_keys() {
        let global = temp_file(
            "layer-global",
            "[service]\nurl = \"https://farm.onrender.com\"\ntimeout_ms = 3000\n",
        );
        let project = temp_file("layer-project", "[pacing]\nmin_pending_ms = 100\n");

        let config = load_layers(&[Some(global.clone()), Some(project.clone())]);
        assert_eq!(config.service.url, "https://farm.onrender.com");
        assert_eq!(config.service.timeout_ms, 3000);
        assert_eq!(config.pacing.min_pending_ms, 100);
        assert!(config.logging.enabled);

        let _ = fs::remove_file(global);
        let _ = fs::remove_file(project);
    }

    #[test]
    fn project_layer_overrides_single_key() {
        let global = temp_file(
            "override-global",
            "[service]\nurl = \"https://farm.onrender.com\"\ntimeout_ms = 3000\n",
        );
        let project = temp_file("override-project", "[service]\ntimeout_ms = 500\n");

        let config = load_layers(&[Some(global.clone()), Some(project.clone())]);
        assert_eq!(config.service.url, "https://farm.onrender.com");
        assert_eq!(config.service.timeout_ms, 500);

        let _ = fs::remove_file(global);
        let _ = fs::remove_file(project);
    }

    #[test]
    fn mistyped_layer_is_skipped_whole() {
        let global = temp_file("typed-global", "[pacing]\nmin_pending_ms = 300\n");
        let project = temp_file(
            "typed-project",
            "[pacing]\nmin_pending_ms = \"slow\"\n[service]\ntimeout_ms = 9\n",
        );

        let config = load_layers(&[Some(global.clone()), Some(project.clone())]);
        assert_eq!(config.pacing.min_pending_ms, 300);
        assert_eq!(config.service.timeout_ms, 0);

        let _ = fs::remove_file(global);
        let _ = fs::remove_file(project);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let path = std::env::temp_dir().join(format!(
            "yieldcast-malformed-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[service\nurl = ").unwrap();
        assert!(read_layer(Some(path.clone())).is_none());
        let _ = fs::remove_file(path);
    }
}
