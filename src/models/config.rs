//! Configuration for smon.
//!
//! Sources, later wins: built-in defaults, `/etc/smon/config.toml`, the user
//! config file, `SMON_*` environment variables, then command-line flags.
//! Configuration is read once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/smon/config.toml";

/// Cluster name shown in fake-data mode.
pub const DEMO_CLUSTER_NAME: &str = "DEMO-CLUSTER";

/// smon configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SmonConfig {
    pub system: SystemConfig,

    pub refresh: RefreshConfig,

    pub display: DisplayConfig,

    pub behavior: BehaviorConfig,
}

/// System configuration for paths and data source
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Directory containing the Slurm binaries (scontrol, squeue, ...).
    /// If not set, auto-detected via PATH
    pub slurm_bin_path: Option<PathBuf>,

    /// Use the built-in synthetic cluster instead of Slurm
    pub fake_data: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Cluster refresh interval in seconds
    pub interval: u64,

    /// Job detail refresh interval in seconds (while the detail view is open)
    pub detail_interval: u64,

    /// Upper bound for any single Slurm command, in seconds
    pub command_timeout: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: 2,
            detail_interval: 3,
            command_timeout: 5,
        }
    }
}

/// Minimum allowed value for every refresh setting, in seconds
const MIN_REFRESH_INTERVAL: u64 = 1;

/// Fields in RefreshConfig that require interval validation.
#[derive(Clone, Copy)]
enum RefreshField {
    Interval,
    DetailInterval,
    CommandTimeout,
}

impl RefreshField {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::DetailInterval => "detail_interval",
            Self::CommandTimeout => "command_timeout",
        }
    }
}

/// Validate that an interval value meets the minimum requirement.
/// In non-strict mode, corrects invalid values to the default and adds a warning.
/// In strict mode, returns an error for invalid values.
fn validate_interval(
    value: &mut u64,
    field: RefreshField,
    default: u64,
    strict: bool,
    warnings: &mut Vec<String>,
) -> Result<(), String> {
    if *value < MIN_REFRESH_INTERVAL {
        let field_name = field.as_str();
        let msg = format!(
            "refresh.{field_name} must be at least {MIN_REFRESH_INTERVAL} second(s), got {value}",
        );
        if strict {
            return Err(msg);
        }
        warnings.push(format!("{msg} - using default ({default})"));
        *value = default;
    }
    Ok(())
}

impl RefreshConfig {
    /// Validate refresh values, correcting invalid ones to their defaults.
    /// If `strict` is true, returns Err instead of correcting values.
    pub fn validate(&mut self, strict: bool) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        let defaults = Self::default();

        validate_interval(
            &mut self.interval,
            RefreshField::Interval,
            defaults.interval,
            strict,
            &mut warnings,
        )?;
        validate_interval(
            &mut self.detail_interval,
            RefreshField::DetailInterval,
            defaults.detail_interval,
            strict,
            &mut warnings,
        )?;
        validate_interval(
            &mut self.command_timeout,
            RefreshField::CommandTimeout,
            defaults.command_timeout,
            strict,
            &mut warnings,
        )?;

        Ok(warnings)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    #[must_use]
    pub fn detail_interval(&self) -> Duration {
        Duration::from_secs(self.detail_interval)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Title shown in the dashboard header
    pub title: String,

    /// Initial width of the nodes pane, in columns
    pub node_pane_width: u16,

    /// Start with the compact job table
    pub compact_jobs: bool,

    /// Theme name ("dark" or "light")
    pub theme: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "HPC CLUSTER MONITOR".to_string(),
            node_pane_width: 42,
            compact_jobs: false,
            theme: "dark".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Enable clipboard support
    pub copy_to_clipboard: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: true,
        }
    }
}

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl SmonConfig {
    /// Get the user config file path, respecting XDG_CONFIG_HOME
    ///
    /// Resolution order:
    /// 1. $XDG_CONFIG_HOME/smon/config.toml (if XDG_CONFIG_HOME is set)
    /// 2. $HOME/.config/smon/config.toml (if HOME is set)
    /// 3. dirs::config_dir()/smon/config.toml
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return Some(PathBuf::from(xdg_config).join("smon/config.toml"));
        }

        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config/smon/config.toml"));
        }

        dirs::config_dir().map(|dir| dir.join("smon/config.toml"))
    }

    /// Load configuration from the standard files and the process environment.
    ///
    /// Returns the config and any warnings encountered during loading. With
    /// `SMON_STRICT_CONFIG` set, anything that would be a warning is an error.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
        paths.extend(Self::user_config_path());
        Self::load_from(&paths, |key| std::env::var(key).ok())
    }

    /// Load from explicit files, reading environment overrides through `env`.
    pub fn load_from(
        paths: &[PathBuf],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, Vec<String>)> {
        let strict = env("SMON_STRICT_CONFIG").is_some_and(|v| is_truthy(&v));
        let mut config = Self::default();
        let mut warnings = Vec::new();

        for path in paths {
            config.load_config_file(path, strict, &mut warnings)?;
        }

        config.apply_env_overrides(&env, strict, &mut warnings)?;

        match config.refresh.validate(strict) {
            Ok(validation_warnings) => warnings.extend(validation_warnings),
            Err(err) => bail!("{err} (SMON_STRICT_CONFIG is set - config errors are fatal)"),
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        Ok((config, warnings))
    }

    /// Load a config file, collecting warnings on parse errors but not on missing files.
    fn load_config_file(
        &mut self,
        path: &Path,
        strict: bool,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let problem = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<SmonConfig>(&content) {
                Ok(parsed) => {
                    tracing::debug!(path = %path.display(), "loaded config file");
                    self.merge(parsed);
                    return Ok(());
                }
                Err(e) => format!("Config parse error in '{}': {}", path.display(), e),
            },
            // File not found is expected and not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => format!("Could not read config '{}': {}", path.display(), e),
        };

        if strict {
            bail!("{problem} (SMON_STRICT_CONFIG is set - config errors are fatal)");
        }
        warnings.push(problem);
        Ok(())
    }

    fn merge(&mut self, other: SmonConfig) {
        // Keep an earlier slurm_bin_path unless the later file sets one
        self.system.slurm_bin_path = other
            .system
            .slurm_bin_path
            .or(self.system.slurm_bin_path.take());
        self.system.fake_data = other.system.fake_data;
        self.refresh = other.refresh;
        self.display = other.display;
        self.behavior = other.behavior;
    }

    fn apply_env_overrides(
        &mut self,
        env: &impl Fn(&str) -> Option<String>,
        strict: bool,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let mut report = |var: &str, value: &str, reason: &str| -> Result<()> {
            let msg = format!("Invalid value '{value}' for {var}: {reason}");
            if strict {
                bail!("{msg} (SMON_STRICT_CONFIG is set - config errors are fatal)");
            }
            warnings.push(format!("{msg} - ignored"));
            Ok(())
        };

        if let Some(val) = env("SMON_FAKE_DATA") {
            self.system.fake_data = is_truthy(&val);
        }

        if let Some(val) = env("SMON_SLURM_PATH")
            && !val.is_empty()
        {
            let path = PathBuf::from(&val);
            if path.is_dir() {
                self.system.slurm_bin_path = Some(path);
            } else {
                report("SMON_SLURM_PATH", &val, "not a valid directory")?;
            }
        }

        if let Some(val) = env("SMON_REFRESH") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs >= MIN_REFRESH_INTERVAL => self.refresh.interval = secs,
                Ok(_) => report(
                    "SMON_REFRESH",
                    &val,
                    &format!("must be at least {MIN_REFRESH_INTERVAL} second(s)"),
                )?,
                Err(_) => report(
                    "SMON_REFRESH",
                    &val,
                    "expected a positive integer (seconds)",
                )?,
            }
        }

        if let Some(val) = env("SMON_TITLE")
            && !val.trim().is_empty()
        {
            self.display.title = val;
        }
        if let Some(val) = env("SMON_THEME") {
            self.display.theme = val;
        }
        if env("SMON_NO_CLIPBOARD").is_some() {
            self.behavior.copy_to_clipboard = false;
        }

        Ok(())
    }

    /// Apply command-line flags, which take precedence over everything else.
    pub fn apply_cli(&mut self, fake: bool, interval: Option<u64>, title: Option<String>) {
        if fake {
            self.system.fake_data = true;
        }
        if let Some(secs) = interval {
            self.refresh.interval = secs.max(MIN_REFRESH_INTERVAL);
        }
        if let Some(title) = title {
            self.display.title = title;
        }
    }

    /// Name shown in the header: a fixed demo name in fake-data mode,
    /// otherwise `SLURM_CLUSTER_NAME` or the host name, upper-cased.
    #[must_use]
    pub fn cluster_name(&self) -> String {
        if self.system.fake_data {
            return DEMO_CLUSTER_NAME.to_string();
        }

        std::env::var("SLURM_CLUSTER_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "CLUSTER".to_string())
            .to_uppercase()
    }
}
