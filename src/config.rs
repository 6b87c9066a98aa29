use crate::models::ContainerFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Overrides the config search path.
pub const CONFIG_ENV: &str = "VIGGA_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub ytdlp: YtDlpConfig,

    pub downloads: DownloadConfig,

    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Optional file receiving a full debug log next to the console output.
    pub log_file: Option<String>,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            log_file: None,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    pub binary: String,

    /// Placed before all other arguments, e.g. `["-m", "yt_dlp"]` with
    /// `binary = "python3"`.
    pub binary_args: Vec<String>,

    /// Passed to every yt-dlp invocation before the URL.
    pub extra_args: Vec<String>,

    pub lookup_timeout_seconds: u64,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            binary_args: vec![],
            extra_args: vec![],
            lookup_timeout_seconds: 60,
        }
    }
}

impl YtDlpConfig {
    #[must_use]
    pub fn command(&self) -> tokio::process::Command {
        let mut cmd = crate::process::command(&self.binary);
        cmd.args(&self.binary_args);
        cmd
    }

    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub output_dir: String,

    /// yt-dlp output template, relative to `output_dir`.
    pub output_template: String,

    pub default_container: ContainerFormat,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            output_template: "%(title)s.%(ext)s".to_string(),
            default_container: ContainerFormat::Mp4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,

    /// Branch to push/pull; the checked-out branch when unset.
    pub branch: Option<String>,

    pub push_retries: u32,

    pub pull_retries: u32,

    pub retry_delay_seconds: u64,

    /// Prefix of generated commit messages, followed by a timestamp.
    pub message_prefix: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: None,
            push_retries: 3,
            pull_retries: 3,
            retry_delay_seconds: 3,
            message_prefix: "Auto-update".to_string(),
        }
    }
}

impl Config {
    /// Loads the first config file found by [`Config::locate`], or defaults.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::locate() else {
            info!("No config file found, using defaults");
            return Ok(Self::default());
        };

        info!(path = %path.display(), "Loading config");
        Self::load_from_path(&path)
    }

    /// `$VIGGA_CONFIG` when set, otherwise the first existing search path.
    #[must_use]
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        Self::config_paths().into_iter().find(|p| p.is_file())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;

        toml::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }

        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// `./config.toml`, then the per-user config directory, then `~/.vigga`.
    #[must_use]
    pub fn config_paths() -> Vec<PathBuf> {
        let user_dirs = [
            dirs::config_dir().map(|d| d.join("vigga")),
            dirs::home_dir().map(|d| d.join(".vigga")),
        ];

        std::iter::once(PathBuf::from(DEFAULT_CONFIG_FILE))
            .chain(user_dirs.into_iter().flatten().map(|d| d.join(DEFAULT_CONFIG_FILE)))
            .collect()
    }

    /// Writes a default `./config.toml`; returns `false` if one exists.
    pub fn create_default_if_missing() -> Result<bool> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(path)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ytdlp.binary.trim().is_empty() {
            anyhow::bail!("ytdlp.binary cannot be empty");
        }

        if self.ytdlp.lookup_timeout_seconds == 0 {
            anyhow::bail!("ytdlp.lookup_timeout_seconds must be > 0");
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "general.log_format must be \"pretty\" or \"json\", got \"{}\"",
                self.general.log_format
            );
        }

        if self.git.remote.trim().is_empty() {
            anyhow::bail!("git.remote cannot be empty");
        }

        if self.git.push_retries == 0 || self.git.pull_retries == 0 {
            anyhow::bail!("git retry counts must be at least 1");
        }

        Ok(())
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.downloads.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = Config::default();
        assert_eq!(defaults.ytdlp.binary, "yt-dlp");
        assert_eq!(defaults.git.remote, "origin");
        assert_eq!(defaults.git.push_retries, 3);
        assert_eq!(defaults.downloads.default_container, ContainerFormat::Mp4);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_written_config_has_every_section() {
        let written = toml::to_string_pretty(&Config::default()).unwrap();
        for section in ["[general]", "[ytdlp]", "[downloads]", "[git]"] {
            assert!(written.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let partial = r#"
            [general]
            log_level = "debug"

            [downloads]
            default_container = "mkv"

            [git]
            branch = "main"
        "#;

        let parsed: Config = toml::from_str(partial).unwrap();
        assert_eq!(parsed.general.log_level, "debug");
        assert_eq!(parsed.general.log_format, "pretty");
        assert_eq!(parsed.downloads.default_container, ContainerFormat::Mkv);
        assert_eq!(parsed.git.branch.as_deref(), Some("main"));
        assert_eq!(parsed.ytdlp.lookup_timeout_seconds, 60);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut bad_format = Config::default();
        bad_format.general.log_format = "xml".to_string();
        assert!(bad_format.validate().is_err());

        let mut no_retries = Config::default();
        no_retries.git.push_retries = 0;
        assert!(no_retries.validate().is_err());

        let mut no_binary = Config::default();
        no_binary.ytdlp.binary = "  ".to_string();
        assert!(no_binary.validate().is_err());
    }

    #[test]
    fn test_search_starts_in_working_directory() {
        let paths = Config::config_paths();
        assert_eq!(paths[0], PathBuf::from("config.toml"));
        assert!(paths.iter().all(|p| p.ends_with("config.toml")));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut saved = Config::default();
        saved.ytdlp.extra_args = vec!["--cookies".to_string(), "c.txt".to_string()];
        saved.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.ytdlp.extra_args, saved.ytdlp.extra_args);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\nlog_level = 1").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config in"));
    }
}
