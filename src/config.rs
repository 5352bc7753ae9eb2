use crate::defaults;
use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub synthesis: SynthesisConfig,
    pub jobs: JobsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

/// Blob store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for audio blobs; `None` means the platform data dir.
    pub dir: Option<PathBuf>,
    /// Keep blobs in memory only (lost on restart).
    pub in_memory: bool,
    pub max_upload_bytes: usize,
}

/// Transcription engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub language: String,
    pub script: String,
    pub segment_count: usize,
    pub fallback_segment_secs: f64,
}

/// Synthesis engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub max_text_chars: usize,
    pub sample_rate: u32,
}

/// Job orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::BIND_ADDR.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            in_memory: false,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            script: defaults::TRANSCRIPT_SCRIPT.to_string(),
            segment_count: defaults::SEGMENT_COUNT,
            fallback_segment_secs: defaults::FALLBACK_SEGMENT_SECS,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_text_chars: defaults::MAX_TEXT_CHARS,
            sample_rate: defaults::SYNTHESIS_SAMPLE_RATE,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| VoxError::ConfigParse {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoxError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXSHIFT_BIND → server.bind
    /// - VOXSHIFT_STORAGE_DIR → storage.dir
    /// - VOXSHIFT_LANGUAGE → transcription.language
    /// - VOXSHIFT_MAX_TEXT_CHARS → synthesis.max_text_chars (ignored unless numeric)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bind) = std::env::var("VOXSHIFT_BIND")
            && !bind.is_empty()
        {
            self.server.bind = bind;
        }

        if let Ok(dir) = std::env::var("VOXSHIFT_STORAGE_DIR")
            && !dir.is_empty()
        {
            self.storage.dir = Some(PathBuf::from(dir));
        }

        if let Ok(language) = std::env::var("VOXSHIFT_LANGUAGE")
            && !language.is_empty()
        {
            self.transcription.language = language;
        }

        if let Ok(limit) = std::env::var("VOXSHIFT_MAX_TEXT_CHARS")
            && let Ok(limit) = limit.parse::<usize>()
        {
            self.synthesis.max_text_chars = limit;
        }

        self
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, bool); 6] = [
            ("storage.max_upload_bytes", self.storage.max_upload_bytes > 0),
            ("transcription.segment_count", self.transcription.segment_count > 0),
            (
                "transcription.fallback_segment_secs",
                self.transcription.fallback_segment_secs > 0.0,
            ),
            ("synthesis.max_text_chars", self.synthesis.max_text_chars > 0),
            ("synthesis.sample_rate", self.synthesis.sample_rate > 0),
            ("jobs.request_timeout_secs", self.jobs.request_timeout_secs > 0),
        ];
        for (key, ok) in checks {
            if !ok {
                return Err(VoxError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.transcription.script.trim().is_empty() {
            return Err(VoxError::ConfigInvalidValue {
                key: "transcription.script".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Engine call timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.jobs.request_timeout_secs)
    }

    /// Directory the filesystem blob store writes into.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from(".local/share"))
                .join("voxshift")
                .join("blobs")
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxshift/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("voxshift")
            .join("config.toml")
    }

    /// Render the full configuration as TOML.
    pub fn to_display_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VoxError::Other(e.to_string()))
    }

    /// Look up a value by dotted path, e.g. `server.bind`.
    pub fn get_value_by_path(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self).map_err(|e| VoxError::Other(e.to_string()))?;
        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| VoxError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "unknown key".to_string(),
                })?;
        }
        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voxshift_env() {
        remove_env("VOXSHIFT_BIND");
        remove_env("VOXSHIFT_STORAGE_DIR");
        remove_env("VOXSHIFT_LANGUAGE");
        remove_env("VOXSHIFT_MAX_TEXT_CHARS");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.storage.dir, None);
        assert!(!config.storage.in_memory);
        assert_eq!(config.storage.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.transcription.language, "en");
        assert_eq!(config.transcription.segment_count, 3);
        assert_eq!(config.transcription.fallback_segment_secs, 2.5);
        assert_eq!(config.synthesis.max_text_chars, 5000);
        assert_eq!(config.synthesis.sample_rate, 16000);
        assert_eq!(config.jobs.request_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [server]
            bind = "0.0.0.0:9000"

            [storage]
            dir = "/var/lib/voxshift"
            max_upload_bytes = 1024

            [transcription]
            language = "ko"
            segment_count = 5

            [synthesis]
            max_text_chars = 200
            sample_rate = 22050

            [jobs]
            request_timeout_secs = 5
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.storage.dir, Some(PathBuf::from("/var/lib/voxshift")));
        assert_eq!(config.storage.max_upload_bytes, 1024);
        assert_eq!(config.transcription.language, "ko");
        assert_eq!(config.transcription.segment_count, 5);
        assert_eq!(config.synthesis.max_text_chars, 200);
        assert_eq!(config.synthesis.sample_rate, 22050);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [synthesis]
            max_text_chars = 42
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.synthesis.max_text_chars, 42);
        assert_eq!(config.synthesis.sample_rate, 16000);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.transcription, TranscriptionConfig::default());
    }

    #[test]
    fn test_env_override_bind() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxshift_env();

        set_env("VOXSHIFT_BIND", "0.0.0.0:1234");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.bind, "0.0.0.0:1234");
        assert_eq!(config.transcription.language, "en");

        clear_voxshift_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxshift_env();

        set_env("VOXSHIFT_BIND", "[::1]:8080");
        set_env("VOXSHIFT_STORAGE_DIR", "/tmp/blobs");
        set_env("VOXSHIFT_LANGUAGE", "de");
        set_env("VOXSHIFT_MAX_TEXT_CHARS", "99");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.bind, "[::1]:8080");
        assert_eq!(config.storage.dir, Some(PathBuf::from("/tmp/blobs")));
        assert_eq!(config.transcription.language, "de");
        assert_eq!(config.synthesis.max_text_chars, 99);

        clear_voxshift_env();
    }

    #[test]
    fn test_env_override_empty_or_garbage_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxshift_env();

        set_env("VOXSHIFT_BIND", "");
        set_env("VOXSHIFT_MAX_TEXT_CHARS", "lots");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.synthesis.max_text_chars, 5000);

        clear_voxshift_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [server
            bind = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(VoxError::ConfigParse { .. })));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_voxshift_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[jobs\nrequest_timeout_secs = ").unwrap();

        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.synthesis.max_text_chars = 0;
        match config.validate() {
            Err(VoxError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "synthesis.max_text_chars");
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }

        let mut config = Config::default();
        config.transcription.script = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("voxshift"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_storage_dir_prefers_configured_dir() {
        let mut config = Config::default();
        config.storage.dir = Some(PathBuf::from("/srv/audio"));
        assert_eq!(config.storage_dir(), PathBuf::from("/srv/audio"));

        config.storage.dir = None;
        assert!(config.storage_dir().ends_with("voxshift/blobs"));
    }

    #[test]
    fn test_get_value_by_path() {
        let config = Config::default();
        assert_eq!(config.get_value_by_path("server.bind").unwrap(), "127.0.0.1:8000");
        assert_eq!(
            config.get_value_by_path("synthesis.max_text_chars").unwrap(),
            "5000"
        );
        assert!(config.get_value_by_path("server.nope").is_err());
    }

    #[test]
    fn test_display_toml_roundtrips() {
        let config = Config::default();
        let rendered = config.to_display_toml().unwrap();
        assert!(rendered.contains("[server]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
