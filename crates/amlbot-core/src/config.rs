use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::{errors::Error, i18n::DEFAULT_LANGUAGE, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yml";
pub const DEFAULT_AML_BASE_URL: &str = "https://api.aml-provider.com";
pub const DEFAULT_LOG_FILE: &str = "bot.log";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Typed configuration, loaded once at startup and read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // AML provider
    pub aml_api_key: String,
    pub aml_base_url: String,

    // Logging; `None` means stderr
    pub log_level: String,
    pub log_file: Option<PathBuf>,

    // Status endpoint
    pub server_port: u16,

    // Translations; `None` means built-in tables
    pub default_language: String,
    pub translations_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    telegram: TelegramSection,
    aml: AmlSection,
    logging: LoggingSection,
    server: ServerSection,
    i18n: I18nSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TelegramSection {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AmlSection {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingSection {
    level: Option<String>,
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct I18nSection {
    default_language: Option<String>,
    dir: Option<String>,
}

impl Config {
    /// Load `.env`, then the YAML file named by `AMLBOT_CONFIG` (or `config/config.yml`),
    /// then validate required secrets.
    ///
    /// A missing default file falls back to environment defaults; a missing file that was
    /// named explicitly is an error.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let cfg = match resolve_config_path(&env_str)? {
            Some(path) => Self::load_file(&path)?,
            None => Self::defaults(&env_str),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw, &env_str)
    }

    /// Parse YAML after substituting `${VAR}` tokens through `lookup`.
    pub fn from_yaml_str(raw: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = substitute_env_vars(raw, lookup);
        let file = serde_yaml::from_str::<Option<FileConfig>>(&expanded)
            .map_err(|e| Error::Config(format!("failed to parse config file: {e}")))?
            .unwrap_or_default();

        let mut cfg = Self::defaults(lookup);
        cfg.apply(file);
        Ok(cfg)
    }

    /// Defaults used for every field the file leaves out.
    pub fn defaults(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            aml_api_key: lookup("AML_API_KEY").unwrap_or_default(),
            aml_base_url: DEFAULT_AML_BASE_URL.to_string(),
            log_level: "info".to_string(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            server_port: DEFAULT_SERVER_PORT,
            default_language: DEFAULT_LANGUAGE.to_string(),
            translations_dir: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN is required but not set".to_string(),
            ));
        }
        if self.aml_api_key.trim().is_empty() {
            return Err(Error::Config(
                "AML_API_KEY is required but not set".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&mut self, file: FileConfig) {
        if let Some(token) = file.telegram.token {
            self.telegram_bot_token = token.trim().to_string();
        }
        if let Some(key) = file.aml.api_key {
            self.aml_api_key = key.trim().to_string();
        }
        if let Some(url) = file.aml.base_url.and_then(non_empty) {
            self.aml_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(level) = file.logging.level.and_then(non_empty) {
            self.log_level = level.trim().to_string();
        }
        // An explicit empty `file:` switches logging to stderr.
        if let Some(file) = file.logging.file {
            self.log_file = non_empty(file).map(PathBuf::from);
        }
        if let Some(port) = file.server.port {
            self.server_port = port;
        }
        if let Some(lang) = file.i18n.default_language.and_then(non_empty) {
            self.default_language = lang.trim().to_lowercase();
        }
        if let Some(dir) = file.i18n.dir.and_then(non_empty) {
            self.translations_dir = Some(PathBuf::from(dir));
        }
    }
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"))
}

/// Replace `${VAR}` with `lookup(VAR)`; unset variables become empty strings.
pub fn substitute_env_vars(raw: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    env_var_re()
        .replace_all(raw, |caps: &Captures| {
            lookup(caps[1].trim()).unwrap_or_default()
        })
        .into_owned()
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Pick the config file: `AMLBOT_CONFIG` if set (it must exist), else the default path if
/// it exists, else `None`.
fn resolve_config_path(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Option<PathBuf>> {
    match lookup("AMLBOT_CONFIG").and_then(non_empty) {
        Some(explicit) => {
            let path = PathBuf::from(explicit);
            if path.exists() {
                Ok(Some(path))
            } else {
                Err(Error::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )))
            }
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            Ok(path.exists().then_some(path))
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
