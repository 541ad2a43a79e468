/// Run configuration: SMTP relay, credentials, message text and artifact
/// handling.
///
/// Load order is defaults, then a JSON file, then `DIRLOG_*` environment
/// overrides, then validation. Credentials are never compiled in; when
/// they are absent the run still completes and dispatch reports
/// [`DispatchError::MissingCredentials`](crate::DispatchError::MissingCredentials).
use crate::error::ConfigError;
use crate::report::DEFAULT_ARTIFACT_NAME;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Transport security for the SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// TLS from the first byte (usually port 465).
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// No encryption. Only sensible for local relays and tests.
    None,
}

impl std::str::FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            "none" | "plain" => Ok(Self::None),
            other => Err(format!("expected tls, starttls or none, got {other:?}")),
        }
    }
}

/// Outbound relay settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Name announced in EHLO.
    pub helo_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            security: Security::Tls,
            username: None,
            password: None,
            helo_name: "localhost".to_string(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("helo_name", &self.helo_name)
            .finish()
    }
}

/// Fixed text of the outgoing message.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Sender address. Defaults to the SMTP username.
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            from: None,
            subject: "Directory log".to_string(),
            body: "This is a system generated email, kindly do not reply.".to_string(),
        }
    }
}

/// Full configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub smtp: SmtpConfig,
    pub message: MessageConfig,
    /// File name of the log artifact in the working directory.
    pub artifact_name: String,
    /// Keep the artifact instead of trashing it when dispatch fails.
    pub keep_log_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig::default(),
            message: MessageConfig::default(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            keep_log_on_failure: false,
        }
    }
}

impl Config {
    /// `<config dir>/dirlog/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dirlog").join("config.json"))
    }

    /// Load from `path` (must exist) or the default path (optional), then
    /// apply process environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(explicit) if !explicit.exists() => {
                return Err(ConfigError::Missing {
                    path: explicit.to_path_buf(),
                })
            }
            Some(explicit) => Self::from_file(explicit)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        cfg.apply_env_overrides(env)?;
        cfg.validate()?;
        debug!("Effective config: {cfg:?}");
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |name: &str| env(name).filter(|raw| !raw.trim().is_empty());

        if let Some(v) = get("DIRLOG_SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Some(v) = get("DIRLOG_SMTP_PORT") {
            self.smtp.port = parse_env("DIRLOG_SMTP_PORT", v)?;
        }
        if let Some(v) = get("DIRLOG_SMTP_SECURITY") {
            self.smtp.security = parse_env("DIRLOG_SMTP_SECURITY", v)?;
        }
        if let Some(v) = get("DIRLOG_SMTP_USERNAME") {
            self.smtp.username = Some(v);
        }
        if let Some(v) = get("DIRLOG_SMTP_PASSWORD") {
            self.smtp.password = Some(v);
        }
        if let Some(v) = get("DIRLOG_FROM") {
            self.message.from = Some(v);
        }
        if let Some(v) = get("DIRLOG_SUBJECT") {
            self.message.subject = v;
        }
        if let Some(v) = get("DIRLOG_ARTIFACT_NAME") {
            self.artifact_name = v;
        }
        if let Some(v) = get("DIRLOG_KEEP_LOG_ON_FAILURE") {
            self.keep_log_on_failure = parse_bool("DIRLOG_KEEP_LOG_ON_FAILURE", v)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.host.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp.host must not be empty".into()));
        }
        if self.smtp.port == 0 {
            return Err(ConfigError::Invalid("smtp.port must be > 0".into()));
        }
        let name = Path::new(&self.artifact_name);
        let is_bare = name.file_name().is_some_and(|f| f == name.as_os_str());
        if self.artifact_name.is_empty() || !is_bare {
            return Err(ConfigError::Invalid(format!(
                "artifact_name must be a plain file name, got {:?}",
                self.artifact_name
            )));
        }
        Ok(())
    }

    /// Envelope sender: `message.from`, else the SMTP username.
    pub fn sender(&self) -> Option<&str> {
        self.message
            .from
            .as_deref()
            .or(self.smtp.username.as_deref())
    }

    /// Username and password, if both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.smtp.username, &self.smtp.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Artifact location inside `dir`.
    pub fn artifact_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.artifact_name)
    }
}

fn parse_env<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|err| ConfigError::Env {
        name,
        details: err.to_string(),
        value,
    })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            name,
            value,
            details: "expected true or false".to_string(),
        }),
    }
}
