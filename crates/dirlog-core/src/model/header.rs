/// Log header: the capture instant plus who ran the traversal and where.
use chrono::{DateTime, Local, TimeZone};

/// Fallback used when the OS cannot report a host or user name.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Host and user identity recorded in the log header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub username: String,
}

impl HostIdentity {
    /// Build an identity, substituting [`UNKNOWN_IDENTITY`] for blank values
    /// so the header never carries an empty field.
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: non_blank(hostname.into()),
            username: non_blank(username.into()),
        }
    }

    /// Identity of the current process, as reported by the OS.
    pub fn current() -> Self {
        Self::new(crate::platform::hostname(), crate::platform::username())
    }
}

fn non_blank(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN_IDENTITY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Everything written above the first folder block.
#[derive(Debug, Clone)]
pub struct LogHeader {
    /// Local time at which the traversal was started.
    pub captured_at: DateTime<Local>,
    pub host: HostIdentity,
}

impl LogHeader {
    pub fn new(captured_at: DateTime<Local>, host: HostIdentity) -> Self {
        Self { captured_at, host }
    }

    /// Capture the current instant and the current host identity.
    pub fn capture() -> Self {
        Self::new(Local::now(), HostIdentity::current())
    }

    /// Build a header from a fixed local wall-clock time. Returns `None` for
    /// times that do not exist in the local zone (DST gaps).
    pub fn at_local(
        date: chrono::NaiveDateTime,
        host: HostIdentity,
    ) -> Option<Self> {
        Local
            .from_local_datetime(&date)
            .earliest()
            .map(|captured_at| Self::new(captured_at, host))
    }

    /// `YYYY-MM-DD`.
    pub fn date(&self) -> String {
        self.captured_at.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM:SS.ffffff`: always six fractional digits.
    pub fn time(&self) -> String {
        self.captured_at.format("%H:%M:%S%.6f").to_string()
    }

    /// Full English weekday name, e.g. `Monday`.
    pub fn weekday(&self) -> String {
        self.captured_at.format("%A").to_string()
    }
}
