/// Email address validation for the SMTP envelope.
///
/// Deliberately shallow: one `@`, non-empty local part and domain, and no
/// characters that would break the `MAIL FROM:<...>` / `RCPT TO:<...>`
/// command syntax. The relay has the final word on deliverability.
use crate::error::DispatchError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Validate and wrap an address. Surrounding whitespace is trimmed.
    pub fn new(addr: &str) -> Result<Self, DispatchError> {
        let addr = addr.trim();
        if addr.is_empty() {
            return Err(DispatchError::invalid_address(addr, "address is empty"));
        }
        if let Some(bad) = addr
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ',' | ';'))
        {
            return Err(DispatchError::invalid_address(
                addr,
                format!("contains forbidden character {bad:?}"),
            ));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(DispatchError::invalid_address(addr, "missing '@'"));
        };
        if domain.contains('@') {
            return Err(DispatchError::invalid_address(addr, "more than one '@'"));
        }
        if local.is_empty() || domain.is_empty() {
            return Err(DispatchError::invalid_address(
                addr,
                "local part and domain must both be non-empty",
            ));
        }
        if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
            return Err(DispatchError::invalid_address(addr, "malformed domain"));
        }

        Ok(Self(addr.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
