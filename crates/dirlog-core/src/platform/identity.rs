/// Host and user name lookups for the log header.
///
/// Both functions return an empty string when the OS has no answer;
/// [`HostIdentity::new`](crate::model::HostIdentity::new) substitutes a
/// placeholder so the header stays well-formed.
use tracing::warn;

/// Environment variables consulted for the login name, in order.
const USER_ENV_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Network host name of this machine.
pub fn hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            warn!("Could not determine host name: {err}");
            String::new()
        }
    }
}

/// Login name of the user running the process.
///
/// The usual login environment variables win; on Unix the password
/// database entry for the real uid is the fallback.
pub fn username() -> String {
    username_from_env(|name| std::env::var(name).ok()).unwrap_or_else(username_from_os)
}

fn username_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    USER_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

#[cfg(unix)]
fn username_from_os() -> String {
    use nix::unistd::{getuid, User};

    match User::from_uid(getuid()) {
        Ok(Some(user)) => user.name,
        Ok(None) => {
            warn!("No passwd entry for uid {}", getuid());
            String::new()
        }
        Err(err) => {
            warn!("Could not look up current user: {err}");
            String::new()
        }
    }
}

#[cfg(not(unix))]
fn username_from_os() -> String {
    String::new()
}
