//! POSIX shell quoting and sudo wrapping for remote command lines.

use std::path::Path;

use super::Privilege;

/// Quote `arg` for a POSIX shell.
///
/// Words made only of safe characters pass through unchanged; anything else
/// is wrapped in single quotes with embedded quotes spliced as `'\''`.
pub fn quote(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | '+' | ',')
}

pub fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Join already-split words into one command line.
pub fn join<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|word| quote(word.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap `script` so it runs under `privilege`.
///
/// Uses `sudo -n`, so the login account needs passwordless sudo for the
/// commands jarlift issues.
pub fn with_privilege(privilege: &Privilege, script: &str) -> String {
    match privilege {
        Privilege::Login => script.to_string(),
        Privilege::User(name) => {
            format!("sudo -n -u {} -- sh -c {}", quote(name), quote(script))
        }
        Privilege::Root => format!("sudo -n -- sh -c {}", quote(script)),
    }
}
