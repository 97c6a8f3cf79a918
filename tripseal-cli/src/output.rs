// Terminal rendering for command results and vault failures

use std::fmt::Display;

use colored::Colorize;
use serde::Serialize;
use tripseal_core::VaultError;

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn print_success(message: impl Display) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_info(message: impl Display) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Aligned `label: value` line
pub fn print_field(label: &str, value: impl Display) {
    println!("  {:<14} {}", format!("{label}:").dimmed(), value);
}

/// Vault failure on stderr: message, kind, then what the user can do about it
pub fn print_failure(err: &VaultError) {
    for line in failure_lines(err) {
        eprintln!("{line}");
    }
}

fn failure_lines(err: &VaultError) -> [String; 2] {
    let kind = err.kind();
    [
        format!("{} {} {}", "✗".red(), err, format!("[{kind}]").dimmed()),
        format!("  {}", kind.hint().yellow()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_names_kind_and_hint() {
        colored::control::set_override(false);

        let [first, second] = failure_lines(&VaultError::AuthorizationDenied);
        assert_eq!(
            first,
            format!(
                "✗ Decryption authorization denied by user [{}]",
                tripseal_core::ErrorKind::AuthorizationDenied
            )
        );
        assert_eq!(second, "  Authorize decryption in your wallet to continue.");
    }
}
