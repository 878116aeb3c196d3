//! Quoting helpers for SQL generated at runtime

use super::MigrationError;

/// Longest identifier accepted by [`enquote_identifier`]
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Wrap `value` in single quotes, doubling embedded single quotes
///
/// ```
/// use lifeguard_schema::migration::enquote_literal;
///
/// assert_eq!(enquote_literal("O'Brien"), "'O''Brien'");
/// ```
pub fn enquote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Wrap `name` in double quotes after checking it is a usable identifier
///
/// Accepts 1 to 128 characters free of NUL and `"`, which covers every plain identifier
/// (`[A-Za-z][A-Za-z0-9_]*`) as well as names that only work quoted. Text that is already
/// wrapped in double quotes is unwrapped first.
///
/// # Errors
///
/// Returns `MigrationError::InvalidIdentifier` for empty, oversized or unquotable names.
pub fn enquote_identifier(name: &str) -> Result<String, MigrationError> {
    let unwrapped = match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(inner) => inner,
        None => name,
    };

    let len = unwrapped.chars().count();
    if len == 0 || len > MAX_IDENTIFIER_LEN {
        return Err(MigrationError::InvalidIdentifier(name.to_string()));
    }

    if !unwrapped.contains(['\0', '"']) {
        Ok(format!("\"{unwrapped}\""))
    } else {
        Err(MigrationError::InvalidIdentifier(name.to_string()))
    }
}
