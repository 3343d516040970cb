// Table Identifier Validation
//
// Allow-list check applied to every caller-supplied table name before the
// name is used as a storage key. Pure and store-independent.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::outcome::Rejection;

/// Suffix reserved for a table's rollback snapshot.
pub const ROLLBACK_MARKER: &str = "_rb";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid")
    })
}

/// Validate a proposed table name.
///
/// The character pattern is checked first, then the reserved marker.
pub fn validate(name: &str) -> Result<(), Rejection> {
    if !name_pattern().is_match(name) {
        return Err(Rejection::InvalidName);
    }

    if name.contains(ROLLBACK_MARKER) {
        return Err(Rejection::ReservedMarker);
    }

    Ok(())
}

/// Name under which a table's rollback snapshot is listed.
pub fn rollback_name(table: &str) -> String {
    format!("{table}{ROLLBACK_MARKER}")
}
