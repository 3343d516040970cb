// Record Field Sanitation
//
// Rejects free-text field values carrying characters that must never reach
// a query. Values are bound as data downstream; this check keeps the
// historical contract of refusing them outright.

use crate::outcome::Rejection;

/// Characters refused in street and postcode values.
pub const FORBIDDEN: [char; 3] = [';', '"', '\''];

/// Scan `street`, then `postcode`, stopping at the first forbidden character.
pub fn check(street: &str, postcode: &str) -> Result<(), Rejection> {
    for field in [street, postcode] {
        if let Some(c) = field.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(Rejection::ForbiddenChar(c));
        }
    }
    Ok(())
}
