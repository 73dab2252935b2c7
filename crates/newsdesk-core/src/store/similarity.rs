use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// Registers the `similarity(a, b)` scalar on a connection. This is the
/// fuzzy primitive the scorer consumes: a normalized [0,1] closeness score
/// between two strings, tolerant of spelling and partial-word variation.
pub(super) fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let left = ctx.get::<Option<String>>(0)?.unwrap_or_default();
            let right = ctx.get::<Option<String>>(1)?.unwrap_or_default();
            Ok(bigram_similarity(&left, &right))
        },
    )
}

/// Case-insensitive Sørensen–Dice similarity over character bigrams.
#[must_use]
pub fn bigram_similarity(left: &str, right: &str) -> f64 {
    strsim::sorensen_dice(&left.to_lowercase(), &right.to_lowercase())
}
