//! Console icons shared by all commands.

use console::{style, StyledObject};

/// Green check for completed steps.
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

/// Yellow bang for per-listing problems that did not stop the crawl.
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Indented secondary detail line.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}
