//! Status icons for CLI output.

use console::{style, StyledObject};

/// Green check mark for success messages.
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Cyan arrow for informational messages.
pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

/// Yellow exclamation for warnings.
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Red cross for errors.
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Dimmed arrow for nested detail lines.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icons_render() {
        console::set_colors_enabled(false);
        assert_eq!(success().to_string(), "✓");
        assert_eq!(info().to_string(), "→");
        assert_eq!(warn().to_string(), "!");
        assert_eq!(error().to_string(), "✗");
        assert_eq!(dim_arrow().to_string(), "→");
    }
}
