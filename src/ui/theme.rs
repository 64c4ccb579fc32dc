//! Visual theme and styling.

use console::Style;

use super::output::Severity;

/// Colors and symbols for status output.
#[derive(Debug, Clone)]
pub struct EnvyTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
}

impl Default for EnvyTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvyTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
        }
    }

    /// The colored theme when colors are enabled, otherwise the plain one.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Style and prefix a line according to its severity.
    pub fn render(&self, severity: Severity, msg: &str) -> String {
        match severity {
            Severity::Plain => msg.to_string(),
            Severity::Header => {
                format!("{} {}", self.header.apply_to("▲"), self.highlight.apply_to(msg))
            }
            Severity::Success => self.success.apply_to(format!("✓ {}", msg)).to_string(),
            Severity::Warning => self.warning.apply_to(format!("⚠ {}", msg)).to_string(),
            Severity::Error => self.error.apply_to(format!("✗ {}", msg)).to_string(),
        }
    }
}

/// Check if colors should be enabled on stderr.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::colors_enabled_stderr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_status_symbols() {
        let theme = EnvyTheme::plain();
        assert_eq!(theme.render(Severity::Success, "Ready"), "✓ Ready");
        assert_eq!(theme.render(Severity::Warning, "Rebuilding"), "⚠ Rebuilding");
        assert_eq!(theme.render(Severity::Error, "Failed"), "✗ Failed");
        assert_eq!(theme.render(Severity::Plain, "Probing"), "Probing");
    }

    #[test]
    fn theme_formats_header() {
        let theme = EnvyTheme::plain();
        assert_eq!(theme.render(Severity::Header, "viewer.py"), "▲ viewer.py");
    }
}
