// Output formatting and styling

use colored::Colorize;
use ochat_sessions::{Span, SpanKind};

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    pub fn code(&self, code: &str) -> String {
        if self.use_colors {
            code.cyan().to_string()
        } else {
            code.to_string()
        }
    }

    /// Format prompt
    pub fn prompt(&self, prompt: &str) -> String {
        if self.use_colors {
            format!("{} ", prompt.magenta().bold())
        } else {
            format!("{} ", prompt)
        }
    }

    /// Format header
    pub fn header(&self, title: &str) -> String {
        if self.use_colors {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a key-value pair
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.use_colors {
            format!("  {}: {}", key.bold(), value)
        } else {
            format!("  {}: {}", key, value)
        }
    }

    /// Format a list item
    pub fn list_item(&self, item: &str) -> String {
        format!("  • {}", item)
    }

    /// Reasoning text, set apart from the answer
    pub fn reasoning(&self, text: &str) -> String {
        if self.use_colors {
            text.dimmed().italic().to_string()
        } else {
            text.to_string()
        }
    }

    /// One segmented span, styled by kind
    pub fn span(&self, span: &Span) -> String {
        match span.kind {
            SpanKind::Reasoning => self.reasoning(&span.text),
            SpanKind::Answer => span.text.clone(),
        }
    }

    /// Model size as shown next to its name
    pub fn size(&self, megabytes: u64) -> String {
        let text = format!("{} MB", megabytes);
        if self.use_colors {
            text.dimmed().to_string()
        } else {
            text
        }
    }
}

/// Print an error to stderr
pub fn print_error(msg: &str) {
    let style = OutputStyle::default();
    eprintln!("{}", style.error(msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> OutputStyle {
        OutputStyle { use_colors: false }
    }

    #[test]
    fn test_output_style_without_colors() {
        let style = plain();
        assert_eq!(style.success("test"), "✓ test");
        assert_eq!(style.error("test"), "✗ test");
        assert_eq!(style.info("test"), "ℹ test");
    }

    #[test]
    fn test_key_value_formatting() {
        let result = plain().key_value("host", "http://127.0.0.1");
        assert_eq!(result, "  host: http://127.0.0.1");
    }

    #[test]
    fn test_span_without_colors_is_raw_text() {
        let style = plain();
        let reasoning = Span {
            kind: SpanKind::Reasoning,
            text: "hmm".to_string(),
        };
        let answer = Span {
            kind: SpanKind::Answer,
            text: "yes".to_string(),
        };
        assert_eq!(style.span(&reasoning), "hmm");
        assert_eq!(style.span(&answer), "yes");
    }

    #[test]
    fn test_reasoning_is_styled_with_colors() {
        colored::control::set_override(true);
        let style = OutputStyle { use_colors: true };
        let styled = style.reasoning("hmm");
        assert!(styled.contains("hmm"));
        assert_ne!(styled, "hmm");
        colored::control::unset_override();
    }

    #[test]
    fn test_size_formatting() {
        assert_eq!(plain().size(4096), "4096 MB");
    }
}
