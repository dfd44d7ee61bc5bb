use colored::Colorize;

use rload_loader::LoadError;
use rload_scanner::LexError;

/// Renders CLI failures for the terminal.
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// Render an error and its causes. Lex errors get a source snippet with
    /// a caret under the offending character.
    pub fn render(&self, error: &anyhow::Error) -> String {
        let mut output = String::new();
        output.push_str(&self.format_label());
        output.push_str(": ");
        output.push_str(&error.to_string());

        if let Some(lex) = lex_error_of(error) {
            output.push('\n');
            output.push_str(&self.format_lex_error(lex));
            return output;
        }

        for cause in error.chain().skip(1) {
            output.push('\n');
            output.push_str(&self.format_cause(&cause.to_string()));
        }
        output
    }

    /// Format a lex error as a message line followed by the offending
    /// source line and a caret:
    ///
    ///   Unexpected character '}' at 2:1
    ///     2   }
    ///         ^
    pub fn format_lex_error(&self, error: &LexError) -> String {
        let mut out = format!(
            "  Unexpected character '{}' at {}:{}",
            error.character,
            error.line,
            error.column + 1
        );

        let line_text = error.snippet.lines().next().unwrap_or("");
        let indent: String = line_text
            .chars()
            .take(error.column as usize)
            .map(|ch| if ch == '\t' { '\t' } else { ' ' })
            .collect();
        let caret = if self.color {
            "^".red().bold().to_string()
        } else {
            "^".to_string()
        };

        out.push('\n');
        out.push_str(&format!("  {:>3}   {}", error.line, line_text));
        out.push('\n');
        out.push_str(&format!("        {indent}{caret}"));
        out
    }

    fn format_cause(&self, message: &str) -> String {
        let prefix = if self.color {
            "  caused by".dimmed().to_string()
        } else {
            "  caused by".to_string()
        };
        format!("{prefix}: {message}")
    }

    fn format_label(&self) -> String {
        if self.color {
            "error".red().bold().to_string()
        } else {
            "error".to_string()
        }
    }
}

fn lex_error_of(error: &anyhow::Error) -> Option<&LexError> {
    if let Some(lex) = error.downcast_ref::<LexError>() {
        return Some(lex);
    }
    match error.downcast_ref::<LoadError>() {
        Some(LoadError::Lex(lex)) => Some(lex),
        _ => None,
    }
}
