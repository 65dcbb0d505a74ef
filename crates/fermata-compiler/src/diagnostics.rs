use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of one compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Error,
    Warning,
    Note,
}

/// Primary source location of a diagnostic within the generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// One diagnostic reported by `rustc` for a dynamic build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        };
        match &self.span {
            Some(span) => write!(
                f,
                "{level}: {} ({}:{}:{})",
                self.message, span.file, span.line, span.column
            ),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

pub(crate) fn render(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    out
}

// Shape of the `--error-format=json` records we care about. rustc emits one
// JSON object per line; artifact notifications and other record types fail to
// deserialize here and are skipped.
#[derive(Deserialize)]
struct RawDiagnostic {
    message: String,
    level: String,
    spans: Vec<RawSpan>,
}

#[derive(Deserialize)]
struct RawSpan {
    file_name: String,
    line_start: usize,
    column_start: usize,
    is_primary: bool,
}

/// Parse the JSON diagnostic stream `rustc --error-format=json` writes to
/// stderr into the structured form.
pub(crate) fn parse_rustc_json(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<RawDiagnostic>(line).ok())
        .map(|raw| {
            let level = match raw.level.as_str() {
                "error" | "error: internal compiler error" => Level::Error,
                "warning" => Level::Warning,
                _ => Level::Note,
            };
            let span = raw
                .spans
                .iter()
                .find(|span| span.is_primary)
                .or_else(|| raw.spans.first())
                .map(|span| SourceSpan {
                    file: span.file_name.clone(),
                    line: span.line_start,
                    column: span.column_start,
                });
            Diagnostic {
                level,
                message: raw.message,
                span,
            }
        })
        .collect()
}
