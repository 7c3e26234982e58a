use std::fmt;

/// A range of characters in the normalized source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A label pointing at a span in the source.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self { span, message: message.into() }
    }
}

/// A complete diagnostic message, built with the `with_*` combinators
/// and rendered by `DiagnosticRenderer`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes 1-based line and column from a character offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.chars().enumerate() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line_num: usize) -> Option<String> {
    source.split('\n').nth(line_num - 1).map(str::to_string)
}

/// Renders diagnostics in the `error[E0101]: ... --> file:line:col`
/// style with underlined source excerpts.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self { source, file_name, use_color }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        self.render_header(&mut output, diagnostic);

        if let Some(label) = diagnostic.labels.first() {
            let (line, col) = line_col(self.source, label.span.start);
            output.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.blue("-->"),
                self.file_name,
                line,
                col
            ));

            if let Some(content) = line_content(self.source, line) {
                let gutter_width = line.to_string().len();
                output.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), self.blue("|")));
                output.push_str(&format!(
                    "{:>width$} {} {}\n",
                    self.blue(&line.to_string()),
                    self.blue("|"),
                    content,
                    width = gutter_width + 1
                ));

                let (end_line, end_col) = line_col(
                    self.source,
                    label.span.end.saturating_sub(1).max(label.span.start),
                );
                let underline_len = if end_line == line && end_col >= col {
                    end_col - col + 1
                } else {
                    1
                };
                let underline = format!(
                    "{}{}",
                    " ".repeat(col.saturating_sub(1)),
                    "^".repeat(underline_len.max(1))
                );
                output.push_str(&format!(
                    "{} {} {}",
                    " ".repeat(gutter_width + 1),
                    self.blue("|"),
                    self.red(&underline)
                ));
                if !label.message.is_empty() {
                    output.push(' ');
                    output.push_str(&self.red(&label.message));
                }
                output.push('\n');
            }
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.blue("="), note));
        }

        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => self.red_bold("error"),
            Severity::Warning => self.yellow_bold("warning"),
        };
        match &diagnostic.code {
            Some(code) => output.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code,
                self.bold(&diagnostic.message)
            )),
            None => output.push_str(&format!("{}: {}\n", severity, self.bold(&diagnostic.message))),
        }
    }

    fn styled(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        } else {
            s.to_string()
        }
    }

    fn red(&self, s: &str) -> String {
        self.styled("31", s)
    }

    fn red_bold(&self, s: &str) -> String {
        self.styled("1;31", s)
    }

    fn yellow_bold(&self, s: &str) -> String {
        self.styled("1;33", s)
    }

    fn blue(&self, s: &str) -> String {
        self.styled("34", s)
    }

    fn bold(&self, s: &str) -> String {
        self.styled("1", s)
    }
}

/// Convenience for rendering a batch of diagnostics against one source.
pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();
    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }
    output
}
