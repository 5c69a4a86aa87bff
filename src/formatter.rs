use crate::{driver::DriverError, lexer::Span};
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::{ops::Range, path::Path};

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ErrorFormatter {
    fn format_error(&self, error: &DriverError) -> String;
}

/// The one-line form stored in `ExecutionState.error`.
pub struct BasicFormatter;

impl ErrorFormatter for BasicFormatter {
    fn format_error(&self, error: &DriverError) -> String {
        error.to_string()
    }
}

/// Source-annotated reports for the terminal.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
    color: bool,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self {
            text,
            path,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn clamp(&self, span: Span) -> Range<usize> {
        let end = self.text.len();
        let range = span.range();
        range.start.min(end)..range.end.min(end)
    }

    fn report(&self, code: &str, title: &str, message: &str, span: Span) -> String {
        let path = self.path.to_string_lossy();
        let path = path.as_ref();
        let range = self.clamp(span);
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, range.clone()))
            .with_config(Config::default().with_color(self.color))
            .with_code(code)
            .with_message(title)
            .with_label(
                Label::new((path, range))
                    .with_message(message)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}

impl ErrorFormatter for PrettyFormatter<'_> {
    fn format_error(&self, error: &DriverError) -> String {
        match error {
            DriverError::Syntax(e) if e.incomplete => {
                self.report(e.code, "Incomplete statement", &e.message, e.span)
            }
            DriverError::Syntax(e) => self.report(e.code, "Syntax error", &e.message, e.span),
            DriverError::Runtime(e) => self.report(e.code, "Runtime error", &e.message, e.span),
            DriverError::NotReady | DriverError::Capture(_) => error.to_string(),
        }
    }
}
