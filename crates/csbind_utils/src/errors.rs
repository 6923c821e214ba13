use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::span::Span;

/// A located error in a model source file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    source_id: String,
    span: Span,
    message: String,
    label: Option<String>,
}

impl Diagnostic {
    pub fn error(source_id: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Text shown next to the underlined span.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub const fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Render diagnostics against the text they point into.
pub fn emit_diagnostics(diagnostics: &[Diagnostic], source: &str) {
    for diagnostic in diagnostics {
        // Clamp so a position reported at EOF still renders.
        let end = diagnostic.span().end().min(source.len());
        let start = diagnostic.span().start().min(end);
        let id = diagnostic.source_id().to_string();

        let mut label = Label::new((id.clone(), start..end)).with_color(Color::Red);
        if let Some(text) = diagnostic.label() {
            label = label.with_message(text);
        }

        let report = Report::build(ReportKind::Error, id.clone(), start)
            .with_message(diagnostic.message())
            .with_label(label);

        let _ = report.finish().eprint((id, Source::from(source)));
    }
}

pub fn emit_diagnostic(diagnostic: &Diagnostic, source: &str) {
    emit_diagnostics(std::slice::from_ref(diagnostic), source);
}
