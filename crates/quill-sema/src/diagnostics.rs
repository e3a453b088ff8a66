//! Ariadne-based diagnostic rendering for semantic errors.
//!
//! Output is colorless so it can be compared in tests. Each diagnostic
//! carries the error code, the message, a label at the error's span (or at
//! the start of the file when the error has none) and a help line.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::TypeError;

// ── Span Helpers ───────────────────────────────────────────────────────

/// Clamp `range` into the source and widen empty ranges to one character,
/// which ariadne needs to draw a label.
fn clamp(range: Range<usize>, source_len: usize) -> Range<usize> {
    let start = range.start.min(source_len);
    let end = range.end.min(source_len).max(start);
    if start == end {
        start..end.saturating_add(1).min(source_len)
    } else {
        start..end
    }
}

// ── Help Text ──────────────────────────────────────────────────────────

fn label_text(error: &TypeError) -> String {
    match error {
        TypeError::MissingMethod { method, .. } => format!("`{}` is not provided here", method),
        TypeError::GenericArity { expected, .. } => {
            format!("expected {} type argument(s)", expected)
        }
        TypeError::Contradiction { found, .. } => format!("this is `{}`", found),
        TypeError::TraitNotSatisfied { bound, .. } => format!("required by `{}`", bound),
    }
}

fn help_text(error: &TypeError) -> String {
    match error {
        TypeError::MissingMethod { ty, .. } => {
            format!("implement a trait that declares this method for `{}`", ty)
        }
        TypeError::GenericArity {
            expected, found, ..
        } => {
            if expected > found {
                format!("missing {} type argument(s)", expected - found)
            } else {
                format!("{} extra type argument(s)", found - expected)
            }
        }
        TypeError::Contradiction { expected, .. } => format!("expected `{}` here", expected),
        TypeError::TraitNotSatisfied { ty, bound, .. } => {
            format!("add `impl {} for {}`", bound, ty)
        }
    }
}

// ── Main Rendering Function ────────────────────────────────────────────

/// Render a semantic error into a formatted diagnostic string.
pub fn render_diagnostic(error: &TypeError, source: &str, _filename: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();
    let span = match error.span() {
        Some(span) => clamp(span.range(), source_len),
        None => clamp(0..0, source_len),
    };

    let report = Report::build(ReportKind::Error, span.clone())
        .with_code(error.code())
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(label_text(error))
                .with_color(Color::Red),
        )
        .with_help(help_text(error))
        .finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return error.to_string();
    }
    String::from_utf8_lossy(&buf).into_owned()
}
