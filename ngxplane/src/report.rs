//! Source snippets for grammar build errors

use ariadne::{Color, Label, Report, ReportKind, Source};
use ngxplane_grammar::UnknownSymbol;
use std::ops::Range;

/// Render an unknown-token error against the C source it came from.
///
/// Falls back to the plain message when the file can no longer be read.
pub fn unknown_symbol(err: &UnknownSymbol) -> String {
    let Ok(text) = std::fs::read_to_string(&err.file) else {
        return format!("{}\n", err);
    };
    let Some(span) = char_span(&text, &err.span) else {
        return format!("{}\n", err);
    };

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(format!("unknown bitmask token in directive '{}'", err.directive))
        .with_label(
            Label::new(span)
                .with_message(format!("'{}' has no grammar symbol", err.token))
                .with_color(Color::Red),
        )
        .with_note(format!("{}:{}", err.file.display(), err.line))
        .with_help("map the token in the [tokens] section of a settings file")
        .finish();

    let mut buf = Vec::new();
    if report.write(Source::from(text.as_str()), &mut buf).is_err() {
        return format!("{}\n", err);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Byte range to char range, which is what ariadne indexes by
fn char_span(text: &str, bytes: &Range<usize>) -> Option<Range<usize>> {
    let prefix = text.get(..bytes.start)?;
    let body = text.get(bytes.clone())?;
    let start = prefix.chars().count();
    Some(start..start + body.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_char_span() {
        let text = "/* é */ NGX_CONF_TAKE9,";
        let start = text.find("NGX").unwrap();
        let span = char_span(text, &(start..start + 14)).unwrap();
        assert_eq!(span, 8..22);
        assert!(char_span(text, &(0..999)).is_none());
    }

    #[test]
    fn test_unknown_symbol_snippet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ngx_quic.c");
        let source = "static ngx_command_t cmds[] = {\n    { ngx_string(\"quic_bpf\"),\n      NGX_MAIN_CONF|NGX_CONF_TAKE9,\n";
        std::fs::write(&file, source).unwrap();

        let start = source.find("NGX_MAIN_CONF").unwrap();
        let err = UnknownSymbol {
            directive: "quic_bpf".to_string(),
            token: "NGX_CONF_TAKE9".to_string(),
            file: file.clone(),
            line: 3,
            span: start..start + "NGX_MAIN_CONF|NGX_CONF_TAKE9".len(),
        };

        let rendered = unknown_symbol(&err);
        assert!(rendered.contains("quic_bpf"));
        assert!(rendered.contains("NGX_CONF_TAKE9"));

        let missing = UnknownSymbol {
            file: PathBuf::from("/nonexistent/ngx_quic.c"),
            ..err
        };
        assert_eq!(unknown_symbol(&missing), format!("{}\n", missing));
    }
}
