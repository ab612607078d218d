use crate::error::{ParseError, ParseErrorKind};
use crate::types::PageConfig;
use serde_json::Value;

/// Parse a JSON page-config document into an unvalidated [`PageConfig`].
///
/// Accepts either the backend transport envelope
/// (`{"status": …, "data": {"page": {…}}}`) or a bare page object.
/// Performs deserialization and type mapping only — conformance checking
/// and normalization are separate passes.
pub fn parse(input: &str) -> Result<PageConfig, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            path: None,
            line: None,
            column: None,
        });
    }

    let value: Value = serde_json::from_str(input).map_err(|e| ParseError {
        kind: ParseErrorKind::Syntax,
        message: e.to_string(),
        path: None,
        line: Some(e.line()).filter(|&l| l > 0),
        column: Some(e.column()).filter(|&c| c > 0),
    })?;

    let page = locate_page(&value)?;

    let config: PageConfig = serde_json::from_value(page.clone()).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_json_error(&msg),
            message: msg,
            path: None,
            line: None,
            column: None,
        }
    })?;

    Ok(config)
}

/// Unwrap the transport envelope down to the page object.
fn locate_page(value: &Value) -> Result<&Value, ParseError> {
    let root = value.as_object().ok_or_else(|| ParseError {
        kind: ParseErrorKind::TypeMismatch,
        message: "config root must be a JSON object".to_string(),
        path: None,
        line: None,
        column: None,
    })?;

    if let Some(data) = root.get("data") {
        return match data.as_object().and_then(|d| d.get("page")) {
            Some(p) if p.is_object() => Ok(p),
            Some(_) => Err(type_mismatch("data.page must be an object", "data.page")),
            None => Err(type_mismatch("envelope is missing data.page", "data.page")),
        };
    }

    if let Some(page) = root.get("page") {
        return if page.is_object() {
            Ok(page)
        } else {
            Err(type_mismatch("page must be an object", "page"))
        };
    }

    // Bare page object: recognizable by its own required fields.
    if root.contains_key("pageName") || root.contains_key("tabs") {
        return Ok(value);
    }

    Err(type_mismatch(
        "no page object found (expected data.page, page, or a bare page)",
        "",
    ))
}

fn type_mismatch(message: &str, path: &str) -> ParseError {
    ParseError {
        kind: ParseErrorKind::TypeMismatch,
        message: message.to_string(),
        path: if path.is_empty() { None } else { Some(path.to_string()) },
        line: None,
        column: None,
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown variant") || lower.contains("unknown field") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field") || lower.contains("invalid type") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
