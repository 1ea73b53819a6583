//! JSON highlighting for the statistics artifact.
//!
//! [`tokenize`] lays a value out with two-space indentation as a flat sequence
//! of tagged tokens. Renderers consume the tokens; [`render_html`] escapes the
//! text of every token before any markup is added around it.

use serde_json::Value;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonToken {
    /// Object key including its quotes, without the colon.
    Key(String),
    /// String value including its quotes and JSON escapes.
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    /// Structural characters: `{ } [ ] , :`.
    Punct(&'static str),
    /// Indentation and the space after a colon.
    Space(String),
    Newline,
}

impl JsonToken {
    /// Plain text of the token, as it appears in the laid-out JSON.
    pub fn text(&self) -> &str {
        match self {
            JsonToken::Key(text)
            | JsonToken::Str(text)
            | JsonToken::Number(text)
            | JsonToken::Space(text) => text,
            JsonToken::Bool(true) => "true",
            JsonToken::Bool(false) => "false",
            JsonToken::Null => "null",
            JsonToken::Punct(text) => text,
            JsonToken::Newline => "\n",
        }
    }

    /// CSS class for highlighted tokens, `None` for layout tokens.
    pub fn class(&self) -> Option<&'static str> {
        match self {
            JsonToken::Key(_) => Some("json-key"),
            JsonToken::Str(_) => Some("json-string"),
            JsonToken::Number(_) => Some("json-number"),
            JsonToken::Bool(_) => Some("json-boolean"),
            JsonToken::Null => Some("json-null"),
            JsonToken::Punct(_) | JsonToken::Space(_) | JsonToken::Newline => None,
        }
    }
}

pub fn tokenize(value: &Value) -> Vec<JsonToken> {
    let mut tokens = Vec::new();
    push_value(&mut tokens, value, 0);
    tokens
}

fn push_value(tokens: &mut Vec<JsonToken>, value: &Value, depth: usize) {
    match value {
        Value::Null => tokens.push(JsonToken::Null),
        Value::Bool(b) => tokens.push(JsonToken::Bool(*b)),
        Value::Number(n) => tokens.push(JsonToken::Number(n.to_string())),
        Value::String(s) => tokens.push(JsonToken::Str(quote(s))),
        Value::Array(items) => {
            if items.is_empty() {
                tokens.push(JsonToken::Punct("["));
                tokens.push(JsonToken::Punct("]"));
                return;
            }
            tokens.push(JsonToken::Punct("["));
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    tokens.push(JsonToken::Punct(","));
                }
                tokens.push(JsonToken::Newline);
                push_indent(tokens, depth + 1);
                push_value(tokens, item, depth + 1);
            }
            tokens.push(JsonToken::Newline);
            push_indent(tokens, depth);
            tokens.push(JsonToken::Punct("]"));
        }
        Value::Object(map) => {
            if map.is_empty() {
                tokens.push(JsonToken::Punct("{"));
                tokens.push(JsonToken::Punct("}"));
                return;
            }
            tokens.push(JsonToken::Punct("{"));
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    tokens.push(JsonToken::Punct(","));
                }
                tokens.push(JsonToken::Newline);
                push_indent(tokens, depth + 1);
                tokens.push(JsonToken::Key(quote(key)));
                tokens.push(JsonToken::Punct(":"));
                tokens.push(JsonToken::Space(" ".into()));
                push_value(tokens, item, depth + 1);
            }
            tokens.push(JsonToken::Newline);
            push_indent(tokens, depth);
            tokens.push(JsonToken::Punct("}"));
        }
    }
}

fn push_indent(tokens: &mut Vec<JsonToken>, depth: usize) {
    if depth > 0 {
        tokens.push(JsonToken::Space(INDENT.repeat(depth)));
    }
}

fn quote(raw: &str) -> String {
    // Serializing a str cannot fail.
    serde_json::to_string(raw).unwrap_or_else(|_| format!("\"{raw}\""))
}

/// Plain laid-out JSON; identical to `serde_json::to_string_pretty`.
pub fn render_plain(tokens: &[JsonToken]) -> String {
    tokens.iter().map(JsonToken::text).collect()
}

/// HTML fragment with `<span class="json-…">` around highlighted tokens.
pub fn render_html(tokens: &[JsonToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        let text = escape_html(token.text());
        match token.class() {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&text);
                out.push_str("</span>");
            }
            None => out.push_str(&text),
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
