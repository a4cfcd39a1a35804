//! Filter formulas for record-store queries.
//!
//! Queries are built as a small AST rather than by string concatenation, so
//! user input can never change the shape of a formula. The AST renders to the
//! provider's filter-formula language for the HTTP backend and is evaluated
//! structurally by the in-memory backend.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Matches every row.
    True,
    /// Field equals a string value. Missing fields compare as empty.
    Eq(String, String),
    /// Checkbox-style field is absent or false.
    IsFalse(String),
    /// Field holds a non-empty string.
    NotBlank(String),
    /// Case-insensitive substring match.
    ContainsCi { field: String, needle: String },
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Formula::Eq(field.into(), value.into())
    }

    pub fn is_false(field: impl Into<String>) -> Self {
        Formula::IsFalse(field.into())
    }

    pub fn not_blank(field: impl Into<String>) -> Self {
        Formula::NotBlank(field.into())
    }

    pub fn contains_ci(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Formula::ContainsCi {
            field: field.into(),
            needle: needle.into().to_lowercase(),
        }
    }

    pub fn and(parts: Vec<Formula>) -> Self {
        Formula::And(parts)
    }

    pub fn or(parts: Vec<Formula>) -> Self {
        Formula::Or(parts)
    }

    /// Render to the provider's filter-formula string.
    pub fn render(&self) -> String {
        match self {
            Formula::True => "TRUE()".to_string(),
            Formula::Eq(field, value) => {
                format!("{} = {}", field_ref(field), quote(value))
            }
            Formula::IsFalse(field) => format!("NOT({})", field_ref(field)),
            Formula::NotBlank(field) => format!("{} != \"\"", field_ref(field)),
            Formula::ContainsCi { field, needle } => {
                format!("SEARCH({}, LOWER({}))", quote(needle), field_ref(field))
            }
            Formula::Not(inner) => format!("NOT({})", inner.render()),
            Formula::And(parts) => render_group("AND", parts),
            Formula::Or(parts) => render_group("OR", parts),
        }
    }

    /// Evaluate against a row's field map; mirrors the provider's semantics
    /// closely enough for the in-memory backend and tests.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Formula::True => true,
            Formula::Eq(field, value) => string_field(fields, field) == *value,
            Formula::IsFalse(field) => !truthy(fields.get(field)),
            Formula::NotBlank(field) => !string_field(fields, field).is_empty(),
            Formula::ContainsCi { field, needle } => {
                string_field(fields, field).to_lowercase().contains(needle)
            }
            Formula::Not(inner) => !inner.matches(fields),
            Formula::And(parts) => parts.iter().all(|p| p.matches(fields)),
            Formula::Or(parts) => parts.iter().any(|p| p.matches(fields)),
        }
    }
}

fn render_group(op: &str, parts: &[Formula]) -> String {
    match parts {
        [] => "TRUE()".to_string(),
        [single] => single.render(),
        many => {
            let inner: Vec<String> = many.iter().map(Formula::render).collect();
            format!("{}({})", op, inner.join(", "))
        }
    }
}

fn field_ref(field: &str) -> String {
    format!("{{{}}}", field)
}

// Double-quoted string literal with backslash escaping; single quotes pass
// through untouched so names like O'Brien cannot break out of the literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn string_field<'a>(fields: &'a Map<String, Value>, field: &str) -> &'a str {
    fields.get(field).and_then(Value::as_str).unwrap_or("")
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn renders_uid_lookup() {
        let formula = Formula::eq("uid", "u-123");
        assert_eq!(formula.render(), "{uid} = \"u-123\"");
    }

    #[test]
    fn quoting_survives_hostile_values() {
        let formula = Formula::eq("displayName", "O'Brien \"the\" \\boss");
        assert_eq!(
            formula.render(),
            "{displayName} = \"O'Brien \\\"the\\\" \\\\boss\""
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        let formula = Formula::contains_ci("email", "ANN");
        assert!(formula.matches(&row(json!({"email": "mary.ann@x.com"}))));
        assert!(!formula.matches(&row(json!({"email": "bob@x.com"}))));
        assert_eq!(formula.render(), "SEARCH(\"ann\", LOWER({email}))");
    }

    #[test]
    fn is_false_treats_missing_as_unchecked() {
        let formula = Formula::is_false("resolved");
        assert!(formula.matches(&row(json!({}))));
        assert!(formula.matches(&row(json!({"resolved": false}))));
        assert!(!formula.matches(&row(json!({"resolved": true}))));
    }

    #[test]
    fn groups_flatten_single_members() {
        let single = Formula::and(vec![Formula::not_blank("issue")]);
        assert_eq!(single.render(), "{issue} != \"\"");

        let pair = Formula::and(vec![
            Formula::not_blank("issue"),
            Formula::is_false("resolved"),
        ]);
        assert_eq!(pair.render(), "AND({issue} != \"\", NOT({resolved}))");
    }
}
