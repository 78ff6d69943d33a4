//! Statement text, bound parameters and quoting rules

use crate::value::Value;

/// Double every single quote so `text` can sit inside a single-quoted SQL literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Quote a text value as a SQL string literal.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

/// Quote a SQL identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A SQL statement with positional (`?N`) parameters.
///
/// Values are always bound at execution time. [`Statement::render`] produces the
/// equivalent literal SQL for logging and previews only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append the next positional parameter
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Substitute every `?N` placeholder outside quoted text with its literal value.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            match quote {
                Some(q) => {
                    out.push(c);
                    if c == q {
                        quote = None;
                    }
                }
                None if c == '\'' || c == '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                None if c == '?' => {
                    let mut digits = String::new();
                    while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                        digits.push(*d);
                        chars.next();
                    }
                    let value = digits
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| self.params.get(i));
                    match value {
                        Some(v) => out.push_str(&v.to_literal()),
                        None => {
                            out.push('?');
                            out.push_str(&digits);
                        }
                    }
                }
                None => out.push(c),
            }
        }
        out
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("plain"), "plain");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Customers"), "\"Customers\"");
        assert_eq!(quote_ident("my\"table"), "\"my\"\"table\"");
    }

    #[test]
    fn test_render_substitutes_params() {
        let stmt = Statement::new("UPDATE \"t\" SET \"fname\" = ?1 WHERE id = ?2")
            .bind("O'Brien")
            .bind(3);
        assert_eq!(stmt.render(), "UPDATE \"t\" SET \"fname\" = 'O''Brien' WHERE id = 3");
        assert_eq!(stmt.params().len(), 2);
    }

    #[test]
    fn test_render_leaves_quoted_text_and_unbound_placeholders() {
        let stmt = Statement::new("SELECT '?1', \"a?1\" FROM t WHERE x = ?1 AND y = ?2").bind(5);
        assert_eq!(stmt.render(), "SELECT '?1', \"a?1\" FROM t WHERE x = 5 AND y = ?2");
    }
}
