//! Append-only SQL builder with positional parameters.

use crate::Value;

/// A finished statement: SQL text plus the arguments for `$1..$n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// Accumulates SQL text and the matching argument list.
///
/// Every call to [`StatementBuilder::write_arg`] appends exactly one argument
/// and writes the next placeholder, so placeholders are strictly increasing
/// and never reused or skipped.
#[derive(Debug, Default)]
pub struct StatementBuilder {
    sql: String,
    args: Vec<Value>,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a SQL prefix that already references `$1..$n` for `args`.
    pub fn with_args(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    pub fn write_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn write_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Bind `value` and write its placeholder.
    pub fn write_arg(&mut self, value: impl Into<Value>) {
        self.args.push(value.into());
        self.sql.push('$');
        self.sql.push_str(&self.args.len().to_string());
    }

    /// Bind each value, writing comma separated placeholders.
    pub fn write_args<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for (idx, value) in values.into_iter().enumerate() {
            if idx > 0 {
                self.write_str(", ");
            }
            self.write_arg(value);
        }
    }

    /// Write a single-quoted SQL string literal, doubling embedded quotes.
    pub fn write_string_literal(&mut self, literal: &str) {
        self.sql.push('\'');
        self.sql.push_str(&literal.replace('\'', "''"));
        self.sql.push('\'');
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
        }
    }
}
