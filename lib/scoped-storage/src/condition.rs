//! Boolean expressions over columns.
//!
//! A [`Condition`] is an immutable tree that renders itself into a
//! [`StatementBuilder`]. Leaf predicates bind exactly one column and one value.

use crate::{Column, StatementBuilder, Value};

/// Comparisons on text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperation {
    Equal,
    EqualIgnoreCase,
    NotEqual,
    NotEqualIgnoreCase,
    StartsWith,
    StartsWithIgnoreCase,
    EndsWith,
    EndsWithIgnoreCase,
    Contains,
    ContainsIgnoreCase,
}

/// Comparisons on numeric (and timestamp) columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOperation {
    Equal,
    NotEqual,
    LessThan,
    AtMost,
    GreaterThan,
    AtLeast,
}

/// Comparisons on boolean columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperation {
    Equal,
    NotEqual,
}

/// Comparisons on binary columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesOperation {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Text(TextOperation),
    Number(NumberOperation),
    Boolean(BooleanOperation),
    Bytes(BytesOperation),
}

impl Operator {
    /// Case-sensitive equality, the only comparison that pins a column to one value.
    pub fn is_equality(&self) -> bool {
        matches!(
            self,
            Operator::Text(TextOperation::Equal)
                | Operator::Number(NumberOperation::Equal)
                | Operator::Boolean(BooleanOperation::Equal)
                | Operator::Bytes(BytesOperation::Equal)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate {
        column: Column,
        operator: Operator,
        value: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    IsNull(Column),
    IsNotNull(Column),
    /// `EXISTS (SELECT 1 FROM <table> WHERE <condition>)`; `table` is the
    /// qualified relation the sub-condition's columns belong to.
    Exists {
        table: String,
        condition: Box<Condition>,
    },
}

impl Condition {
    pub fn text(column: Column, operation: TextOperation, value: impl Into<Value>) -> Self {
        Condition::Predicate {
            column,
            operator: Operator::Text(operation),
            value: value.into(),
        }
    }

    pub fn number(column: Column, operation: NumberOperation, value: impl Into<Value>) -> Self {
        Condition::Predicate {
            column,
            operator: Operator::Number(operation),
            value: value.into(),
        }
    }

    pub fn boolean(column: Column, operation: BooleanOperation, value: bool) -> Self {
        Condition::Predicate {
            column,
            operator: Operator::Boolean(operation),
            value: value.into(),
        }
    }

    pub fn bytes(column: Column, operation: BytesOperation, value: impl Into<Vec<u8>>) -> Self {
        Condition::Predicate {
            column,
            operator: Operator::Bytes(operation),
            value: Value::Bytes(value.into()),
        }
    }

    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn is_null(column: Column) -> Self {
        Condition::IsNull(column)
    }

    pub fn is_not_null(column: Column) -> Self {
        Condition::IsNotNull(column)
    }

    pub fn exists(table: impl Into<String>, condition: Condition) -> Self {
        Condition::Exists {
            table: table.into(),
            condition: Box::new(condition),
        }
    }

    /// `IS NULL` for `None`, text equality otherwise.
    pub fn text_or_null(column: Column, value: Option<&str>) -> Self {
        match value {
            Some(value) => Condition::text(column, TextOperation::Equal, value),
            None => Condition::IsNull(column),
        }
    }

    /// Whether every row this condition can match has `column` pinned to a
    /// single value, regardless of which branch matched.
    pub fn is_restricting_column(&self, column: &Column) -> bool {
        match self {
            Condition::Predicate {
                column: c,
                operator,
                ..
            } => c == column && operator.is_equality(),
            Condition::IsNull(c) => c == column,
            Condition::And(children) => children.iter().any(|c| c.is_restricting_column(column)),
            Condition::Or(children) => {
                !children.is_empty() && children.iter().all(|c| c.is_restricting_column(column))
            }
            Condition::IsNotNull(_) | Condition::Exists { .. } => false,
        }
    }

    pub fn write(&self, builder: &mut StatementBuilder) {
        match self {
            Condition::Predicate {
                column,
                operator,
                value,
            } => write_predicate(builder, column, operator, value),
            Condition::And(children) => write_junction(builder, children, " AND ", "TRUE"),
            Condition::Or(children) => write_junction(builder, children, " OR ", "FALSE"),
            Condition::IsNull(column) => {
                column.write_qualified(builder);
                builder.write_str(" IS NULL");
            }
            Condition::IsNotNull(column) => {
                column.write_qualified(builder);
                builder.write_str(" IS NOT NULL");
            }
            Condition::Exists { table, condition } => {
                builder.write_str("EXISTS (SELECT 1 FROM ");
                builder.write_str(table);
                builder.write_str(" WHERE ");
                condition.write(builder);
                builder.write_char(')');
            }
        }
    }
}

fn write_junction(
    builder: &mut StatementBuilder,
    children: &[Condition],
    separator: &str,
    empty: &str,
) {
    if children.is_empty() {
        builder.write_str(empty);
        return;
    }
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            builder.write_str(separator);
        }
        builder.write_char('(');
        child.write(builder);
        builder.write_char(')');
    }
}

fn write_lowered(builder: &mut StatementBuilder, column: &Column) {
    builder.write_str("LOWER(");
    column.write_qualified(builder);
    builder.write_char(')');
}

fn write_lowered_arg(builder: &mut StatementBuilder, value: &Value) {
    builder.write_str("LOWER(");
    builder.write_arg(value.clone());
    builder.write_char(')');
}

fn write_predicate(
    builder: &mut StatementBuilder,
    column: &Column,
    operator: &Operator,
    value: &Value,
) {
    match operator {
        Operator::Text(op) => write_text_predicate(builder, column, *op, value),
        Operator::Number(op) => {
            let symbol = match op {
                NumberOperation::Equal => " = ",
                NumberOperation::NotEqual => " <> ",
                NumberOperation::LessThan => " < ",
                NumberOperation::AtMost => " <= ",
                NumberOperation::GreaterThan => " > ",
                NumberOperation::AtLeast => " >= ",
            };
            column.write_qualified(builder);
            builder.write_str(symbol);
            builder.write_arg(value.clone());
        }
        Operator::Boolean(op) => {
            column.write_qualified(builder);
            builder.write_str(match op {
                BooleanOperation::Equal => " = ",
                BooleanOperation::NotEqual => " <> ",
            });
            builder.write_arg(value.clone());
        }
        Operator::Bytes(op) => {
            column.write_qualified(builder);
            builder.write_str(match op {
                BytesOperation::Equal => " = ",
                BytesOperation::NotEqual => " <> ",
            });
            builder.write_arg(value.clone());
        }
    }
}

fn write_text_predicate(
    builder: &mut StatementBuilder,
    column: &Column,
    op: TextOperation,
    value: &Value,
) {
    let ignore_case = matches!(
        op,
        TextOperation::EqualIgnoreCase
            | TextOperation::NotEqualIgnoreCase
            | TextOperation::StartsWithIgnoreCase
            | TextOperation::EndsWithIgnoreCase
            | TextOperation::ContainsIgnoreCase
    );
    if ignore_case {
        write_lowered(builder, column);
    } else {
        column.write_qualified(builder);
    }

    let (operator, leading_wildcard, trailing_wildcard) = match op {
        TextOperation::Equal | TextOperation::EqualIgnoreCase => (" = ", false, false),
        TextOperation::NotEqual | TextOperation::NotEqualIgnoreCase => (" <> ", false, false),
        TextOperation::StartsWith | TextOperation::StartsWithIgnoreCase => (" LIKE ", false, true),
        TextOperation::EndsWith | TextOperation::EndsWithIgnoreCase => (" LIKE ", true, false),
        TextOperation::Contains | TextOperation::ContainsIgnoreCase => (" LIKE ", true, true),
    };
    builder.write_str(operator);
    if leading_wildcard {
        builder.write_str("'%' || ");
    }
    if ignore_case {
        write_lowered_arg(builder, value);
    } else {
        builder.write_arg(value.clone());
    }
    if trailing_wildcard {
        builder.write_str(" || '%'");
    }
}
