//! Column assignments for INSERT and UPDATE.
//!
//! A [`Change`] either assigns a whole column or patches a path inside a JSONB
//! column. [`Changes`] compiles a list of them into one assignment per column:
//! every JSON patch on the same column is merged into a single expression built
//! from `||`, `jsonb_build_object`, `jsonb_build_array`, `jsonb_array_elements`
//! and `jsonb_agg`, so a row's changes always land in one statement.

use serde_json::Value as Json;

use crate::{Column, StatementBuilder, StorageError, Value};

/// Right-hand side of a whole-column assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeValue {
    Literal(Value),
    /// `DEFAULT`
    UseDefault,
    /// `NULL`
    UseNull,
    /// `NOW()`
    UseServerTime,
}

/// Operation applied at a path inside a JSON column.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonOp {
    /// Replace the value at the path.
    Set(Json),
    /// Add to the array at the path unless an equal element is already present.
    Append(Json),
    /// Drop every element equal to the value from the array at the path.
    Remove(Json),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set {
        column: Column,
        value: ChangeValue,
    },
    Json {
        column: Column,
        path: Vec<String>,
        op: JsonOp,
    },
}

impl Change {
    pub fn set(column: Column, value: impl Into<Value>) -> Self {
        Self::assign(column, ChangeValue::Literal(value.into()))
    }

    pub fn assign(column: Column, value: ChangeValue) -> Self {
        Change::Set { column, value }
    }

    pub fn set_default(column: Column) -> Self {
        Self::assign(column, ChangeValue::UseDefault)
    }

    pub fn set_null(column: Column) -> Self {
        Self::assign(column, ChangeValue::UseNull)
    }

    pub fn set_server_time(column: Column) -> Self {
        Self::assign(column, ChangeValue::UseServerTime)
    }

    pub fn json<P, S>(column: Column, path: P, op: JsonOp) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Change::Json {
            column,
            path: path.into_iter().map(Into::into).collect(),
            op,
        }
    }

    /// Serialize `value` and set it at `path`.
    pub fn json_set<P, S>(
        column: Column,
        path: P,
        value: impl serde::Serialize,
    ) -> Result<Self, StorageError>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = serde_json::to_value(value).map_err(StorageError::Encode)?;
        Ok(Self::json(column, path, JsonOp::Set(value)))
    }

    pub fn json_append<P, S>(
        column: Column,
        path: P,
        value: impl serde::Serialize,
    ) -> Result<Self, StorageError>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = serde_json::to_value(value).map_err(StorageError::Encode)?;
        Ok(Self::json(column, path, JsonOp::Append(value)))
    }

    pub fn json_remove<P, S>(
        column: Column,
        path: P,
        value: impl serde::Serialize,
    ) -> Result<Self, StorageError>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = serde_json::to_value(value).map_err(StorageError::Encode)?;
        Ok(Self::json(column, path, JsonOp::Remove(value)))
    }

    pub fn column(&self) -> &Column {
        match self {
            Change::Set { column, .. } | Change::Json { column, .. } => column,
        }
    }
}

/// An ordered list of changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes(Vec<Change>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    pub fn with(mut self, change: Change) -> Self {
        self.0.push(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.0.iter()
    }

    /// Whether any change targets `column`.
    pub fn is_on_column(&self, column: &Column) -> bool {
        self.0.iter().any(|c| c.column() == column)
    }

    /// Write `col = expr, ...` for an UPDATE (or `ON CONFLICT DO UPDATE`) SET list.
    ///
    /// JSON patches apply on top of the column's current value.
    pub fn write_update(&self, builder: &mut StatementBuilder) -> Result<(), StorageError> {
        let assignments = self.compile()?;
        for (idx, (column, assignment)) in assignments.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            column.write_unqualified(builder);
            builder.write_str(" = ");
            assignment.write(builder, &column.to_string());
        }
        Ok(())
    }

    /// Write `(col, ...) VALUES (expr, ...)` for an INSERT.
    ///
    /// JSON patches apply on top of an empty document.
    pub fn write_insert(&self, builder: &mut StatementBuilder) -> Result<(), StorageError> {
        let assignments = self.compile()?;
        builder.write_char('(');
        for (idx, (column, _)) in assignments.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            column.write_unqualified(builder);
        }
        builder.write_str(") VALUES (");
        for (idx, (_, assignment)) in assignments.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            assignment.write(builder, "NULL::JSONB");
        }
        builder.write_char(')');
        Ok(())
    }

    fn compile(&self) -> Result<Vec<(Column, Assignment)>, StorageError> {
        if self.0.is_empty() {
            return Err(StorageError::NoChanges);
        }

        let mut assignments: Vec<(Column, Assignment)> = Vec::new();
        for change in &self.0 {
            let existing = assignments.iter().position(|(c, _)| c == change.column());
            let slot = match existing {
                Some(idx) => &mut assignments[idx].1,
                None => {
                    assignments.push((*change.column(), Assignment::Patch(PatchNode::empty())));
                    let last = assignments.len() - 1;
                    &mut assignments[last].1
                }
            };
            match change {
                Change::Set { value, .. } => *slot = Assignment::Value(value.clone()),
                Change::Json { path, op, .. } => slot.patch(path, op),
            }
        }
        Ok(assignments)
    }
}

impl FromIterator<Change> for Changes {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Changes(iter.into_iter().collect())
    }
}

impl Extend<Change> for Changes {
    fn extend<I: IntoIterator<Item = Change>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl From<Vec<Change>> for Changes {
    fn from(changes: Vec<Change>) -> Self {
        Changes(changes)
    }
}

impl IntoIterator for Changes {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone)]
enum Assignment {
    Value(ChangeValue),
    Patch(PatchNode),
}

impl Assignment {
    fn patch(&mut self, path: &[String], op: &JsonOp) {
        match self {
            Assignment::Patch(node) => node.insert(path, op),
            Assignment::Value(ChangeValue::Literal(Value::Json(doc))) => apply(doc, path, op),
            Assignment::Value(ChangeValue::UseNull) => {
                let mut doc = Json::Null;
                apply(&mut doc, path, op);
                *self = Assignment::Value(ChangeValue::Literal(Value::Json(doc)));
            }
            // A patch on a non-document assignment starts over from the column value.
            Assignment::Value(_) => {
                let mut node = PatchNode::empty();
                node.insert(path, op);
                *self = Assignment::Patch(node);
            }
        }
    }

    fn write(&self, builder: &mut StatementBuilder, source: &str) {
        match self {
            Assignment::Value(ChangeValue::Literal(value)) => builder.write_arg(value.clone()),
            Assignment::Value(ChangeValue::UseDefault) => builder.write_str("DEFAULT"),
            Assignment::Value(ChangeValue::UseNull) => builder.write_str("NULL"),
            Assignment::Value(ChangeValue::UseServerTime) => builder.write_str("NOW()"),
            Assignment::Patch(node) => node.write(builder, source),
        }
    }
}

/// Merged JSON patches for one column.
#[derive(Debug, Clone)]
enum PatchNode {
    /// Merge the listed keys into the existing object.
    Object(Vec<(String, PatchNode)>),
    /// Replace the value outright.
    Replace(Json),
    /// Array edits applied in order to the existing array.
    Array(Vec<JsonOp>),
}

impl PatchNode {
    fn empty() -> Self {
        PatchNode::Object(Vec::new())
    }

    fn insert(&mut self, path: &[String], op: &JsonOp) {
        let Some((key, rest)) = path.split_first() else {
            if let JsonOp::Set(value) = op {
                *self = PatchNode::Replace(value.clone());
                return;
            }
            match self {
                PatchNode::Replace(doc) => apply(doc, &[], op),
                PatchNode::Array(ops) => ops.push(op.clone()),
                PatchNode::Object(_) => *self = PatchNode::Array(vec![op.clone()]),
            }
            return;
        };

        match self {
            PatchNode::Replace(doc) => apply(doc, path, op),
            PatchNode::Array(_) => {
                let mut node = PatchNode::empty();
                node.insert(path, op);
                *self = node;
            }
            PatchNode::Object(children) => {
                match children.iter_mut().find(|(k, _)| k == key) {
                    Some((_, child)) => child.insert(rest, op),
                    None => {
                        let mut child = PatchNode::empty();
                        child.insert(rest, op);
                        children.push((key.clone(), child));
                    }
                }
            }
        }
    }

    fn write(&self, builder: &mut StatementBuilder, source: &str) {
        match self {
            PatchNode::Replace(value) => {
                builder.write_arg(value.clone());
                builder.write_str("::JSONB");
            }
            PatchNode::Object(children) => {
                builder.write_str("(CASE WHEN jsonb_typeof(");
                builder.write_str(source);
                builder.write_str(") = 'object' THEN ");
                builder.write_str(source);
                builder.write_str(" ELSE '{}'::JSONB END || jsonb_build_object(");
                for (idx, (key, child)) in children.iter().enumerate() {
                    if idx > 0 {
                        builder.write_str(", ");
                    }
                    builder.write_string_literal(key);
                    builder.write_str(", ");
                    let child_source = format!("{}->{}", source, quote_literal(key));
                    child.write(builder, &child_source);
                }
                builder.write_str("))");
            }
            PatchNode::Array(ops) => write_array_ops(builder, ops, source),
        }
    }
}

fn write_array_ops(builder: &mut StatementBuilder, ops: &[JsonOp], source: &str) {
    let Some((last, rest)) = ops.split_last() else {
        builder.write_str("(CASE WHEN jsonb_typeof(");
        builder.write_str(source);
        builder.write_str(") = 'array' THEN ");
        builder.write_str(source);
        builder.write_str(" ELSE '[]'::JSONB END)");
        return;
    };

    let (JsonOp::Append(value) | JsonOp::Remove(value) | JsonOp::Set(value)) = last;
    let append = matches!(last, JsonOp::Append(_));
    if append {
        builder.write_char('(');
    }
    builder.write_str(
        "(SELECT COALESCE(jsonb_agg(e ORDER BY i), '[]'::JSONB) FROM jsonb_array_elements(",
    );
    write_array_ops(builder, rest, source);
    builder.write_str(") WITH ORDINALITY AS t(e, i) WHERE e <> ");
    builder.write_arg(value.clone());
    builder.write_str("::JSONB)");
    if append {
        builder.write_str(" || jsonb_build_array(");
        builder.write_arg(value.clone());
        builder.write_str("::JSONB))");
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Apply a patch to a document held in memory.
fn apply(doc: &mut Json, path: &[String], op: &JsonOp) {
    let Some((key, rest)) = path.split_first() else {
        match op {
            JsonOp::Set(value) => *doc = value.clone(),
            JsonOp::Append(value) => {
                if !doc.is_array() {
                    *doc = Json::Array(Vec::new());
                }
                if let Json::Array(items) = doc {
                    items.retain(|item| item != value);
                    items.push(value.clone());
                }
            }
            JsonOp::Remove(value) => match doc {
                Json::Array(items) => items.retain(|item| item != value),
                _ => *doc = Json::Array(Vec::new()),
            },
        }
        return;
    };

    if !doc.is_object() {
        *doc = Json::Object(serde_json::Map::new());
    }
    if let Json::Object(map) = doc {
        apply(map.entry(key.clone()).or_insert(Json::Null), rest, op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: Column = Column::new("settings", "id");
    const UPDATED_AT: Column = Column::new("settings", "updated_at");
    const ATTRIBUTES: Column = Column::new("settings", "attributes");

    fn update_sql(changes: &Changes) -> (String, Vec<Value>) {
        let mut builder = StatementBuilder::new();
        changes.write_update(&mut builder).unwrap();
        let stmt = builder.build();
        (stmt.sql().to_string(), stmt.args().to_vec())
    }

    #[test]
    fn empty_changes_fail_before_writing() {
        let mut builder = StatementBuilder::new();
        let err = Changes::new().write_update(&mut builder).unwrap_err();
        assert!(err.is_no_changes());
        assert_eq!(builder.sql(), "");

        let err = Changes::new().write_insert(&mut builder).unwrap_err();
        assert!(err.is_no_changes());
    }

    #[test]
    fn sentinels_consume_no_placeholder() {
        let changes = Changes::new()
            .with(Change::set(ID, "s1"))
            .with(Change::set_server_time(UPDATED_AT))
            .with(Change::set_null(ATTRIBUTES));
        let (sql, args) = update_sql(&changes);
        assert_eq!(sql, "id = $1, updated_at = NOW(), attributes = NULL");
        assert_eq!(args, vec![Value::from("s1")]);
    }

    #[test]
    fn insert_lists_columns_and_values_in_parallel() {
        let changes = Changes::new()
            .with(Change::set_default(ID))
            .with(Change::set(UPDATED_AT, "2024-01-01T00:00:00Z"));
        let mut builder = StatementBuilder::new();
        changes.write_insert(&mut builder).unwrap();
        assert_eq!(builder.sql(), "(id, updated_at) VALUES (DEFAULT, $1)");
    }

    #[test]
    fn later_plain_set_wins() {
        let changes = Changes::new()
            .with(Change::set(ID, "a"))
            .with(Change::set(ID, "b"));
        let (sql, args) = update_sql(&changes);
        assert_eq!(sql, "id = $1");
        assert_eq!(args, vec![Value::from("b")]);
    }

    #[test]
    fn json_patches_on_one_column_merge_into_one_assignment() {
        let changes = Changes::new()
            .with(Change::json_set(ATTRIBUTES, ["b"], 3).unwrap())
            .with(Change::json_set(ATTRIBUTES, ["colors", "light"], "#fff").unwrap());
        let (sql, args) = update_sql(&changes);
        assert_eq!(
            sql,
            "attributes = (CASE WHEN jsonb_typeof(settings.attributes) = 'object' \
             THEN settings.attributes ELSE '{}'::JSONB END || jsonb_build_object(\
             'b', $1::JSONB, \
             'colors', (CASE WHEN jsonb_typeof(settings.attributes->'colors') = 'object' \
             THEN settings.attributes->'colors' ELSE '{}'::JSONB END || \
             jsonb_build_object('light', $2::JSONB))))"
        );
        assert_eq!(args, vec![Value::Json(json!(3)), Value::Json(json!("#fff"))]);
    }

    #[test]
    fn array_ops_nest_with_placeholders_in_text_order() {
        let changes = Changes::new()
            .with(Change::json_remove(ATTRIBUTES, ["types"], 1).unwrap())
            .with(Change::json_append(ATTRIBUTES, ["types"], 2).unwrap());
        let (sql, args) = update_sql(&changes);
        assert!(sql.contains("jsonb_array_elements((SELECT COALESCE"));
        assert!(sql.contains("WHERE e <> $1::JSONB)) WITH ORDINALITY"));
        assert!(sql.ends_with("WHERE e <> $2::JSONB) || jsonb_build_array($3::JSONB))))"));
        assert_eq!(
            args,
            vec![
                Value::Json(json!(1)),
                Value::Json(json!(2)),
                Value::Json(json!(2))
            ]
        );
    }

    #[test]
    fn patch_after_full_document_is_applied_in_memory() {
        let changes = Changes::new()
            .with(Change::set(ATTRIBUTES, json!({"a": 1, "b": 2, "tags": ["x"]})))
            .with(Change::json_set(ATTRIBUTES, ["b"], 3).unwrap())
            .with(Change::json_append(ATTRIBUTES, ["tags"], "y").unwrap())
            .with(Change::json_append(ATTRIBUTES, ["tags"], "x").unwrap());
        let (sql, args) = update_sql(&changes);
        assert_eq!(sql, "attributes = $1");
        assert_eq!(
            args,
            vec![Value::Json(json!({"a": 1, "b": 3, "tags": ["y", "x"]}))]
        );
    }

    #[test]
    fn insert_patch_builds_from_empty_document() {
        let changes = Changes::new().with(Change::json_set(ATTRIBUTES, ["a"], true).unwrap());
        let mut builder = StatementBuilder::new();
        changes.write_insert(&mut builder).unwrap();
        assert_eq!(
            builder.sql(),
            "(attributes) VALUES ((CASE WHEN jsonb_typeof(NULL::JSONB) = 'object' \
             THEN NULL::JSONB ELSE '{}'::JSONB END || jsonb_build_object('a', $1::JSONB)))"
        );
    }

    #[test]
    fn keys_are_escaped() {
        let changes = Changes::new().with(Change::json_set(ATTRIBUTES, ["it's"], 1).unwrap());
        let (sql, _) = update_sql(&changes);
        assert!(sql.contains("jsonb_build_object('it''s', $1::JSONB)"));
    }

    #[test]
    fn in_memory_remove_and_append_keep_set_semantics() {
        let mut doc = json!({"list": [1, 2, 2, 3]});
        apply(&mut doc, &["list".into()], &JsonOp::Remove(json!(2)));
        apply(&mut doc, &["list".into()], &JsonOp::Append(json!(1)));
        assert_eq!(doc, json!({"list": [3, 1]}));
    }

    #[test]
    fn is_on_column() {
        let changes = Changes::new().with(Change::set_server_time(UPDATED_AT));
        assert!(changes.is_on_column(&UPDATED_AT));
        assert!(!changes.is_on_column(&ID));
    }
}
