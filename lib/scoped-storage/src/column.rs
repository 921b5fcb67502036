//! Columns and the tables that own them.

use crate::StatementBuilder;

/// A column of a table.
///
/// `table` is the relation name used to qualify the column inside a statement
/// (`settings.instance_id`), without any schema prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    table: &'static str,
    name: &'static str,
}

impl Column {
    pub const fn new(table: &'static str, name: &'static str) -> Self {
        Self { table, name }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Write `table.name`.
    pub fn write_qualified(&self, builder: &mut StatementBuilder) {
        builder.write_str(self.table);
        builder.write_char('.');
        builder.write_str(self.name);
    }

    /// Write the bare column name, as required in INSERT column lists and SET targets.
    pub fn write_unqualified(&self, builder: &mut StatementBuilder) {
        builder.write_str(self.name);
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// Metadata for a table whose rows map onto a struct.
///
/// Generated by `#[derive(Table)]` with `#[table(schema = "...", name = "...")]`.
/// The derive also adds one `<column>_column()` accessor per mapped field.
pub trait Table {
    /// Schema the table lives in, if any.
    fn schema() -> Option<&'static str>;

    /// Relation name (unqualified).
    fn name() -> &'static str;

    /// Mapped columns in field order.
    fn columns() -> &'static [Column];

    /// `schema.name`, or `name` without a schema.
    fn qualified_name() -> String {
        match Self::schema() {
            Some(schema) => format!("{}.{}", schema, Self::name()),
            None => Self::name().to_string(),
        }
    }

    /// Write `SELECT <columns> FROM <table>`.
    fn write_select(builder: &mut StatementBuilder) {
        builder.write_str("SELECT ");
        for (idx, column) in Self::columns().iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            column.write_qualified(builder);
        }
        builder.write_str(" FROM ");
        builder.write_str(&Self::qualified_name());
    }
}

#[cfg(test)]
mod tests {
    use crate::{Column, StatementBuilder, Table};

    #[allow(dead_code)]
    #[derive(Table)]
    #[table(schema = "zitadel", name = "settings")]
    struct SettingRow {
        instance_id: String,
        organization_id: Option<String>,
        #[column(name = "type")]
        kind: String,
        #[column(skip)]
        cached: bool,
    }

    #[allow(dead_code)]
    #[derive(Table)]
    #[table(name = "projects")]
    struct ProjectRow {
        r#type: String,
    }

    #[test]
    fn derive_maps_fields_to_columns() {
        assert_eq!(SettingRow::qualified_name(), "zitadel.settings");
        assert_eq!(
            SettingRow::columns(),
            &[
                Column::new("settings", "instance_id"),
                Column::new("settings", "organization_id"),
                Column::new("settings", "type"),
            ]
        );
        assert_eq!(SettingRow::kind_column().name(), "type");
        assert_eq!(ProjectRow::type_column(), Column::new("projects", "type"));
        assert_eq!(ProjectRow::qualified_name(), "projects");
    }

    #[test]
    fn select_lists_qualified_columns() {
        let mut builder = StatementBuilder::new();
        SettingRow::write_select(&mut builder);
        assert_eq!(
            builder.sql(),
            "SELECT settings.instance_id, settings.organization_id, settings.type FROM zitadel.settings"
        );
        assert_eq!(SettingRow::instance_id_column().to_string(), "settings.instance_id");
    }
}
