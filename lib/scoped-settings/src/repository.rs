//! Repository over `zitadel.settings`.
//!
//! One [`SettingsRepository`] per setting kind. Every operation filters on the
//! kind's `type` and refuses conditions that leave a tenant column open, so a
//! caller can never read or touch another instance's settings by accident.

use std::fmt;
use std::marker::PhantomData;

use scoped_storage::{
    Change, Changes, Column, Condition, JsonOp, Order, QueryExecutor, QueryOpts, Statement,
    StatementBuilder, StorageError, Table, TextOperation, Timestamp, check_restrictions,
    collect_exactly_one, collect_rows,
};
use serde::Deserialize;

use crate::setting::{Setting, SettingKind, SettingRow, SettingState};

const UNIQUE_COLUMNS: &str = "(instance_id, organization_id, type, state)";

/// Columns assigned by the database on insert.
#[derive(Deserialize)]
struct Stamped {
    id: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

pub struct SettingsRepository<K> {
    kind: PhantomData<fn() -> K>,
}

impl<K> SettingsRepository<K> {
    pub const fn new() -> Self {
        Self { kind: PhantomData }
    }
}

impl<K> Default for SettingsRepository<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for SettingsRepository<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for SettingsRepository<K> {}

impl<K: SettingKind> fmt::Debug for SettingsRepository<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRepository")
            .field("type", &K::TYPE)
            .finish()
    }
}

// columns

impl<K: SettingKind> SettingsRepository<K> {
    pub fn instance_id_column(&self) -> Column {
        SettingRow::instance_id_column()
    }

    pub fn organization_id_column(&self) -> Column {
        SettingRow::organization_id_column()
    }

    pub fn id_column(&self) -> Column {
        SettingRow::id_column()
    }

    pub fn type_column(&self) -> Column {
        SettingRow::kind_column()
    }

    pub fn state_column(&self) -> Column {
        SettingRow::state_column()
    }

    pub fn attributes_column(&self) -> Column {
        SettingRow::attributes_column()
    }

    pub fn created_at_column(&self) -> Column {
        SettingRow::created_at_column()
    }

    pub fn updated_at_column(&self) -> Column {
        SettingRow::updated_at_column()
    }
}

// conditions

impl<K: SettingKind> SettingsRepository<K> {
    pub fn instance_id_condition(&self, instance_id: &str) -> Condition {
        Condition::text(self.instance_id_column(), TextOperation::Equal, instance_id)
    }

    /// `None` selects instance-level settings (`organization_id IS NULL`).
    pub fn organization_id_condition(&self, organization_id: Option<&str>) -> Condition {
        Condition::text_or_null(self.organization_id_column(), organization_id)
    }

    pub fn id_condition(&self, id: &str) -> Condition {
        Condition::text(self.id_column(), TextOperation::Equal, id)
    }

    pub fn state_condition(&self, state: SettingState) -> Condition {
        Condition::text(self.state_column(), TextOperation::Equal, state)
    }

    pub fn type_condition(&self) -> Condition {
        Condition::text(self.type_column(), TextOperation::Equal, K::TYPE)
    }

    pub fn primary_key_condition(&self, instance_id: &str, id: &str, state: SettingState) -> Condition {
        Condition::and([
            self.instance_id_condition(instance_id),
            self.id_condition(id),
            self.state_condition(state),
        ])
    }

    /// Matches the single row of this kind for a scope and state.
    pub fn unique_condition(
        &self,
        instance_id: &str,
        organization_id: Option<&str>,
        state: SettingState,
    ) -> Condition {
        Condition::and([
            self.instance_id_condition(instance_id),
            self.organization_id_condition(organization_id),
            self.type_condition(),
            self.state_condition(state),
        ])
    }

    fn scoped(
        &self,
        condition: Option<Condition>,
        filters: impl IntoIterator<Item = Condition>,
    ) -> Condition {
        let mut all: Vec<Condition> = condition.into_iter().collect();
        all.push(self.type_condition());
        all.extend(filters);
        Condition::and(all)
    }
}

// changes

impl<K: SettingKind> SettingsRepository<K> {
    /// Replace the whole attribute document.
    pub fn set_attributes(&self, attributes: &K) -> Result<Change, StorageError> {
        let value = serde_json::to_value(attributes).map_err(StorageError::Encode)?;
        Ok(Change::set(self.attributes_column(), value))
    }

    pub fn set_updated_at(&self, updated_at: Timestamp) -> Change {
        Change::set(self.updated_at_column(), updated_at)
    }

    pub(crate) fn attribute(&self, path: &[&str], op: JsonOp) -> Change {
        Change::json(self.attributes_column(), path.iter().copied(), op)
    }

    pub(crate) fn set_attribute(&self, path: &[&str], value: impl Into<serde_json::Value>) -> Change {
        self.attribute(path, JsonOp::Set(value.into()))
    }

    fn scope_changes(
        &self,
        instance_id: &str,
        organization_id: Option<&str>,
        state: SettingState,
    ) -> Changes {
        Changes::new()
            .with(Change::set(self.instance_id_column(), instance_id))
            .with(Change::set(self.organization_id_column(), organization_id))
            .with(Change::set(self.type_column(), K::TYPE))
            .with(Change::set(self.state_column(), state))
    }
}

// operations

impl<K: SettingKind> SettingsRepository<K> {
    /// Fetch exactly one setting.
    ///
    /// The condition must pin `instance_id`, `organization_id` and `state`.
    pub async fn get<E>(&self, executor: &mut E, opts: QueryOpts) -> Result<Setting<K>, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        check_restrictions(
            opts.condition.as_ref(),
            &[
                self.instance_id_column(),
                self.organization_id_column(),
                self.state_column(),
            ],
        )?;
        let statement = self.select(&opts);
        let row: SettingRow = collect_exactly_one(executor.query(&statement).await?)?;
        Setting::try_from(row)
    }

    /// All settings of this kind matching the condition, oldest first unless
    /// the options order otherwise.
    pub async fn list<E>(
        &self,
        executor: &mut E,
        opts: QueryOpts,
    ) -> Result<Vec<Setting<K>>, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        check_restrictions(opts.condition.as_ref(), &[self.instance_id_column()])?;
        let opts = if opts.order_by.is_empty() {
            opts.order_by(self.created_at_column(), Order::Asc)
        } else {
            opts
        };
        let statement = self.select(&opts);
        let rows: Vec<SettingRow> = collect_rows(&executor.query(&statement).await?)?;
        rows.into_iter().map(Setting::try_from).collect()
    }

    /// Insert a new row as given. Fails with `Unique` when the scope already
    /// has a row of this kind in the same state.
    ///
    /// An empty `id` is left to the column default. The assigned id and
    /// timestamps are written back into `setting`.
    pub async fn create<E>(&self, executor: &mut E, setting: &mut Setting<K>) -> Result<(), StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        let mut changes = self.scope_changes(
            &setting.instance_id,
            setting.organization_id.as_deref(),
            setting.state,
        );
        changes.push(self.id_change(&setting.id));
        changes.push(self.set_attributes(&setting.attributes)?);
        changes.push(Change::set(self.created_at_column(), &setting.created_at));
        changes.push(Change::set(self.updated_at_column(), &setting.updated_at));

        let mut builder = self.insert_into();
        changes.write_insert(&mut builder)?;
        builder.write_str(" RETURNING id, created_at, updated_at");
        self.write_back(executor, &builder.build(), setting).await
    }

    /// Upsert the full document of `setting` in its state.
    ///
    /// An existing row keeps its id and `created_at` and takes the new
    /// attributes. Timestamps come from the database clock.
    pub async fn set<E>(&self, executor: &mut E, setting: &mut Setting<K>) -> Result<(), StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        let mut changes = self.scope_changes(
            &setting.instance_id,
            setting.organization_id.as_deref(),
            setting.state,
        );
        changes.push(self.id_change(&setting.id));
        changes.push(self.set_attributes(&setting.attributes)?);
        changes.push(Change::set_server_time(self.created_at_column()));
        changes.push(Change::set_server_time(self.updated_at_column()));

        let mut builder = self.insert_into();
        changes.write_insert(&mut builder)?;
        builder.write_str(" ON CONFLICT ");
        builder.write_str(UNIQUE_COLUMNS);
        builder.write_str(
            " DO UPDATE SET attributes = EXCLUDED.attributes, updated_at = EXCLUDED.updated_at",
        );
        builder.write_str(" RETURNING id, created_at, updated_at");
        self.write_back(executor, &builder.build(), setting).await
    }

    /// Apply `changes` to the scope's row in the kind's ensure state
    /// (preview for most kinds), creating the row when absent.
    pub async fn ensure<E>(
        &self,
        executor: &mut E,
        instance_id: &str,
        organization_id: Option<&str>,
        changes: Changes,
    ) -> Result<(), StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        self.ensure_in_state(executor, instance_id, organization_id, K::ENSURE_STATE, changes)
            .await
    }

    /// Like [`ensure`](Self::ensure) but into an explicit state.
    ///
    /// A new row receives the changes applied to an empty document; an
    /// existing row receives them on top of its current attributes.
    pub async fn ensure_in_state<E>(
        &self,
        executor: &mut E,
        instance_id: &str,
        organization_id: Option<&str>,
        state: SettingState,
        changes: Changes,
    ) -> Result<(), StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        if changes.is_empty() {
            return Err(StorageError::NoChanges);
        }
        self.reject_key_changes(&changes)?;

        let mut insert = self.scope_changes(instance_id, organization_id, state);
        insert.extend(changes.iter().cloned());
        for column in [self.created_at_column(), self.updated_at_column()] {
            if !insert.is_on_column(&column) {
                insert.push(Change::set_server_time(column));
            }
        }
        let update = self.stamp_updated_at(changes);

        let mut builder = self.insert_into();
        insert.write_insert(&mut builder)?;
        builder.write_str(" ON CONFLICT ");
        builder.write_str(UNIQUE_COLUMNS);
        builder.write_str(" DO UPDATE SET ");
        update.write_update(&mut builder)?;

        executor.exec(&builder.build()).await?;
        tracing::debug!(
            setting_type = %K::TYPE,
            %state,
            instance_id,
            organization_id,
            "ensured setting"
        );
        Ok(())
    }

    /// Apply `changes` to rows in the kind's ensure state matching the condition.
    ///
    /// For kinds edited as a preview, active rows are never edited in place.
    /// `updated_at` is stamped with the database clock unless the changes set it.
    pub async fn update<E>(
        &self,
        executor: &mut E,
        condition: Condition,
        changes: Changes,
    ) -> Result<u64, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        check_restrictions(
            Some(&condition),
            &[self.instance_id_column(), self.organization_id_column()],
        )?;
        if changes.is_empty() {
            return Err(StorageError::NoChanges);
        }
        self.reject_key_changes(&changes)?;
        let changes = self.stamp_updated_at(changes);

        let mut builder = StatementBuilder::new();
        builder.write_str("UPDATE ");
        builder.write_str(&SettingRow::qualified_name());
        builder.write_str(" SET ");
        changes.write_update(&mut builder)?;
        builder.write_str(" WHERE ");
        self.scoped(Some(condition), [self.state_condition(K::ENSURE_STATE)])
            .write(&mut builder);

        executor.exec(&builder.build()).await
    }

    /// Delete rows of this kind in both states.
    pub async fn delete<E>(&self, executor: &mut E, condition: Condition) -> Result<u64, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        check_restrictions(
            Some(&condition),
            &[self.instance_id_column(), self.organization_id_column()],
        )?;

        let mut builder = StatementBuilder::new();
        builder.write_str("DELETE FROM ");
        builder.write_str(&SettingRow::qualified_name());
        builder.write_str(" WHERE ");
        self.scoped(Some(condition), []).write(&mut builder);

        executor.exec(&builder.build()).await
    }

    /// Promote the matching preview row to active, stamping `updated_at`
    /// with the database clock.
    pub async fn activate<E>(&self, executor: &mut E, condition: Condition) -> Result<u64, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        self.promote(executor, condition, None).await
    }

    /// Promote the matching preview row to active with an explicit `updated_at`.
    pub async fn activate_at<E>(
        &self,
        executor: &mut E,
        condition: Condition,
        updated_at: Timestamp,
    ) -> Result<u64, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        self.promote(executor, condition, Some(updated_at)).await
    }

    // Copies id, created_at and attributes from the preview row. An existing
    // active row only takes attributes and updated_at.
    async fn promote<E>(
        &self,
        executor: &mut E,
        condition: Condition,
        updated_at: Option<Timestamp>,
    ) -> Result<u64, StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        check_restrictions(
            Some(&condition),
            &[self.instance_id_column(), self.organization_id_column()],
        )?;

        let mut builder = self.insert_into();
        builder.write_str(
            "(instance_id, organization_id, id, type, state, attributes, created_at, updated_at) SELECT ",
        );
        for column in [
            self.instance_id_column(),
            self.organization_id_column(),
            self.id_column(),
            self.type_column(),
        ] {
            column.write_qualified(&mut builder);
            builder.write_str(", ");
        }
        builder.write_arg(SettingState::Active);
        builder.write_str(", ");
        self.attributes_column().write_qualified(&mut builder);
        builder.write_str(", ");
        self.created_at_column().write_qualified(&mut builder);
        builder.write_str(", ");
        match updated_at {
            Some(at) => builder.write_arg(at),
            None => builder.write_str("NOW()"),
        }
        builder.write_str(" FROM ");
        builder.write_str(&SettingRow::qualified_name());
        builder.write_str(" WHERE ");
        self.scoped(Some(condition), [self.state_condition(SettingState::Preview)])
            .write(&mut builder);
        builder.write_str(" ON CONFLICT ");
        builder.write_str(UNIQUE_COLUMNS);
        builder.write_str(
            " DO UPDATE SET attributes = EXCLUDED.attributes, updated_at = EXCLUDED.updated_at",
        );

        let activated = executor.exec(&builder.build()).await?;
        tracing::debug!(setting_type = %K::TYPE, activated, "activated setting");
        Ok(activated)
    }

    fn select(&self, opts: &QueryOpts) -> Statement {
        let mut builder = StatementBuilder::new();
        SettingRow::write_select(&mut builder);
        builder.write_str(" WHERE ");
        self.scoped(opts.condition.clone(), []).write(&mut builder);
        opts.write_tail(&mut builder);
        builder.build()
    }

    fn insert_into(&self) -> StatementBuilder {
        let mut builder = StatementBuilder::new();
        builder.write_str("INSERT INTO ");
        builder.write_str(&SettingRow::qualified_name());
        builder.write_char(' ');
        builder
    }

    fn id_change(&self, id: &str) -> Change {
        if id.is_empty() {
            Change::set_default(self.id_column())
        } else {
            Change::set(self.id_column(), id)
        }
    }

    /// Scope and key columns are fixed by the operation, never by the caller.
    fn reject_key_changes(&self, changes: &Changes) -> Result<(), StorageError> {
        let keys = [
            self.instance_id_column(),
            self.organization_id_column(),
            self.id_column(),
            self.type_column(),
            self.state_column(),
        ];
        match keys.into_iter().find(|column| changes.is_on_column(column)) {
            Some(column) => {
                tracing::debug!(%column, setting_type = %K::TYPE, "rejected change to key column");
                Err(StorageError::ImmutableColumn(column))
            }
            None => Ok(()),
        }
    }

    fn stamp_updated_at(&self, mut changes: Changes) -> Changes {
        let column = self.updated_at_column();
        if !changes.is_on_column(&column) {
            changes.push(Change::set_server_time(column));
        }
        changes
    }

    async fn write_back<E>(
        &self,
        executor: &mut E,
        statement: &Statement,
        setting: &mut Setting<K>,
    ) -> Result<(), StorageError>
    where
        E: QueryExecutor + ?Sized,
    {
        let stamped: Stamped = executor.query_row(statement).await?.scan()?;
        setting.id = stamped.id;
        setting.created_at = stamped.created_at;
        setting.updated_at = stamped.updated_at;
        Ok(())
    }
}

/// Remove every setting of an instance, organization-level ones included.
pub async fn delete_instance_settings<E>(executor: &mut E, instance_id: &str) -> Result<u64, StorageError>
where
    E: QueryExecutor + ?Sized,
{
    let condition = Condition::text(SettingRow::instance_id_column(), TextOperation::Equal, instance_id);
    delete_where(executor, condition, &[SettingRow::instance_id_column()]).await
}

/// Remove every setting of one organization.
pub async fn delete_organization_settings<E>(
    executor: &mut E,
    instance_id: &str,
    organization_id: &str,
) -> Result<u64, StorageError>
where
    E: QueryExecutor + ?Sized,
{
    let condition = Condition::and([
        Condition::text(SettingRow::instance_id_column(), TextOperation::Equal, instance_id),
        Condition::text(
            SettingRow::organization_id_column(),
            TextOperation::Equal,
            organization_id,
        ),
    ]);
    delete_where(
        executor,
        condition,
        &[
            SettingRow::instance_id_column(),
            SettingRow::organization_id_column(),
        ],
    )
    .await
}

async fn delete_where<E>(
    executor: &mut E,
    condition: Condition,
    required: &[Column],
) -> Result<u64, StorageError>
where
    E: QueryExecutor + ?Sized,
{
    check_restrictions(Some(&condition), required)?;

    let mut builder = StatementBuilder::new();
    builder.write_str("DELETE FROM ");
    builder.write_str(&SettingRow::qualified_name());
    builder.write_str(" WHERE ");
    condition.write(&mut builder);
    let deleted = executor.exec(&builder.build()).await?;
    tracing::debug!(deleted, "deleted settings");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::SettingType;
    use scoped_storage::{RecordingExecutor, Row, Value};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Toggles {
        a: i64,
        b: i64,
    }

    impl SettingKind for Toggles {
        const TYPE: SettingType = SettingType::Security;
    }

    const REPO: SettingsRepository<Toggles> = SettingsRepository::new();

    fn scope(org: Option<&str>) -> Condition {
        Condition::and([
            REPO.instance_id_condition("i1"),
            REPO.organization_id_condition(org),
        ])
    }

    fn stored_row(state: &str) -> Row {
        Row::new()
            .with("instance_id", "i1")
            .with("organization_id", "o1")
            .with("id", "s1")
            .with("type", "security")
            .with("state", state)
            .with("attributes", json!({"a": 1, "b": 2}))
            .with("created_at", "2024-01-01T00:00:00.000000Z")
            .with("updated_at", "2024-01-01T00:00:00.000000Z")
    }

    #[tokio::test]
    async fn get_without_instance_is_rejected_before_sql() {
        let mut executor = RecordingExecutor::new();
        let opts = QueryOpts::new().condition(Condition::and([
            REPO.organization_id_condition(None),
            REPO.state_condition(SettingState::Active),
        ]));

        let err = REPO.get(&mut executor, opts).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingCondition(c) if c == REPO.instance_id_column()));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn get_requires_state() {
        let mut executor = RecordingExecutor::new();
        let err = REPO
            .get(&mut executor, QueryOpts::new().condition(scope(Some("o1"))))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingCondition(c) if c == REPO.state_column()));
    }

    #[tokio::test]
    async fn get_decodes_the_row() {
        let mut executor = RecordingExecutor::new();
        executor.push_rows(vec![stored_row("active")]);
        let condition = REPO.unique_condition("i1", Some("o1"), SettingState::Active);

        let setting = REPO
            .get(&mut executor, QueryOpts::new().condition(condition))
            .await
            .unwrap();
        assert_eq!(setting.attributes, Toggles { a: 1, b: 2 });
        assert_eq!(setting.state, SettingState::Active);
        assert_eq!(setting.organization_id.as_deref(), Some("o1"));

        let sql = executor.last().unwrap().sql();
        assert!(sql.starts_with("SELECT settings.instance_id, settings.organization_id"));
        assert!(sql.contains(" FROM zitadel.settings WHERE "));
        assert!(sql.contains("settings.type = $"));
    }

    #[tokio::test]
    async fn get_reports_missing_and_ambiguous_rows() {
        let condition = REPO.unique_condition("i1", Some("o1"), SettingState::Active);
        let mut executor = RecordingExecutor::new();
        let err = REPO
            .get(&mut executor, QueryOpts::new().condition(condition.clone()))
            .await
            .unwrap_err();
        assert!(err.is_no_row_found());

        executor.push_rows(vec![stored_row("active"), stored_row("active")]);
        let err = REPO
            .get(&mut executor, QueryOpts::new().condition(condition))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MultipleRowsFound));
    }

    #[tokio::test]
    async fn list_orders_by_creation_by_default() {
        let mut executor = RecordingExecutor::new();
        executor.push_rows(vec![stored_row("preview"), stored_row("active")]);
        let opts = QueryOpts::new().condition(REPO.instance_id_condition("i1"));

        let settings = REPO.list(&mut executor, opts).await.unwrap();
        assert_eq!(settings.len(), 2);
        assert!(executor
            .last()
            .unwrap()
            .sql()
            .ends_with(" ORDER BY settings.created_at ASC"));
    }

    #[tokio::test]
    async fn list_requires_instance() {
        let mut executor = RecordingExecutor::new();
        let err = REPO.list(&mut executor, QueryOpts::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingCondition(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn update_without_changes_issues_no_sql() {
        let mut executor = RecordingExecutor::new();
        let err = REPO
            .update(&mut executor, scope(None), Changes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NoChanges));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn update_patches_preview_and_stamps_updated_at() {
        let mut executor = RecordingExecutor::new();
        let changes = Changes::new().with(REPO.set_attribute(&["b"], 3));

        let updated = REPO
            .update(&mut executor, scope(Some("o1")), changes)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let statement = executor.last().unwrap();
        assert!(statement.sql().starts_with("UPDATE zitadel.settings SET attributes = "));
        assert!(statement.sql().contains("updated_at = NOW()"));
        assert!(statement.args().contains(&Value::from("preview")));
        assert!(statement.args().contains(&Value::from("security")));
    }

    #[tokio::test]
    async fn update_keeps_caller_updated_at() {
        let mut executor = RecordingExecutor::new();
        let at = Timestamp::now();
        let changes = Changes::new()
            .with(REPO.set_attribute(&["a"], 1))
            .with(REPO.set_updated_at(at.clone()));

        REPO.update(&mut executor, scope(None), changes).await.unwrap();
        let statement = executor.last().unwrap();
        assert!(!statement.sql().contains("NOW()"));
        assert!(statement.args().contains(&Value::from(at)));
    }

    #[tokio::test]
    async fn update_requires_organization() {
        let mut executor = RecordingExecutor::new();
        let changes = Changes::new().with(REPO.set_attribute(&["a"], 1));
        let err = REPO
            .update(&mut executor, REPO.instance_id_condition("i1"), changes)
            .await
            .unwrap_err();
        assert!(
            matches!(err, StorageError::MissingCondition(c) if c == REPO.organization_id_column())
        );
    }

    #[tokio::test]
    async fn ensure_upserts_into_preview() {
        let mut executor = RecordingExecutor::new();
        let changes = Changes::new().with(REPO.set_attribute(&["a"], 1));

        REPO.ensure(&mut executor, "i1", None, changes).await.unwrap();
        let statement = executor.last().unwrap();
        let sql = statement.sql();
        assert!(sql.starts_with(
            "INSERT INTO zitadel.settings (instance_id, organization_id, type, state, attributes, created_at, updated_at) VALUES "
        ));
        assert!(sql.contains(
            " ON CONFLICT (instance_id, organization_id, type, state) DO UPDATE SET attributes = "
        ));
        assert!(sql.ends_with("updated_at = NOW()"));
        assert_eq!(statement.args()[1], Value::Null);
        assert_eq!(statement.args()[3], Value::from("preview"));
    }

    #[tokio::test]
    async fn ensure_without_changes_issues_no_sql() {
        let mut executor = RecordingExecutor::new();
        let err = REPO
            .ensure(&mut executor, "i1", Some("o1"), Changes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NoChanges));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn ensure_rejects_changes_to_scope_columns() {
        let mut executor = RecordingExecutor::new();
        for change in [
            Change::set(REPO.instance_id_column(), "i2"),
            Change::set(REPO.organization_id_column(), "o2"),
            Change::set(REPO.type_column(), SettingType::Login),
            Change::set(REPO.state_column(), SettingState::Active),
        ] {
            let column = *change.column();
            let changes = Changes::new()
                .with(REPO.set_attribute(&["a"], 1))
                .with(change);
            let err = REPO
                .ensure(&mut executor, "i1", Some("o1"), changes)
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::ImmutableColumn(c) if c == column));
        }
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn update_rejects_changes_to_key_columns() {
        let mut executor = RecordingExecutor::new();
        for change in [
            Change::set(REPO.id_column(), "s2"),
            Change::set(REPO.organization_id_column(), "o2"),
            Change::set(REPO.state_column(), SettingState::Active),
        ] {
            let column = *change.column();
            let changes = Changes::new()
                .with(REPO.set_attribute(&["b"], 2))
                .with(change);
            let err = REPO
                .update(&mut executor, scope(Some("o1")), changes)
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::ImmutableColumn(c) if c == column));
        }
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn create_writes_back_assigned_columns() {
        let mut executor = RecordingExecutor::new();
        executor.push_rows(vec![Row::new()
            .with("id", "generated")
            .with("created_at", "2024-03-01T10:00:00.000000Z")
            .with("updated_at", "2024-03-01T10:00:00.000000Z")]);
        let mut setting = Setting::new("i1", Some("o1"), Toggles { a: 1, b: 2 });

        REPO.create(&mut executor, &mut setting).await.unwrap();
        assert_eq!(setting.id, "generated");
        assert_eq!(setting.created_at.to_string(), "2024-03-01T10:00:00.000000Z");

        let sql = executor.last().unwrap().sql();
        assert!(sql.contains("DEFAULT"));
        assert!(!sql.contains("ON CONFLICT"));
        assert!(sql.ends_with(" RETURNING id, created_at, updated_at"));
    }

    #[tokio::test]
    async fn create_surfaces_duplicates() {
        let mut executor = RecordingExecutor::new();
        executor.push_error(StorageError::from_constraint(
            scoped_storage::ConstraintKind::Unique,
            scoped_storage::ConstraintViolation {
                table: Some("settings".into()),
                constraint: Some("settings_unique".into()),
                message: "duplicate key".into(),
            },
        ));
        let mut setting = Setting::new("i1", None, Toggles::default());
        let err = REPO.create(&mut executor, &mut setting).await.unwrap_err();
        assert!(err.is_unique());
        assert!(setting.id.is_empty());
    }

    #[tokio::test]
    async fn set_replaces_the_document() {
        let mut executor = RecordingExecutor::new();
        executor.push_rows(vec![Row::new()
            .with("id", "s1")
            .with("created_at", "2024-01-01T00:00:00.000000Z")
            .with("updated_at", "2024-01-02T00:00:00.000000Z")]);
        let mut setting = Setting::new("i1", Some("o1"), Toggles { a: 5, b: 6 });
        setting.id = "s1".into();

        REPO.set(&mut executor, &mut setting).await.unwrap();
        assert_eq!(setting.updated_at.to_string(), "2024-01-02T00:00:00.000000Z");

        let statement = executor.last().unwrap();
        assert!(statement.args().contains(&Value::from(json!({"a": 5, "b": 6}))));
        assert!(statement.sql().contains(
            "DO UPDATE SET attributes = EXCLUDED.attributes, updated_at = EXCLUDED.updated_at RETURNING"
        ));
    }

    #[tokio::test]
    async fn delete_filters_on_type() {
        let mut executor = RecordingExecutor::new();
        executor.push_affected(2);
        let deleted = REPO.delete(&mut executor, scope(Some("o1"))).await.unwrap();
        assert_eq!(deleted, 2);
        let statement = executor.last().unwrap();
        assert!(statement.sql().starts_with("DELETE FROM zitadel.settings WHERE "));
        assert!(statement.args().contains(&Value::from("security")));
    }

    #[tokio::test]
    async fn delete_without_organization_is_rejected() {
        let mut executor = RecordingExecutor::new();
        let err = REPO
            .delete(&mut executor, REPO.instance_id_condition("i1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingCondition(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn activate_copies_preview_into_active() {
        let mut executor = RecordingExecutor::new();
        REPO.activate(&mut executor, scope(Some("o1"))).await.unwrap();

        let statement = executor.last().unwrap();
        let sql = statement.sql();
        assert!(sql.starts_with(
            "INSERT INTO zitadel.settings (instance_id, organization_id, id, type, state, attributes, created_at, updated_at) \
             SELECT settings.instance_id, settings.organization_id, settings.id, settings.type, $1, \
             settings.attributes, settings.created_at, NOW() FROM zitadel.settings WHERE "
        ));
        assert!(sql.ends_with(
            " ON CONFLICT (instance_id, organization_id, type, state) \
             DO UPDATE SET attributes = EXCLUDED.attributes, updated_at = EXCLUDED.updated_at"
        ));
        assert_eq!(statement.args()[0], Value::from("active"));
        assert!(statement.args().contains(&Value::from("preview")));
    }

    #[tokio::test]
    async fn activate_at_binds_the_timestamp() {
        let mut executor = RecordingExecutor::new();
        let at = Timestamp::now();
        REPO.activate_at(&mut executor, scope(None), at.clone())
            .await
            .unwrap();

        let statement = executor.last().unwrap();
        assert!(!statement.sql().contains("NOW()"));
        assert_eq!(statement.args()[1], Value::from(at));
    }

    #[tokio::test]
    async fn activate_requires_scope() {
        let mut executor = RecordingExecutor::new();
        let condition = Condition::or([
            REPO.instance_id_condition("i1"),
            REPO.organization_id_condition(Some("o1")),
        ]);
        let err = REPO.activate(&mut executor, condition).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingCondition(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn deletes_whole_scopes() {
        let mut executor = RecordingExecutor::new();
        delete_instance_settings(&mut executor, "i1").await.unwrap();
        delete_organization_settings(&mut executor, "i1", "o1")
            .await
            .unwrap();

        let statements = executor.statements();
        assert_eq!(statements[0].args(), &[Value::from("i1")]);
        assert_eq!(statements[1].args(), &[Value::from("i1"), Value::from("o1")]);
        assert!(!statements[1].sql().contains("settings.type"));
    }

    #[tokio::test]
    async fn tenant_cleanup_requires_a_pinned_scope() {
        let mut executor = RecordingExecutor::new();
        let condition = Condition::or([
            REPO.instance_id_condition("i1"),
            REPO.instance_id_condition("i2"),
        ]);
        let err = delete_where(&mut executor, condition, &[REPO.instance_id_column()])
            .await
            .unwrap_err();
        assert!(
            matches!(err, StorageError::MissingCondition(c) if c == REPO.instance_id_column())
        );

        let err = delete_where(
            &mut executor,
            REPO.instance_id_condition("i1"),
            &[REPO.instance_id_column(), REPO.organization_id_column()],
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, StorageError::MissingCondition(c) if c == REPO.organization_id_column())
        );
        assert!(executor.statements().is_empty());
    }
}
