//! Postgres-backed store implementation.
//!
//! Behind the `postgres` feature. Ownership scoping is enforced in SQL: every
//! statement that touches an owned row filters `id = $1 AND owner_id = $2`,
//! and email uniqueness is a UNIQUE constraint, so the duplicate-registration
//! race is decided by the database rather than an application pre-check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use taxtally_core::{CalculationId, ReminderId, UserId};

use crate::records::{CalculationRecord, ReminderPatch, ReminderRecord, UserRecord};
use crate::store::{StoreError, TaxStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calculations (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        calc_type TEXT NOT NULL,
        inputs JSONB NOT NULL,
        results JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reminders (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT NOT NULL,
        category TEXT NOT NULL,
        completed BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_calculations_owner ON calculations (owner_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders (owner_id, due_date ASC)",
];

/// Postgres-backed [`TaxStore`].
///
/// Uses the SQLx connection pool, so the store is `Send + Sync` and cheap to
/// clone across request handlers.
#[derive(Debug, Clone)]
pub struct PostgresTaxStore {
    pool: Arc<PgPool>,
}

impl PostgresTaxStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        tracing::info!("connected to postgres and ensured schema");
        Ok(store)
    }

    /// Idempotent schema setup (CREATE TABLE IF NOT EXISTS).
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaxStore for PostgresTaxStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            // The UNIQUE constraint on email decides the duplicate race.
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                map_sqlx_error("insert_user", e)
            }
        })?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        if let Some(row) = row {
            let user = UserRow::from_row(&row).map_err(|e| map_sqlx_error("decode_user_row", e))?;
            Ok(Some(user.into()))
        } else {
            Ok(None)
        }
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        if let Some(row) = row {
            let user = UserRow::from_row(&row).map_err(|e| map_sqlx_error("decode_user_row", e))?;
            Ok(Some(user.into()))
        } else {
            Ok(None)
        }
    }

    async fn insert_calculation(&self, calculation: CalculationRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO calculations (id, owner_id, calc_type, inputs, results, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(calculation.id.as_uuid())
        .bind(calculation.owner_id.as_uuid())
        .bind(&calculation.calc_type)
        .bind(sqlx::types::Json(&calculation.inputs))
        .bind(sqlx::types::Json(&calculation.results))
        .bind(calculation.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_calculation", e))?;
        Ok(())
    }

    async fn list_calculations(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, calc_type, inputs, results, created_at
            FROM calculations
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(owner.as_uuid())
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_calculations", e))?;

        let mut calculations = Vec::with_capacity(rows.len());
        for row in rows {
            let decoded = CalculationRow::from_row(&row)
                .map_err(|e| map_sqlx_error("decode_calculation_row", e))?;
            calculations.push(decoded.into());
        }
        Ok(calculations)
    }

    async fn delete_calculation(
        &self,
        owner: UserId,
        id: CalculationId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM calculations WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_calculation", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_reminder(&self, reminder: ReminderRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reminders (id, owner_id, title, description, due_date, category, completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reminder.id.as_uuid())
        .bind(reminder.owner_id.as_uuid())
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(&reminder.due_date)
        .bind(&reminder.category)
        .bind(reminder.completed)
        .bind(reminder.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reminder", e))?;
        Ok(())
    }

    async fn list_reminders(
        &self,
        owner: UserId,
        limit: usize,
    ) -> Result<Vec<ReminderRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, due_date, category, completed, created_at
            FROM reminders
            WHERE owner_id = $1
            ORDER BY due_date ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(owner.as_uuid())
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_reminders", e))?;

        let mut reminders = Vec::with_capacity(rows.len());
        for row in rows {
            let decoded =
                ReminderRow::from_row(&row).map_err(|e| map_sqlx_error("decode_reminder_row", e))?;
            reminders.push(decoded.into());
        }
        Ok(reminders)
    }

    async fn update_reminder(
        &self,
        owner: UserId,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<Option<ReminderRecord>, StoreError> {
        // COALESCE keeps omitted fields as they are; the columns are NOT NULL
        // so a patch can never null anything out.
        let row = sqlx::query(
            r#"
            UPDATE reminders SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                due_date = COALESCE($5, due_date),
                category = COALESCE($6, category),
                completed = COALESCE($7, completed)
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, due_date, category, completed, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.due_date.as_deref())
        .bind(patch.category.as_deref())
        .bind(patch.completed)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_reminder", e))?;

        if let Some(row) = row {
            let reminder =
                ReminderRow::from_row(&row).map_err(|e| map_sqlx_error("decode_reminder_row", e))?;
            Ok(Some(reminder.into()))
        } else {
            Ok(None)
        }
    }

    async fn delete_reminder(&self, owner: UserId, id: ReminderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reminder", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Map SQLx errors to opaque backend errors, keeping the failing operation
/// in the message for the server log.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::backend(format!("{operation}: {err}"))
}

/// Check if an error is a unique constraint violation (Postgres 23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct CalculationRow {
    id: Uuid,
    owner_id: Uuid,
    calc_type: String,
    inputs: sqlx::types::Json<Map<String, Value>>,
    results: sqlx::types::Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CalculationRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CalculationRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            calc_type: row.try_get("calc_type")?,
            inputs: row.try_get("inputs")?,
            results: row.try_get("results")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<CalculationRow> for CalculationRecord {
    fn from(row: CalculationRow) -> Self {
        CalculationRecord {
            id: CalculationId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            calc_type: row.calc_type,
            inputs: row.inputs.0,
            results: row.results.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct ReminderRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    due_date: String,
    category: String,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ReminderRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReminderRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: row.try_get("due_date")?,
            category: row.try_get("category")?,
            completed: row.try_get("completed")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ReminderRow> for ReminderRecord {
    fn from(row: ReminderRow) -> Self {
        ReminderRecord {
            id: ReminderId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            category: row.category,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}
