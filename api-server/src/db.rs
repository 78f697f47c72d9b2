//! PostgreSQL task store
//!
//! Every operation is a single statement; ids and timestamps are generated
//! by the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};
use uuid::Uuid;

use board_core::task::{
    Assignee, NewTask, QueryPlan, Task, TaskPatch, TaskPriority, TaskRepository, TaskStatus,
    TASK_COLUMNS,
};
use board_core::{Error, Result};

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS pgcrypto",
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          UUID        PRIMARY KEY DEFAULT gen_random_uuid(),
        title       TEXT        NOT NULL,
        description TEXT        NOT NULL DEFAULT '',
        status      TEXT        NOT NULL DEFAULT 'todo',
        priority    TEXT        NOT NULL DEFAULT 'medium',
        due_date    TIMESTAMPTZ NULL,
        assignee    JSONB       NOT NULL DEFAULT jsonb_build_object('name', 'Unassigned', 'avatar', ''),
        tags        TEXT[]      NOT NULL DEFAULT '{}',
        progress    INT         NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT tasks_priority_allowed CHECK (priority IN ('low', 'medium', 'high'))
    )
    "#,
];

/// Rewrites rows written under the older `todo/in_progress/done` constraint.
const LEGACY_STATUS_MIGRATION: &[&str] = &[
    "ALTER TABLE tasks DROP CONSTRAINT IF EXISTS tasks_status_allowed",
    "UPDATE tasks SET status = 'in-progress' WHERE status = 'in_progress'",
    "UPDATE tasks SET status = 'completed' WHERE status = 'done'",
];

const LEGACY_COMPLETED_COLUMN: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM information_schema.columns
        WHERE table_name = 'tasks' AND column_name = 'completed'
    )
"#;

const FOLD_COMPLETED_COLUMN: &[&str] = &[
    "UPDATE tasks SET status = 'completed', progress = 100 WHERE completed IS TRUE AND status <> 'completed'",
    "DROP INDEX IF EXISTS idx_tasks_completed",
    "ALTER TABLE tasks DROP COLUMN completed",
];

const CONSTRAINTS_AND_INDEXES: &[&str] = &[
    "ALTER TABLE tasks ADD CONSTRAINT tasks_status_allowed CHECK (status IN ('todo', 'in-progress', 'review', 'completed'))",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)",
];

fn storage(err: sqlx::Error) -> Error {
    Error::storage(err.to_string())
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

fn decode_status(raw: &str) -> std::result::Result<TaskStatus, sqlx::Error> {
    TaskStatus::from_legacy(raw).ok_or_else(|| decode_error(format!("unknown status {:?}", raw)))
}

fn decode_priority(raw: &str) -> std::result::Result<TaskPriority, sqlx::Error> {
    raw.parse()
        .map_err(|_| decode_error(format!("unknown priority {:?}", raw)))
}

fn decode_progress(raw: i32) -> std::result::Result<u8, sqlx::Error> {
    u8::try_from(raw)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| decode_error(format!("progress out of range: {}", raw)))
}

fn task_from_row(row: &PgRow) -> std::result::Result<Task, sqlx::Error> {
    let status = decode_status(&row.try_get::<String, _>("status")?)?;
    let priority = decode_priority(&row.try_get::<String, _>("priority")?)?;
    let progress = decode_progress(row.try_get("progress")?)?;
    let due_date: Option<DateTime<Utc>> = row.try_get("due_date")?;
    let Json(assignee): Json<Assignee> = row.try_get("assignee")?;

    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status,
        priority,
        due_date: due_date.map(|due| due.to_rfc3339()),
        assignee,
        tags: row.try_get("tags")?,
        progress,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Statements run once the legacy `completed` column has been probed.
fn finishing_steps(has_completed_column: bool) -> Vec<&'static str> {
    let fold: &[&str] = if has_completed_column {
        FOLD_COMPLETED_COLUMN
    } else {
        &[]
    };
    fold.iter().chain(CONSTRAINTS_AND_INDEXES).copied().collect()
}

/// `UPDATE … RETURNING` touching only the fields present in the patch.
fn update_statement(id: Uuid, patch: TaskPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET ");
    let mut fields = builder.separated(", ");
    if let Some(title) = patch.title {
        fields.push("title = ").push_bind_unseparated(title);
    }
    if let Some(description) = patch.description {
        fields.push("description = ").push_bind_unseparated(description);
    }
    if let Some(status) = patch.status {
        fields.push("status = ").push_bind_unseparated(status.as_str());
    }
    if let Some(priority) = patch.priority {
        fields.push("priority = ").push_bind_unseparated(priority.as_str());
    }
    if let Some(due_date) = patch.due_date {
        fields.push("due_date = ").push_bind_unseparated(due_date);
    }
    if let Some(assignee) = patch.assignee {
        fields.push("assignee = ").push_bind_unseparated(Json(assignee));
    }
    if let Some(tags) = patch.tags {
        fields.push("tags = ").push_bind_unseparated(tags);
    }
    if let Some(progress) = patch.progress {
        fields.push("progress = ").push_bind_unseparated(i32::from(progress));
    }
    fields.push("updated_at = NOW()");

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(TASK_COLUMNS);
    builder
}

pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    /// Open a bounded pool against the configured database
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, sqlx::Error> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .ssl_mode(if config.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            });

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .idle_timeout(config.idle_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the table if needed and bring older schemas up to date.
    pub async fn init_schema(&self) -> std::result::Result<(), sqlx::Error> {
        for statement in SCHEMA.iter().chain(LEGACY_STATUS_MIGRATION) {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        let has_completed_column: bool = sqlx::query_scalar(LEGACY_COMPLETED_COLUMN)
            .fetch_one(&self.pool)
            .await?;
        if has_completed_column {
            info!("Folding legacy \"completed\" column into status");
        }

        for statement in finishing_steps(has_completed_column) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PgTaskStore {
    async fn list(&self, plan: &QueryPlan) -> Result<Vec<Task>> {
        let sql = plan.to_sql();
        debug!("Listing tasks: {}", sql.text);

        let mut query = sqlx::query(&sql.text);
        for value in &sql.binds {
            query = query.bind(*value);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(storage)?;
        rows.iter()
            .map(task_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(storage)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.as_ref().map(task_from_row).transpose().map_err(storage)
    }

    async fn create(&self, task: NewTask) -> Result<Task> {
        let sql = format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, assignee, tags, progress)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.due_date)
            .bind(Json(&task.assignee))
            .bind(&task.tags)
            .bind(i32::from(task.progress))
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        task_from_row(&row).map_err(storage)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task> {
        if patch.is_empty() {
            return Err(Error::validation("Nothing to update"));
        }

        let mut builder = update_statement(id, patch);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        task_from_row(&row).map_err(storage)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn now(&self) -> Result<DateTime<Utc>> {
        sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }
}
