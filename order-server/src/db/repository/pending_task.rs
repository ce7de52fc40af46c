//! Pending Task Repository
//!
//! Durable queue backing the background task worker. Rows stay `PENDING`
//! until processed (then deleted) or until retries run out (`DEAD`).

use super::RepoResult;
use sqlx::{Executor, Sqlite};

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_DEAD: &str = "DEAD";

/// Queued task row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingTask {
    pub id: i64,
    pub kind: String,
    /// JSON payload, shape depends on `kind`
    pub payload: String,
    pub status: String,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub next_attempt_at: i64,
    pub created_at: i64,
}

const TASK_SELECT: &str = "SELECT id, kind, payload, status, retry_count, last_error, next_attempt_at, created_at FROM pending_task";

pub async fn enqueue<'e, E>(executor: E, kind: &str, payload: &str, now: i64) -> RepoResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO pending_task (kind, payload, status, retry_count, next_attempt_at, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?, ?) RETURNING id",
    )
    .bind(kind)
    .bind(payload)
    .bind(STATUS_PENDING)
    .bind(now)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Pending tasks whose backoff has elapsed, oldest first
pub async fn find_due<'e, E>(executor: E, now: i64, limit: i64) -> RepoResult<Vec<PendingTask>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{TASK_SELECT} WHERE status = ? AND next_attempt_at <= ? ORDER BY next_attempt_at, id LIMIT ?"
    );
    let tasks = sqlx::query_as::<_, PendingTask>(&sql)
        .bind(STATUS_PENDING)
        .bind(now)
        .bind(limit)
        .fetch_all(executor)
        .await?;
    Ok(tasks)
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> RepoResult<Option<PendingTask>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{TASK_SELECT} WHERE id = ?");
    let task = sqlx::query_as::<_, PendingTask>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(task)
}

/// Task done, drop it from the queue
pub async fn complete<'e, E>(executor: E, id: i64) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM pending_task WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Record a failed attempt and schedule the next one
pub async fn mark_failed<'e, E>(
    executor: E,
    id: i64,
    error: &str,
    next_attempt_at: i64,
    now: i64,
) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE pending_task SET retry_count = retry_count + 1, last_error = ?, next_attempt_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(error)
    .bind(next_attempt_at)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn move_to_dead<'e, E>(executor: E, id: i64, error: &str, now: i64) -> RepoResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE pending_task SET status = ?, retry_count = retry_count + 1, last_error = ?, updated_at = ? WHERE id = ?",
    )
    .bind(STATUS_DEAD)
    .bind(error)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Put dead tasks back in the queue with a fresh retry budget
pub async fn revive_dead<'e, E>(executor: E, now: i64) -> RepoResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE pending_task SET status = ?, retry_count = 0, next_attempt_at = ?, updated_at = ? WHERE status = ?",
    )
    .bind(STATUS_PENDING)
    .bind(now)
    .bind(now)
    .bind(STATUS_DEAD)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected())
}
