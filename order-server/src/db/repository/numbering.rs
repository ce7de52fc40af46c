//! Numbering Repository
//!
//! One counter row per module. The increment and the read happen in the same
//! statement, so concurrent writers serialize on the row and never observe
//! the same value.

use super::{RepoError, RepoResult};
use sqlx::{Executor, Sqlite};

/// Take the current counter value for `module` and advance it by one.
///
/// Run inside the transaction that uses the number: a rollback also undoes
/// the increment.
pub async fn next<'e, E>(executor: E, module: &str) -> RepoResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "UPDATE numbering SET number = number + 1 WHERE module = ? RETURNING number - 1",
    )
    .bind(module)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Numbering module {module} not found")))
}

/// Value the next call to [`next`] will hand out
pub async fn peek<'e, E>(executor: E, module: &str) -> RepoResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let number = sqlx::query_scalar::<_, i64>("SELECT number FROM numbering WHERE module = ?")
        .bind(module)
        .fetch_optional(executor)
        .await?;
    Ok(number)
}
