//! Product Repository (read side only, catalog CRUD lives elsewhere)

use super::RepoResult;
use shared::models::Product;
use sqlx::{Executor, QueryBuilder, Sqlite};

const PRODUCT_SELECT: &str = "SELECT id, name, price, image_url, is_deleted FROM product";

/// Batch lookup of orderable (non-deleted) products; missing ids are simply absent
pub async fn find_active_by_ids<'e, E>(executor: E, ids: &[i64]) -> RepoResult<Vec<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(PRODUCT_SELECT);
    builder.push(" WHERE is_deleted = 0 AND id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(executor)
        .await?;
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn seed(pool: &sqlx::SqlitePool) {
        sqlx::query(
            "INSERT INTO product (id, name, price, image_url, is_deleted) VALUES
             (1, 'Kopi', 25000, NULL, 0),
             (2, 'Teh', 15000, 'teh.png', 0),
             (3, 'Retired', 1000, NULL, 1)",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_find_active_by_ids_skips_missing_and_deleted() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;

        let mut found = find_active_by_ids(&db.pool, &[1, 2, 3, 99]).await.unwrap();
        found.sort_by_key(|p| p.id);

        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(found[1].image_url.as_deref(), Some("teh.png"));
    }

    #[tokio::test]
    async fn test_find_active_by_ids_empty_input() {
        let db = DbService::in_memory().await.unwrap();
        assert!(find_active_by_ids(&db.pool, &[]).await.unwrap().is_empty());
    }
}
