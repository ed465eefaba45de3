use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

/// A saved product reference with its display snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub product_id: String,
    pub product_name: Option<String>,
    pub product_price: Option<f64>,
    pub created_at: OffsetDateTime,
}

impl Favorite {
    /// Idempotent insert; `INSERT OR IGNORE` makes the (user, product)
    /// uniqueness atomic under concurrency. Returns whether a row was
    /// actually added.
    pub async fn add(
        db: &SqlitePool,
        user_id: i64,
        product_id: &str,
        product_name: Option<&str>,
        product_price: Option<f64>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO favorites (user_id, product_id, product_name, product_price, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(product_name)
        .bind(product_price)
        .bind(OffsetDateTime::now_utc())
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns whether a row existed and was deleted.
    pub async fn remove(db: &SqlitePool, user_id: i64, product_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM favorites
            WHERE user_id = ? AND product_id = ?
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest-first; empty for an unknown user.
    pub async fn list_by_user(db: &SqlitePool, user_id: i64) -> anyhow::Result<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT product_id, product_name, product_price, created_at
            FROM favorites
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use crate::state::AppState;

    async fn make_user(state: &AppState) -> i64 {
        User::create(&state.db, "fav@example.com", "h", None, None)
            .await
            .expect("create user")
            .id
    }

    #[tokio::test]
    async fn add_twice_keeps_one_row_and_reports_already_present() {
        let state = AppState::fake().await;
        let user_id = make_user(&state).await;

        let first = Favorite::add(&state.db, user_id, "SKU1", Some("Shoe"), Some(99.0))
            .await
            .expect("add");
        let second = Favorite::add(&state.db, user_id, "SKU1", Some("Shoe"), Some(99.0))
            .await
            .expect("add");
        assert!(first);
        assert!(!second);

        let favorites = Favorite::list_by_user(&state.db, user_id)
            .await
            .expect("list");
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].product_id, "SKU1");
        assert_eq!(favorites[0].product_price, Some(99.0));
    }

    #[tokio::test]
    async fn remove_missing_pair_reports_not_removed() {
        let state = AppState::fake().await;
        let user_id = make_user(&state).await;
        let removed = Favorite::remove(&state.db, user_id, "never-added")
            .await
            .expect("remove");
        assert!(!removed);
    }

    #[tokio::test]
    async fn add_then_remove_roundtrip() {
        let state = AppState::fake().await;
        let user_id = make_user(&state).await;

        assert!(Favorite::add(&state.db, user_id, "SKU2", None, None)
            .await
            .expect("add"));
        assert!(Favorite::remove(&state.db, user_id, "SKU2")
            .await
            .expect("remove"));
        assert!(Favorite::list_by_user(&state.db, user_id)
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn list_is_ordered_newest_first() {
        let state = AppState::fake().await;
        let user_id = make_user(&state).await;

        for sku in ["SKU-A", "SKU-B", "SKU-C"] {
            Favorite::add(&state.db, user_id, sku, None, None)
                .await
                .expect("add");
        }

        let favorites = Favorite::list_by_user(&state.db, user_id)
            .await
            .expect("list");
        let order: Vec<&str> = favorites.iter().map(|f| f.product_id.as_str()).collect();
        assert_eq!(order, ["SKU-C", "SKU-B", "SKU-A"]);
    }

    #[tokio::test]
    async fn list_for_unknown_user_is_empty() {
        let state = AppState::fake().await;
        assert!(Favorite::list_by_user(&state.db, 999)
            .await
            .expect("list")
            .is_empty());
    }
}
