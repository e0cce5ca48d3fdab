use sqlx::{Pool, Postgres};

use crate::{
    database::error::QueryError,
    database::pagination::PageContext,
    database::schema::{BriefRecipe, SubscriptionRowPartial, SubscriptionView, Uuid},
    error::ApiError,
};

use super::get_user_by_id;

pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    if user_id == author_id {
        return Err(ApiError::Validation(String::from(
            "You cannot subscribe to yourself",
        )));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Validation(String::from(
            "You are already subscribed to this author",
        )));
    }

    subscription_view(author_id, recipes_limit, pool).await
}

pub async fn unsubscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "You are not subscribed to this author",
        )));
    }

    Ok(())
}

pub async fn fetch_subscriptions(
    user_id: Uuid,
    recipes_limit: Option<i64>,
    offset: i64,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionView>, ApiError> {
    let rows: Vec<SubscriptionRowPartial> = sqlx::query_as(
        "
        SELECT s.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        WHERE s.user_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(subscription_view(row.author_id, recipes_limit, pool).await?);
    }

    Ok(PageContext::from_rows(views, total_count, limit, offset))
}

/// Renders one subscription edge from the author's side. The caller holds the
/// edge, so `is_subscribed` is true by construction.
async fn subscription_view(
    author_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    let author = get_user_by_id(pool, author_id).await?;
    let author = match author {
        Some(author) => author,
        None => {
            return Err(ApiError::NotFound(String::from(
                "No user exists with specified id",
            )))
        }
    };

    let recipes: Vec<BriefRecipe> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let recipes_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(SubscriptionView {
        id: author.id,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes,
        recipes_count: recipes_count.0,
    })
}
