use sqlx::{Pool, Postgres};

use crate::{
    constants::SHOPPING_LIST_HEADER,
    database::error::QueryError,
    database::schema::{ShoppingListRow, Uuid},
    error::ApiError,
};

pub async fn is_in_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM shopping_carts WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn add_to_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query(
        "INSERT INTO shopping_carts (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Validation(String::from(
            "Recipe is already in the shopping cart",
        )));
    }

    Ok(())
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in the shopping cart",
        )));
    }

    Ok(())
}

/// Collects every ingredient of every recipe in the user's cart, summed per
/// (name, measurement unit) pair and ordered alphabetically.
pub async fn fetch_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, ApiError> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        INNER JOIN shopping_carts c ON c.recipe_id = ri.recipe_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Renders the aggregated rows as the plain-text attachment body: one header
/// line, then one `name (unit) - amount` line per ingredient.
pub fn format_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut lines = vec![SHOPPING_LIST_HEADER.to_owned()];
    lines.extend(
        rows.iter()
            .map(|row| format!("{} ({}) - {}", row.name, row.measurement_unit, row.amount)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            amount,
        }
    }

    #[test]
    fn formats_header_and_lines() {
        let rows = vec![row("eggs", "pcs", 5), row("milk", "ml", 1)];
        assert_eq!(
            format_shopping_list(&rows),
            format!("{SHOPPING_LIST_HEADER}\neggs (pcs) - 5\nmilk (ml) - 1")
        );
    }

    #[test]
    fn empty_cart_renders_only_the_header() {
        assert_eq!(format_shopping_list(&[]), SHOPPING_LIST_HEADER);
    }
}
