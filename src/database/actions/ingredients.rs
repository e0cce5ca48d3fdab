use sqlx::{Pool, Postgres};

use crate::{
    database::error::QueryError,
    database::schema::{Ingredient, Uuid},
    error::ApiError,
};

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match row {
        Some(ingredient) => Ok(ingredient),
        None => Err(ApiError::Validation(String::from(
            "An ingredient with this name and measurement unit already exists",
        ))),
    }
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Lists ingredients, optionally restricted to a case-insensitive name prefix.
pub async fn list_ingredients(
    search: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = match search {
        Some(search) => {
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name")
                .bind(format!("{}%", escape_like(search)))
                .fetch_all(&*pool)
                .await
                .map_err(|e| QueryError::from(e).into())?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
            .fetch_all(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?,
    };

    Ok(rows)
}

/// `%` and `_` in user input must match literally, not as LIKE wildcards.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("milk"), "milk");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
