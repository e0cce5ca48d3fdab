use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    authentication::jwt::SessionData,
    authentication::permissions::ActionType,
    database::error::QueryError,
    database::pagination::PageContext,
    database::schema::{
        BriefRecipe, Recipe, RecipeIngredient, RecipeRead, RecipeRowPartial, Uuid,
    },
    error::ApiError,
};

use super::{get_ingredient, get_profile, get_tag, is_favorite, is_in_cart, list_recipe_tags};

/// Listing filters. The per-user filters are populated only for
/// authenticated requesters.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilters {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
}

pub async fn fetch_recipes(
    filters: RecipeFilters,
    offset: i64,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Recipe>, ApiError> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filters.author {
        query.push(" AND r.author_id = ");
        query.push_bind(author);
    }
    if !filters.tags.is_empty() {
        query.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
             INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY(",
        );
        query.push_bind(filters.tags);
        query.push("))");
    }
    if let Some(user_id) = filters.favorited_by {
        query.push(" AND r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ");
        query.push_bind(user_id);
        query.push(")");
    }
    if let Some(user_id) = filters.in_cart_of {
        query.push(" AND r.id IN (SELECT recipe_id FROM shopping_carts WHERE user_id = ");
        query.push_bind(user_id);
        query.push(")");
    }

    query.push(" ORDER BY r.pub_date DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows: Vec<RecipeRowPartial> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let rows: Vec<Recipe> = rows.into_iter().map(Recipe::from).collect();

    Ok(PageContext::from_rows(rows, total_count, limit, offset))
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_brief_recipe(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<BriefRecipe>, ApiError> {
    let row: Option<BriefRecipe> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Fetches a recipe for mutation. Plain users may only touch their own
/// recipes; admins may touch any.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Forbidden(String::from(
                        "You are not the author of this recipe",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}

/// Verifies every referenced tag and ingredient id before a write. Unknown
/// ingredients are a 404, unknown tags a 400.
async fn check_associations(
    tags: &[Uuid],
    ingredients: &[(Uuid, i32)],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    for tag_id in tags {
        if get_tag(*tag_id, pool).await?.is_none() {
            return Err(ApiError::Validation(format!(
                "Tag {tag_id} doesn't exist"
            )));
        }
    }
    for (ingredient_id, _) in ingredients {
        if get_ingredient(*ingredient_id, pool).await?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Ingredient {ingredient_id} doesn't exist"
            )));
        }
    }
    Ok(())
}

async fn insert_associations(
    tr: &mut sqlx::Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tags: &[Uuid],
    ingredients: &[(Uuid, i32)],
) -> Result<(), ApiError> {
    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(ingredients.iter(), |mut b, (ingredient_id, amount)| {
        b.push_bind(recipe_id)
            .push_bind(ingredient_id)
            .push_bind(amount);
    });
    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Creates the recipe row, its tag set and its ingredient associations in one
/// transaction.
pub async fn create_recipe(
    author_id: Uuid,
    name: &str,
    image: &str,
    text: &str,
    cooking_time: i32,
    tags: &[Uuid],
    ingredients: &[(Uuid, i32)],
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    check_associations(tags, ingredients, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(name)
    .bind(image)
    .bind(text)
    .bind(cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_associations(&mut tr, recipe.0, tags, ingredients).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(recipe.0)
}

/// Replaces the full tag and ingredient sets, then the scalar fields, in one
/// transaction. Stale associations never survive an update.
pub async fn update_recipe(
    recipe_id: Uuid,
    name: &str,
    image: &str,
    text: &str,
    cooking_time: i32,
    tags: &[Uuid],
    ingredients: &[(Uuid, i32)],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    check_associations(tags, ingredients, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_associations(&mut tr, recipe_id, tags, ingredients).await?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(name)
    .bind(image)
    .bind(text)
    .bind(cooking_time)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

/// Deletes a recipe together with its associations, favorites and cart rows.
/// ATTENTION: DOES NOT CHECK FOR OWNERSHIP BY ITSELF
pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    for query in [
        "DELETE FROM recipe_tags WHERE recipe_id = $1",
        "DELETE FROM recipe_ingredients WHERE recipe_id = $1",
        "DELETE FROM favorites WHERE recipe_id = $1",
        "DELETE FROM shopping_carts WHERE recipe_id = $1",
        "DELETE FROM recipes WHERE id = $1",
    ] {
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id DESC
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Assembles the read-oriented representation: full tag objects, author
/// profile and per-viewer flags.
pub async fn get_recipe_read(
    recipe: Recipe,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRead, ApiError> {
    let author = get_profile(pool, recipe.author_id, viewer)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No user exists with specified id")))?;

    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            is_favorite(recipe.id, viewer, pool).await?,
            is_in_cart(recipe.id, viewer, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeRead {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}
