use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{Reply, Response},
};

use crate::{
    api::forms::{
        parse_recipe_query, IngredientForm, IngredientQuery, LoginForm, PageQuery, RecipeForm,
        RegisterForm, SetPasswordForm, TagForm,
    },
    authentication::jwt::SessionData,
    authentication::permissions::ActionType,
    constants::{
        RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_FILE_NAME, SUBSCRIPTION_COUNT_PER_PAGE,
        USER_COUNT_PER_PAGE,
    },
    database::actions,
    database::actions::RecipeFilters,
    database::pagination::PageContext,
    database::schema::Uuid,
    error::ApiError,
};

fn json_with(status: StatusCode, value: &impl serde::Serialize) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn reject(error: ApiError) -> Rejection {
    error.reject()
}

// Users & auth

pub async fn register(form: RegisterForm, pool: Pool<Postgres>) -> Result<Response, Rejection> {
    form.validate().map_err(reject)?;

    let profile = actions::register_user(
        &pool,
        &form.email,
        &form.username,
        &form.first_name,
        &form.last_name,
        &form.password,
    )
    .await
    .map_err(reject)?;

    log::info!("registered user {}", profile.username);
    Ok(json_with(StatusCode::CREATED, &profile))
}

pub async fn login(form: LoginForm, pool: Pool<Postgres>) -> Result<Response, Rejection> {
    let token = actions::login_user(&pool, &form.email, &form.password)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &json!({ "auth_token": token })))
}

/// Tokens are stateless, so logout only confirms the session was valid.
pub async fn logout(_session: SessionData) -> Result<Response, Rejection> {
    Ok(no_content())
}

pub async fn me(session: SessionData, pool: Pool<Postgres>) -> Result<Response, Rejection> {
    let profile = actions::get_profile(&pool, session.user_id, Some(session.user_id))
        .await
        .map_err(reject)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No user exists with specified id")).reject()
        })?;

    Ok(json_with(StatusCode::OK, &profile))
}

pub async fn set_password(
    session: SessionData,
    form: SetPasswordForm,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    form.validate().map_err(reject)?;

    actions::set_password(
        &pool,
        session.user_id,
        &form.current_password,
        &form.new_password,
    )
    .await
    .map_err(reject)?;

    Ok(no_content())
}

pub async fn list_users(
    session: SessionData,
    query: PageQuery,
    limit_cap: i64,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let (offset, limit) = query.bounds(USER_COUNT_PER_PAGE, limit_cap);

    let page = actions::fetch_users(&pool, Some(session.user_id), offset, limit)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &page))
}

pub async fn get_user(
    user_id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let profile = actions::get_profile(&pool, user_id, viewer)
        .await
        .map_err(reject)?;

    match profile {
        Some(profile) => Ok(json_with(StatusCode::OK, &profile)),
        None => Err(ApiError::NotFound(String::from("No user exists with specified id")).reject()),
    }
}

// Subscriptions

pub async fn subscribe(
    author_id: Uuid,
    session: SessionData,
    query: PageQuery,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(reject)?;

    let view = actions::subscribe(session.user_id, author_id, query.recipes_limit(), &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::CREATED, &view))
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(reject)?;

    actions::unsubscribe(session.user_id, author_id, &pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

pub async fn subscriptions(
    session: SessionData,
    query: PageQuery,
    limit_cap: i64,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let (offset, limit) = query.bounds(SUBSCRIPTION_COUNT_PER_PAGE, limit_cap);

    let page = actions::fetch_subscriptions(
        session.user_id,
        query.recipes_limit(),
        offset,
        limit,
        &pool,
    )
    .await
    .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &page))
}

// Tags

pub async fn list_tags(pool: Pool<Postgres>) -> Result<Response, Rejection> {
    let tags = actions::list_tags(&pool).await.map_err(reject)?;
    Ok(json_with(StatusCode::OK, &tags))
}

pub async fn get_tag(tag_id: Uuid, pool: Pool<Postgres>) -> Result<Response, Rejection> {
    match actions::get_tag(tag_id, &pool).await.map_err(reject)? {
        Some(tag) => Ok(json_with(StatusCode::OK, &tag)),
        None => Err(ApiError::NotFound(String::from("No tag exists with specified id")).reject()),
    }
}

pub async fn create_tag(
    session: SessionData,
    form: TagForm,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageTags)
        .map_err(reject)?;
    form.validate().map_err(reject)?;

    let tag = actions::create_tag(&form.name, &form.color(), &form.slug, &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::CREATED, &tag))
}

// Ingredients

pub async fn list_ingredients(
    query: IngredientQuery,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let ingredients = actions::list_ingredients(query.name.as_deref(), &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &ingredients))
}

pub async fn get_ingredient(
    ingredient_id: Uuid,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    match actions::get_ingredient(ingredient_id, &pool)
        .await
        .map_err(reject)?
    {
        Some(ingredient) => Ok(json_with(StatusCode::OK, &ingredient)),
        None => Err(
            ApiError::NotFound(String::from("No ingredient exists with specified id")).reject(),
        ),
    }
}

pub async fn create_ingredient(
    session: SessionData,
    form: IngredientForm,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(reject)?;
    form.validate().map_err(reject)?;

    let ingredient = actions::create_ingredient(&form.name, &form.measurement_unit, &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::CREATED, &ingredient))
}

// Recipes

pub async fn list_recipes(
    raw_query: String,
    session: Option<SessionData>,
    limit_cap: i64,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let query = parse_recipe_query(&raw_query);
    let viewer = session.map(|s| s.user_id);

    let filters = RecipeFilters {
        author: query.author,
        tags: query.tags,
        favorited_by: if query.is_favorited { viewer } else { None },
        in_cart_of: if query.is_in_shopping_cart {
            viewer
        } else {
            None
        },
    };
    let limit = query
        .limit
        .unwrap_or(RECIPE_COUNT_PER_PAGE)
        .clamp(1, limit_cap);

    let page = actions::fetch_recipes(filters, query.offset, limit, &pool)
        .await
        .map_err(reject)?;

    let mut reads = Vec::with_capacity(page.rows.len());
    for recipe in page.rows {
        reads.push(
            actions::get_recipe_read(recipe, viewer, &pool)
                .await
                .map_err(reject)?,
        );
    }

    let page = PageContext {
        rows: reads,
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
        page_list: page.page_list,
        message: page.message,
    };

    Ok(json_with(StatusCode::OK, &page))
}

pub async fn get_recipe(
    recipe_id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe(recipe_id, &pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).reject()
        })?;

    let viewer = session.map(|s| s.user_id);
    let read = actions::get_recipe_read(recipe, viewer, &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &read))
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::CreateRecipes)
        .map_err(reject)?;
    form.validate().map_err(reject)?;

    let recipe_id = actions::create_recipe(
        session.user_id,
        &form.name,
        &form.image,
        &form.text,
        form.cooking_time,
        &form.tags,
        &form.ingredient_pairs(),
        &pool,
    )
    .await
    .map_err(reject)?;

    let recipe = actions::get_recipe(recipe_id, &pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).reject()
        })?;
    let read = actions::get_recipe_read(recipe, Some(session.user_id), &pool)
        .await
        .map_err(reject)?;

    log::info!("user {} created recipe {recipe_id}", session.user_id);
    Ok(json_with(StatusCode::CREATED, &read))
}

pub async fn update_recipe(
    recipe_id: Uuid,
    session: SessionData,
    form: RecipeForm,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_mut(recipe_id, &session, &pool)
        .await
        .map_err(reject)?;
    form.validate().map_err(reject)?;

    actions::update_recipe(
        recipe.id,
        &form.name,
        &form.image,
        &form.text,
        form.cooking_time,
        &form.tags,
        &form.ingredient_pairs(),
        &pool,
    )
    .await
    .map_err(reject)?;

    let recipe = actions::get_recipe(recipe_id, &pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).reject()
        })?;
    let read = actions::get_recipe_read(recipe, Some(session.user_id), &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::OK, &read))
}

pub async fn delete_recipe(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_mut(recipe_id, &session, &pool)
        .await
        .map_err(reject)?;

    actions::delete_recipe(recipe.id, &pool)
        .await
        .map_err(reject)?;

    log::info!("user {} deleted recipe {recipe_id}", session.user_id);
    Ok(no_content())
}

// Favorites & shopping cart

async fn brief_or_not_found(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<crate::database::schema::BriefRecipe, Rejection> {
    actions::get_brief_recipe(recipe_id, pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).reject()
        })
}

pub async fn favorite(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnFavorites)
        .map_err(reject)?;

    let brief = brief_or_not_found(recipe_id, &pool).await?;
    actions::add_to_favorites(recipe_id, session.user_id, &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::CREATED, &brief))
}

pub async fn unfavorite(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnFavorites)
        .map_err(reject)?;

    brief_or_not_found(recipe_id, &pool).await?;
    actions::remove_from_favorites(recipe_id, session.user_id, &pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

pub async fn cart_add(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnCart)
        .map_err(reject)?;

    let brief = brief_or_not_found(recipe_id, &pool).await?;
    actions::add_to_cart(recipe_id, session.user_id, &pool)
        .await
        .map_err(reject)?;

    Ok(json_with(StatusCode::CREATED, &brief))
}

pub async fn cart_remove(
    recipe_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    session
        .authenticate(ActionType::ManageOwnCart)
        .map_err(reject)?;

    brief_or_not_found(recipe_id, &pool).await?;
    actions::remove_from_cart(recipe_id, session.user_id, &pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

pub async fn download_shopping_cart(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<Response, Rejection> {
    let rows = actions::fetch_shopping_list(session.user_id, &pool)
        .await
        .map_err(reject)?;
    let body = actions::format_shopping_list(&rows);

    let reply = warp::reply::with_header(body, "content-type", "text/plain; charset=utf-8");
    let reply = warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILE_NAME}\""),
    );

    Ok(reply.into_response())
}
