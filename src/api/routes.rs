use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{filters::BoxedFilter, reject::Rejection, reply::Response, Filter};

use crate::{
    api::forms::{IngredientQuery, PageQuery},
    api::handlers,
    authentication::middleware::{with_possible_session, with_session},
};

fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

fn with_limit_cap(cap: i64) -> impl Filter<Extract = (i64,), Error = Infallible> + Copy {
    warp::any().map(move || cap)
}

/// `warp::query::raw` rejects requests without a query string, but every
/// list endpoint must accept a bare URL.
fn raw_query() -> impl Filter<Extract = (String,), Error = Rejection> + Copy {
    warp::query::raw().or_else(|_| async { Ok::<(String,), Rejection>((String::new(),)) })
}

/// The full route tree. Literal segments (`me`, `subscriptions`,
/// `download_shopping_cart`, ...) are matched before `{id}` routes.
pub fn routes(pool: Pool<Postgres>, page_size_limit: i64) -> BoxedFilter<(Response,)> {
    // Users & auth
    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::register)
        .boxed();

    let list_users = warp::path!("api" / "users")
        .and(warp::get())
        .and(with_session())
        .and(warp::query::<PageQuery>())
        .and(with_limit_cap(page_size_limit))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_users)
        .boxed();

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::me)
        .boxed();

    let set_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::set_password)
        .boxed();

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(with_session())
        .and(warp::query::<PageQuery>())
        .and(with_limit_cap(page_size_limit))
        .and(with_pool(pool.clone()))
        .and_then(handlers::subscriptions)
        .boxed();

    let get_user = warp::path!("api" / "users" / i32)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_user)
        .boxed();

    let subscribe = warp::path!("api" / "users" / i32 / "subscribe")
        .and(warp::post())
        .and(with_session())
        .and(warp::query::<PageQuery>())
        .and(with_pool(pool.clone()))
        .and_then(handlers::subscribe)
        .boxed();

    let unsubscribe = warp::path!("api" / "users" / i32 / "subscribe")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::unsubscribe)
        .boxed();

    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::login)
        .boxed();

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session())
        .and_then(handlers::logout)
        .boxed();

    // Tags
    let list_tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_tags)
        .boxed();

    let get_tag = warp::path!("api" / "tags" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_tag)
        .boxed();

    let create_tag = warp::path!("api" / "tags")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::create_tag)
        .boxed();

    // Ingredients
    let list_ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_ingredients)
        .boxed();

    let get_ingredient = warp::path!("api" / "ingredients" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_ingredient)
        .boxed();

    let create_ingredient = warp::path!("api" / "ingredients")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::create_ingredient)
        .boxed();

    // Recipes
    let list_recipes = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(raw_query())
        .and(with_possible_session())
        .and(with_limit_cap(page_size_limit))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_recipes)
        .boxed();

    let download_shopping_cart = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::download_shopping_cart)
        .boxed();

    let get_recipe = warp::path!("api" / "recipes" / i32)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_recipe)
        .boxed();

    let create_recipe = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::create_recipe)
        .boxed();

    let update_recipe = warp::path!("api" / "recipes" / i32)
        .and(warp::patch())
        .and(with_session())
        .and(warp::body::json())
        .and(with_pool(pool.clone()))
        .and_then(handlers::update_recipe)
        .boxed();

    let delete_recipe = warp::path!("api" / "recipes" / i32)
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::delete_recipe)
        .boxed();

    // Favorites & shopping cart
    let favorite = warp::path!("api" / "recipes" / i32 / "favorite")
        .and(warp::post())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::favorite)
        .boxed();

    let unfavorite = warp::path!("api" / "recipes" / i32 / "favorite")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::unfavorite)
        .boxed();

    let cart_add = warp::path!("api" / "recipes" / i32 / "shopping_cart")
        .and(warp::post())
        .and(with_session())
        .and(with_pool(pool.clone()))
        .and_then(handlers::cart_add)
        .boxed();

    let cart_remove = warp::path!("api" / "recipes" / i32 / "shopping_cart")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool(pool))
        .and_then(handlers::cart_remove)
        .boxed();

    register
        .or(me)
        .unify()
        .or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .or(get_user)
        .unify()
        .or(list_users)
        .unify()
        .or(login)
        .unify()
        .or(logout)
        .unify()
        .or(create_tag)
        .unify()
        .or(get_tag)
        .unify()
        .or(list_tags)
        .unify()
        .or(create_ingredient)
        .unify()
        .or(get_ingredient)
        .unify()
        .or(list_ingredients)
        .unify()
        .or(download_shopping_cart)
        .unify()
        .or(favorite)
        .unify()
        .or(unfavorite)
        .unify()
        .or(cart_add)
        .unify()
        .or(cart_remove)
        .unify()
        .or(create_recipe)
        .unify()
        .or(get_recipe)
        .unify()
        .or(update_recipe)
        .unify()
        .or(delete_recipe)
        .unify()
        .or(list_recipes)
        .unify()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::handle_rejection;

    // connect_lazy never opens a connection, so these tests only exercise
    // routing and the auth filters.
    fn test_routes() -> BoxedFilter<(Response,)> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/unused")
            .unwrap();
        routes(pool, 100)
    }

    #[tokio::test]
    async fn missing_token_yields_401() {
        let filter = test_routes().recover(handle_rejection);
        let res = warp::test::request()
            .method("GET")
            .path("/api/users/me")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn garbage_token_yields_401() {
        let filter = test_routes().recover(handle_rejection);
        let res = warp::test::request()
            .method("GET")
            .path("/api/users/me")
            .header("authorization", "Token not-a-jwt")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn user_list_requires_session() {
        let filter = test_routes().recover(handle_rejection);
        let res = warp::test::request()
            .method("GET")
            .path("/api/users")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn recipe_write_requires_session() {
        let filter = test_routes().recover(handle_rejection);
        let res = warp::test::request()
            .method("POST")
            .path("/api/recipes")
            .json(&serde_json::json!({}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn unknown_route_yields_404() {
        let filter = test_routes().recover(handle_rejection);
        let res = warp::test::request()
            .method("GET")
            .path("/api/nowhere")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 404);
    }
}
