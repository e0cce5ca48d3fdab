use crate::{
    authentication::cryptography::{hash_password, verify_password},
    authentication::jwt::generate_jwt_session,
    database::error::QueryError,
    database::pagination::PageContext,
    database::schema::{User, UserProfile, UserProfileRow, Uuid},
    error::ApiError,
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user account. The password is stored argon2-hashed.
pub async fn register_user(
    pool: &Pool<Postgres>,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<UserProfile, ApiError> {
    let password = hash_password(password)
        .map_err(|_| ApiError::Validation(String::from("Invalid password")))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match row {
        Some((id,)) => Ok(UserProfile {
            email: email.to_owned(),
            id,
            username: username.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            is_subscribed: false,
        }),
        None => Err(ApiError::Validation(String::from(
            "A user with this email or username already exists",
        ))),
    }
}

pub async fn login_user(
    pool: &Pool<Postgres>,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::Validation(String::from("Invalid credentials"))),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_| ApiError::Validation(String::from("Invalid credentials")))?;
    if !authenticated {
        return Err(ApiError::Validation(String::from("Invalid credentials")));
    }

    Ok(generate_jwt_session(&user))
}

pub async fn set_password(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let user = get_user_by_id(pool, user_id).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::NotFound(String::from("No user exists with specified id"))),
    };

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|_| ApiError::Validation(String::from("Invalid current password")))?;
    if !authenticated {
        return Err(ApiError::Validation(String::from(
            "Invalid current password",
        )));
    }

    let new_password = hash_password(new_password)
        .map_err(|_| ApiError::Validation(String::from("Invalid password")))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(new_password)
        .bind(user_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Profile of one user with the `is_subscribed` flag evaluated against the
/// viewer. An anonymous viewer always sees `false`.
pub async fn get_profile(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Option<UserProfile>, ApiError> {
    let row: Option<UserProfile> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS(
                SELECT 1 FROM subscriptions s
                WHERE s.user_id = $2 AND s.author_id = u.id
            ) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(user_id)
    .bind(viewer)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn fetch_users(
    pool: &Pool<Postgres>,
    viewer: Option<Uuid>,
    offset: i64,
    limit: i64,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS(
                SELECT 1 FROM subscriptions s
                WHERE s.user_id = $1 AND s.author_id = u.id
            ) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer)
    .bind(limit)
    .bind(offset)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let rows: Vec<UserProfile> = rows.into_iter().map(UserProfile::from).collect();

    Ok(PageContext::from_rows(rows, total_count, limit, offset))
}
