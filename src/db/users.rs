use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

pub(crate) async fn load_user_roles(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<Role>, AppError> {
    // rowid order preserves the order roles were granted in.
    let names = sqlx::query_scalar::<_, String>(
        "SELECT role FROM user_roles WHERE user_id = ? ORDER BY rowid",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut roles = Vec::with_capacity(names.len());
    for name in names {
        roles.push(Role::from_str(name.trim()).map_err(|e| AppError::Internal(e.to_string()))?);
    }
    Ok(roles)
}

#[instrument(skip_all, fields(username))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    email: &str,
    roles: &[Role],
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Username '{}' already exists",
            username
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let mut tx = pool.begin().await?;

    let res = sqlx::query("INSERT INTO users (username, password, email) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed_password)
        .bind(email)
        .execute(&mut *tx)
        .await?;
    let user_id = res.last_insert_rowid();

    for role in roles {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES (?, ?)
             ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(user_id)
}

#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    info!("Authenticating user");
    let stored = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match stored {
        Some(hash) => match bcrypt::verify(password, &hash) {
            Ok(valid) => Ok(valid),
            Err(_) => Ok(false),
        },
        _ => Ok(false),
    }
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username, email FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => {
            let roles = load_user_roles(pool, id).await?;
            Ok(User::from_db(user, roles))
        }
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_user_by_username(pool: &Pool<Sqlite>, username: &str) -> Result<User, AppError> {
    info!("Fetching user by username");
    let row =
        sqlx::query_as::<_, DbUser>("SELECT id, username, email FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match row {
        Some(user) => {
            let id = user.id.unwrap_or_default();
            let roles = load_user_roles(pool, id).await?;
            Ok(User::from_db(user, roles))
        }
        _ => Err(AppError::NotFound(format!(
            "User with username {} not found in database",
            username
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_all_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Fetching all users");
    let rows =
        sqlx::query_as::<_, DbUser>("SELECT id, username, email FROM users ORDER BY username")
            .fetch_all(pool)
            .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id.unwrap_or_default();
        let roles = load_user_roles(pool, id).await?;
        users.push(User::from_db(row, roles));
    }
    Ok(users)
}

#[instrument(skip(pool))]
pub async fn get_users_with_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<User>, AppError> {
    info!(role = %role, "Fetching users by role");
    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.username, u.email FROM users u
         JOIN user_roles r ON r.user_id = u.id
         WHERE r.role = ?
         ORDER BY u.username",
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id.unwrap_or_default();
        let roles = load_user_roles(pool, id).await?;
        users.push(User::from_db(row, roles));
    }
    Ok(users)
}

#[instrument(skip(pool))]
pub async fn update_user_email(
    pool: &Pool<Sqlite>,
    user_id: i64,
    email: &str,
) -> Result<(), AppError> {
    info!("Updating user email");
    let res = sqlx::query("UPDATE users SET email = ? WHERE id = ?")
        .bind(email)
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )));
    }
    Ok(())
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn add_user_role(pool: &Pool<Sqlite>, user_id: i64, role: Role) -> Result<(), AppError> {
    info!(role = %role, "Adding role to user");
    sqlx::query(
        "INSERT INTO user_roles (user_id, role) VALUES (?, ?)
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn remove_user_role(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<(), AppError> {
    info!(role = %role, "Removing role from user");
    sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user");
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )));
    }
    Ok(())
}
