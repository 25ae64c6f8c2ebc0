use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::db::users::load_user_roles;
use crate::error::AppError;

#[instrument(skip(pool))]
pub async fn request_reviewer_role(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Recording reviewer role request");
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviewer_requests WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    if count > 0 {
        return Err(AppError::Conflict(format!(
            "User {} has already requested the reviewer role",
            user_id
        )));
    }

    sqlx::query("INSERT INTO reviewer_requests (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn withdraw_reviewer_request(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Withdrawing reviewer role request");
    let res = sqlx::query("DELETE FROM reviewer_requests WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "No reviewer role request for user {}",
            user_id
        )));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn has_requested_reviewer_role(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<bool, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviewer_requests WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[instrument(skip(pool))]
pub async fn get_reviewer_role_requests(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Fetching reviewer role requests");
    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.username, u.email FROM users u
         JOIN reviewer_requests rr ON rr.user_id = u.id
         ORDER BY rr.requested_at, rr.rowid",
    )
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
pub async fn add_to_probation(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Adding reviewer to probation list");
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM probation_reviewers WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    if count > 0 {
        return Err(AppError::Conflict(format!(
            "User {} is already on the probation list",
            user_id
        )));
    }

    sqlx::query("INSERT INTO probation_reviewers (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn remove_from_probation(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Removing reviewer from probation list");
    let res = sqlx::query("DELETE FROM probation_reviewers WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User {} is not on the probation list",
            user_id
        )));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn is_on_probation(pool: &Pool<Sqlite>, user_id: i64) -> Result<bool, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM probation_reviewers WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[instrument(skip(pool))]
pub async fn get_probation_list(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Fetching probation list");
    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.username, u.email FROM users u
         JOIN probation_reviewers p ON p.user_id = u.id
         ORDER BY p.added_at, p.rowid",
    )
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

/// Strips the reviewer role and clears any probation entry in one
/// transaction. Existing reviews stay.
#[instrument(skip(pool))]
pub async fn revoke_reviewer_role(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Revoking reviewer role");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
        .bind(user_id)
        .bind(Role::Reviewer.as_str())
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM probation_reviewers WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
