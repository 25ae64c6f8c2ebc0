use std::collections::HashSet;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbTrustedReviewer, TrustedReviewer};

#[instrument(skip(pool))]
pub async fn add_trusted_reviewer(
    pool: &Pool<Sqlite>,
    student_id: i64,
    reviewer_id: i64,
    weight: i64,
) -> Result<(), AppError> {
    info!("Adding trusted reviewer");
    let mut tx = pool.begin().await?;

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM trusted_reviewers WHERE student_id = ? AND reviewer_id = ?",
    )
    .bind(student_id)
    .bind(reviewer_id)
    .fetch_one(&mut *tx)
    .await?;

    if count > 0 {
        return Err(AppError::Conflict(format!(
            "Reviewer {} is already trusted by student {}",
            reviewer_id, student_id
        )));
    }

    sqlx::query("INSERT INTO trusted_reviewers (student_id, reviewer_id, weight) VALUES (?, ?, ?)")
        .bind(student_id)
        .bind(reviewer_id)
        .bind(weight)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn remove_trusted_reviewer(
    pool: &Pool<Sqlite>,
    student_id: i64,
    reviewer_id: i64,
) -> Result<(), AppError> {
    info!("Removing trusted reviewer");
    let res = sqlx::query("DELETE FROM trusted_reviewers WHERE student_id = ? AND reviewer_id = ?")
        .bind(student_id)
        .bind(reviewer_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "No trusted reviewer relationship between student {} and reviewer {}",
            student_id, reviewer_id
        )));
    }
    Ok(())
}

/// Unconditional overwrite; no bounds on the weight and no error when the
/// edge does not exist.
#[instrument(skip(pool))]
pub async fn update_reviewer_weight(
    pool: &Pool<Sqlite>,
    student_id: i64,
    reviewer_id: i64,
    new_weight: i64,
) -> Result<(), AppError> {
    info!("Updating reviewer weight");
    sqlx::query("UPDATE trusted_reviewers SET weight = ? WHERE student_id = ? AND reviewer_id = ?")
        .bind(new_weight)
        .bind(student_id)
        .bind(reviewer_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_trusted_reviewers_for_student(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<Vec<TrustedReviewer>, AppError> {
    info!("Fetching trusted reviewers for student");
    let rows = sqlx::query_as::<_, DbTrustedReviewer>(
        "SELECT t.reviewer_id, u.username AS reviewer_username, t.weight
         FROM trusted_reviewers t
         JOIN users u ON u.id = t.reviewer_id
         WHERE t.student_id = ?
         ORDER BY u.username",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrustedReviewer::from).collect())
}

pub(crate) async fn trusted_reviewer_ids(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<HashSet<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT reviewer_id FROM trusted_reviewers WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().collect())
}

#[instrument(skip(pool))]
pub async fn is_trusted_reviewer(
    pool: &Pool<Sqlite>,
    student_id: i64,
    reviewer_id: i64,
) -> Result<bool, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM trusted_reviewers WHERE student_id = ? AND reviewer_id = ?",
    )
    .bind(student_id)
    .bind(reviewer_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
