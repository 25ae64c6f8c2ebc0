use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbFeedback, Feedback};

/// Append-only; there is no edit or delete path and no dedup.
#[instrument(skip(pool, content))]
pub async fn add_feedback(
    pool: &Pool<Sqlite>,
    student_id: i64,
    reviewer_id: i64,
    answer_id: i64,
    review_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    info!("Adding feedback");
    let mut tx = pool.begin().await?;

    let answer_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM answers WHERE id = ?")
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await?;
    if answer_exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Answer with id {} not found in database",
            answer_id
        )));
    }

    let review_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM reviews WHERE id = ?")
        .bind(review_id)
        .fetch_optional(&mut *tx)
        .await?;
    if review_exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Review with id {} not found in database",
            review_id
        )));
    }

    let res = sqlx::query(
        "INSERT INTO review_feedback (student_id, reviewer_id, answer_id, review_id, content)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(reviewer_id)
    .bind(answer_id)
    .bind(review_id)
    .bind(content)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_feedback_for_reviewer(
    pool: &Pool<Sqlite>,
    reviewer_id: i64,
) -> Result<Vec<Feedback>, AppError> {
    info!("Fetching feedback for reviewer");
    let rows = sqlx::query_as::<_, DbFeedback>(
        "SELECT f.id, f.student_id, u.username AS student_username, f.reviewer_id,
                f.answer_id, a.content AS answer_content, f.review_id, f.content, f.created_at
         FROM review_feedback f
         JOIN users u ON u.id = f.student_id
         JOIN answers a ON a.id = f.answer_id
         WHERE f.reviewer_id = ?
         ORDER BY f.created_at DESC, f.id DESC",
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Feedback::from).collect())
}
