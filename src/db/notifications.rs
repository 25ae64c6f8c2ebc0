use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbReviewUpdate, ReviewUpdate};

#[instrument(skip(pool))]
pub async fn get_unviewed_review_updates(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<Vec<ReviewUpdate>, AppError> {
    info!("Fetching unviewed review updates");
    let rows = sqlx::query_as::<_, DbReviewUpdate>(
        "SELECT ru.id, ru.review_id, r.content AS review_content,
                u.username AS reviewer_username, ru.student_id, ru.created_at, ru.viewed
         FROM review_updates ru
         JOIN reviews r ON r.id = ru.review_id
         JOIN users u ON u.id = ru.reviewer_id
         WHERE ru.student_id = ? AND ru.viewed = FALSE
         ORDER BY ru.created_at DESC, ru.id DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ReviewUpdate::from).collect())
}

/// Unviewed -> Viewed is the only transition and it is terminal, so
/// repeating the call is a no-op.
#[instrument(skip(pool))]
pub async fn mark_review_update_as_viewed(
    pool: &Pool<Sqlite>,
    update_id: i64,
) -> Result<(), AppError> {
    info!("Marking review update as viewed");
    sqlx::query("UPDATE review_updates SET viewed = TRUE WHERE id = ?")
        .bind(update_id)
        .execute(pool)
        .await?;

    Ok(())
}
