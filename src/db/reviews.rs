use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{DbReview, Review};

/// Revision chains are walked one parent per hop; anything deeper than
/// this is truncated with a warning.
pub const MAX_REVIEW_CHAIN_DEPTH: usize = 64;

const REVIEW_COLUMNS: &str = "r.id, r.content, r.reviewer_id, u.username AS reviewer_username, \
                              r.answer_id, r.original_review_id, r.created_at";

/// Inserts a review and, in the same transaction, exactly one unviewed
/// review update addressed to the answer's author.
#[instrument(skip(pool, content))]
pub async fn add_review(
    pool: &Pool<Sqlite>,
    content: &str,
    reviewer_id: i64,
    answer_id: i64,
    original_review_id: Option<i64>,
) -> Result<i64, AppError> {
    info!("Adding review");
    let mut tx = pool.begin().await?;

    let student_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM answers WHERE id = ?")
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Answer with id {} not found in database",
                answer_id
            ))
        })?;

    let res = sqlx::query(
        "INSERT INTO reviews (content, reviewer_id, answer_id, original_review_id)
         VALUES (?, ?, ?, ?)",
    )
    .bind(content)
    .bind(reviewer_id)
    .bind(answer_id)
    .bind(original_review_id)
    .execute(&mut *tx)
    .await?;
    let review_id = res.last_insert_rowid();

    sqlx::query("INSERT INTO review_updates (review_id, reviewer_id, student_id) VALUES (?, ?, ?)")
        .bind(review_id)
        .bind(reviewer_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(review_id)
}

/// Revising never mutates the existing row: it inserts a fresh review for
/// the same answer with its parent link set, so the superseded text stays
/// in the chain and the answer's author gets a new update.
#[instrument(skip(pool, content))]
pub async fn revise_review(
    pool: &Pool<Sqlite>,
    review_id: i64,
    reviewer_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    info!("Revising review");
    let answer_id = sqlx::query_scalar::<_, i64>("SELECT answer_id FROM reviews WHERE id = ?")
        .bind(review_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Review with id {} not found in database",
                review_id
            ))
        })?;

    add_review(pool, content, reviewer_id, answer_id, Some(review_id)).await
}

async fn fetch_review(pool: &Pool<Sqlite>, review_id: i64) -> Result<Option<Review>, AppError> {
    let row = sqlx::query_as::<_, DbReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews r
         JOIN users u ON u.id = r.reviewer_id
         WHERE r.id = ?"
    ))
    .bind(review_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Review::from))
}

#[instrument(skip(pool))]
pub async fn get_review(pool: &Pool<Sqlite>, review_id: i64) -> Result<Review, AppError> {
    info!("Fetching review by ID");
    match fetch_review(pool, review_id).await? {
        Some(review) => Ok(review),
        _ => Err(AppError::NotFound(format!(
            "Review with id {} not found in database",
            review_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_reviews_for_answer(
    pool: &Pool<Sqlite>,
    answer_id: i64,
) -> Result<Vec<Review>, AppError> {
    info!("Fetching reviews for answer");
    let rows = sqlx::query_as::<_, DbReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews r
         JOIN users u ON u.id = r.reviewer_id
         WHERE r.answer_id = ?
         ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(answer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Review::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_reviews_by_reviewer(
    pool: &Pool<Sqlite>,
    reviewer_id: i64,
) -> Result<Vec<Review>, AppError> {
    info!("Fetching reviews by reviewer");
    let rows = sqlx::query_as::<_, DbReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews r
         JOIN users u ON u.id = r.reviewer_id
         WHERE r.reviewer_id = ?
         ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Review::from).collect())
}

/// The revision chain from the given review back to its root, newest
/// first. Resolved iteratively, one query per hop.
#[instrument(skip(pool))]
pub async fn get_review_chain(
    pool: &Pool<Sqlite>,
    review_id: i64,
) -> Result<Vec<Review>, AppError> {
    info!("Walking review chain");
    let mut chain: Vec<Review> = Vec::new();
    let mut next = Some(review_id);

    while let Some(id) = next {
        if chain.len() >= MAX_REVIEW_CHAIN_DEPTH {
            warn!(review_id, depth = chain.len(), "Review chain truncated at depth cap");
            break;
        }
        let review = match fetch_review(pool, id).await? {
            Some(review) => review,
            // A severed parent link (deleted ancestor) ends the chain.
            _ if !chain.is_empty() => break,
            _ => {
                return Err(AppError::NotFound(format!(
                    "Review with id {} not found in database",
                    review_id
                )));
            }
        };
        next = review.original_review_id;
        chain.push(review);
    }

    Ok(chain)
}

/// Hard delete. Review updates and feedback rows cascade away; revisions
/// pointing at this review keep existing with their parent link nulled.
#[instrument(skip(pool))]
pub async fn delete_review(pool: &Pool<Sqlite>, review_id: i64) -> Result<(), AppError> {
    info!("Deleting review");
    let res = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Review with id {} not found in database",
            review_id
        )));
    }
    Ok(())
}
