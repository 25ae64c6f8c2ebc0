use std::collections::HashSet;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::trust::trusted_reviewer_ids;
use crate::error::AppError;
use crate::models::{Answer, DbAnswer};

const ANSWER_COLUMNS: &str = "a.id, a.content, a.question_id, a.author_id, \
                              u.username AS author_username, a.created_at, a.is_solution";

#[instrument(skip(pool, content))]
pub async fn create_answer(
    pool: &Pool<Sqlite>,
    content: &str,
    question_id: i64,
    author_id: i64,
) -> Result<i64, AppError> {
    info!("Creating answer");
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = ?")
        .bind(question_id)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Question with id {} not found in database",
            question_id
        )));
    }

    let res = sqlx::query("INSERT INTO answers (content, question_id, author_id) VALUES (?, ?, ?)")
        .bind(content)
        .bind(question_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_answer(pool: &Pool<Sqlite>, answer_id: i64) -> Result<Answer, AppError> {
    info!("Fetching answer by ID");
    let row = sqlx::query_as::<_, DbAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers a
         JOIN users u ON u.id = a.author_id
         WHERE a.id = ?"
    ))
    .bind(answer_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Answer::from(row)),
        _ => Err(AppError::NotFound(format!(
            "Answer with id {} not found in database",
            answer_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_answers_for_question(
    pool: &Pool<Sqlite>,
    question_id: i64,
) -> Result<Vec<Answer>, AppError> {
    info!("Fetching answers for question");
    let rows = sqlx::query_as::<_, DbAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers a
         JOIN users u ON u.id = a.author_id
         WHERE a.question_id = ?
         ORDER BY a.created_at DESC, a.id DESC"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Answer::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_answers_by_author(
    pool: &Pool<Sqlite>,
    author_id: i64,
) -> Result<Vec<Answer>, AppError> {
    info!("Fetching answers by author");
    let rows = sqlx::query_as::<_, DbAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM answers a
         JOIN users u ON u.id = a.author_id
         WHERE a.author_id = ?
         ORDER BY a.created_at DESC, a.id DESC"
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Answer::from).collect())
}

/// Answers for a question as the given student sees them: answers written
/// by their trusted reviewers first. Order within each group is the normal
/// display order; the trust weight is never consulted.
#[instrument(skip(pool))]
pub async fn get_answers_trusted_first(
    pool: &Pool<Sqlite>,
    question_id: i64,
    student_id: i64,
) -> Result<Vec<Answer>, AppError> {
    info!("Fetching answers partitioned by trusted reviewers");
    let answers = get_answers_for_question(pool, question_id).await?;
    let trusted = trusted_reviewer_ids(pool, student_id).await?;
    Ok(partition_trusted_first(answers, &trusted))
}

/// Stable partition: trusted authors first, relative order preserved
/// within each group.
pub fn partition_trusted_first(answers: Vec<Answer>, trusted: &HashSet<i64>) -> Vec<Answer> {
    let (mut first, rest): (Vec<Answer>, Vec<Answer>) = answers
        .into_iter()
        .partition(|a| trusted.contains(&a.author_id));
    first.extend(rest);
    first
}

#[instrument(skip(pool, new_content))]
pub async fn update_answer(
    pool: &Pool<Sqlite>,
    answer_id: i64,
    new_content: &str,
) -> Result<(), AppError> {
    info!("Updating answer content");
    let res = sqlx::query("UPDATE answers SET content = ? WHERE id = ?")
        .bind(new_content)
        .bind(answer_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Answer with id {} not found in database",
            answer_id
        )));
    }
    Ok(())
}

/// Marks an answer as the accepted solution. At most one answer per
/// question carries the flag; siblings are cleared in the same transaction.
#[instrument(skip(pool))]
pub async fn mark_answer_as_solution(pool: &Pool<Sqlite>, answer_id: i64) -> Result<(), AppError> {
    info!("Marking answer as solution");
    let mut tx = pool.begin().await?;

    let question_id =
        sqlx::query_scalar::<_, i64>("SELECT question_id FROM answers WHERE id = ?")
            .bind(answer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Answer with id {} not found in database",
                    answer_id
                ))
            })?;

    sqlx::query("UPDATE answers SET is_solution = FALSE WHERE question_id = ? AND id != ?")
        .bind(question_id)
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE answers SET is_solution = TRUE WHERE id = ?")
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_answer(pool: &Pool<Sqlite>, answer_id: i64) -> Result<(), AppError> {
    info!("Deleting answer");
    let res = sqlx::query("DELETE FROM answers WHERE id = ?")
        .bind(answer_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Answer with id {} not found in database",
            answer_id
        )));
    }
    Ok(())
}
