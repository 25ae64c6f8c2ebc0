use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbQuestion, Question};

const QUESTION_COLUMNS: &str = "q.id, q.content, q.author_id, u.username AS author_username, \
                                q.created_at, q.resolved";

async fn load_tags(pool: &Pool<Sqlite>, question_id: i64) -> Result<Vec<String>, AppError> {
    let tags = sqlx::query_scalar::<_, String>(
        "SELECT tag FROM question_tags WHERE question_id = ? ORDER BY rowid",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

async fn with_tags(pool: &Pool<Sqlite>, rows: Vec<DbQuestion>) -> Result<Vec<Question>, AppError> {
    let mut questions = Vec::with_capacity(rows.len());
    for row in rows {
        let mut question = Question::from(row);
        question.tags = load_tags(pool, question.id).await?;
        questions.push(question);
    }
    Ok(questions)
}

#[instrument(skip(pool, content))]
pub async fn create_question(
    pool: &Pool<Sqlite>,
    content: &str,
    author_id: i64,
    tags: &[String],
) -> Result<i64, AppError> {
    info!("Creating question");
    let mut tx = pool.begin().await?;

    let res = sqlx::query("INSERT INTO questions (content, author_id) VALUES (?, ?)")
        .bind(content)
        .bind(author_id)
        .execute(&mut *tx)
        .await?;
    let question_id = res.last_insert_rowid();

    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        sqlx::query(
            "INSERT INTO question_tags (question_id, tag) VALUES (?, ?)
             ON CONFLICT (question_id, tag) DO NOTHING",
        )
        .bind(question_id)
        .bind(tag)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(question_id)
}

#[instrument(skip(pool))]
pub async fn get_question(pool: &Pool<Sqlite>, question_id: i64) -> Result<Question, AppError> {
    info!("Fetching question by ID");
    let row = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         JOIN users u ON u.id = q.author_id
         WHERE q.id = ?"
    ))
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let mut question = Question::from(row);
            question.tags = load_tags(pool, question.id).await?;
            Ok(question)
        }
        _ => Err(AppError::NotFound(format!(
            "Question with id {} not found in database",
            question_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_questions_by_author(
    pool: &Pool<Sqlite>,
    author_id: i64,
) -> Result<Vec<Question>, AppError> {
    info!("Fetching questions by author");
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         JOIN users u ON u.id = q.author_id
         WHERE q.author_id = ?
         ORDER BY q.created_at DESC, q.id DESC"
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    with_tags(pool, rows).await
}

/// Exact match against the tag table; no substring matching.
#[instrument(skip(pool))]
pub async fn get_questions_with_tag(
    pool: &Pool<Sqlite>,
    tag: &str,
) -> Result<Vec<Question>, AppError> {
    info!("Fetching questions by tag");
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         JOIN users u ON u.id = q.author_id
         JOIN question_tags t ON t.question_id = q.id
         WHERE t.tag = ?
         ORDER BY q.created_at DESC, q.id DESC"
    ))
    .bind(tag.trim())
    .fetch_all(pool)
    .await?;

    with_tags(pool, rows).await
}

#[instrument(skip(pool))]
pub async fn get_questions_newest_first(pool: &Pool<Sqlite>) -> Result<Vec<Question>, AppError> {
    info!("Fetching questions sorted by date");
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         JOIN users u ON u.id = q.author_id
         ORDER BY q.created_at DESC, q.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    with_tags(pool, rows).await
}

#[instrument(skip(pool))]
pub async fn get_questions_unresolved_first(
    pool: &Pool<Sqlite>,
) -> Result<Vec<Question>, AppError> {
    info!("Fetching questions sorted by resolution status");
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions q
         JOIN users u ON u.id = q.author_id
         ORDER BY q.resolved ASC, q.created_at DESC, q.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    with_tags(pool, rows).await
}

#[instrument(skip(pool, new_content))]
pub async fn update_question(
    pool: &Pool<Sqlite>,
    question_id: i64,
    new_content: &str,
) -> Result<(), AppError> {
    info!("Updating question content");
    let res = sqlx::query("UPDATE questions SET content = ? WHERE id = ?")
        .bind(new_content)
        .bind(question_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Question with id {} not found in database",
            question_id
        )));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn mark_question_resolved(
    pool: &Pool<Sqlite>,
    question_id: i64,
) -> Result<(), AppError> {
    info!("Marking question resolved");
    let res = sqlx::query("UPDATE questions SET resolved = TRUE WHERE id = ?")
        .bind(question_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Question with id {} not found in database",
            question_id
        )));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_question(pool: &Pool<Sqlite>, question_id: i64) -> Result<(), AppError> {
    info!("Deleting question");
    let res = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(question_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Question with id {} not found in database",
            question_id
        )));
    }
    Ok(())
}
