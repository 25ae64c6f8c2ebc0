use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

// Timestamps are stored by SQLite as naive UTC text.
fn utc_from(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

#[derive(Serialize, Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbQuestion {
    pub id: Option<i64>,
    pub content: Option<String>,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub resolved: Option<bool>,
}

impl From<DbQuestion> for Question {
    fn from(db: DbQuestion) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            content: db.content.unwrap_or_default(),
            author_id: db.author_id.unwrap_or_default(),
            author_username: db.author_username.unwrap_or_default(),
            // Loaded from the tag table after the row itself.
            tags: Vec::new(),
            created_at: utc_from(db.created_at),
            resolved: db.resolved.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Answer {
    pub id: i64,
    pub content: String,
    pub question_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub is_solution: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAnswer {
    pub id: Option<i64>,
    pub content: Option<String>,
    pub question_id: Option<i64>,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub is_solution: Option<bool>,
}

impl From<DbAnswer> for Answer {
    fn from(db: DbAnswer) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            content: db.content.unwrap_or_default(),
            question_id: db.question_id.unwrap_or_default(),
            author_id: db.author_id.unwrap_or_default(),
            author_username: db.author_username.unwrap_or_default(),
            created_at: utc_from(db.created_at),
            is_solution: db.is_solution.unwrap_or_default(),
        }
    }
}

/// A review of an answer. `original_review_id` links a revision to the
/// review it supersedes; the chain is walked with
/// [`crate::db::get_review_chain`].
#[derive(Serialize, Debug, Clone)]
pub struct Review {
    pub id: i64,
    pub content: String,
    pub reviewer_id: i64,
    pub reviewer_username: String,
    pub answer_id: i64,
    pub original_review_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbReview {
    pub id: Option<i64>,
    pub content: Option<String>,
    pub reviewer_id: Option<i64>,
    pub reviewer_username: Option<String>,
    pub answer_id: Option<i64>,
    pub original_review_id: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbReview> for Review {
    fn from(db: DbReview) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            content: db.content.unwrap_or_default(),
            reviewer_id: db.reviewer_id.unwrap_or_default(),
            reviewer_username: db.reviewer_username.unwrap_or_default(),
            answer_id: db.answer_id.unwrap_or_default(),
            original_review_id: db.original_review_id,
            created_at: utc_from(db.created_at),
        }
    }
}

/// One notification row per inserted review, addressed to the answer's
/// author. Review content and reviewer name are joined in for display.
#[derive(Serialize, Debug, Clone)]
pub struct ReviewUpdate {
    pub id: i64,
    pub review_id: i64,
    pub review_content: String,
    pub reviewer_username: String,
    pub student_id: i64,
    pub created_at: DateTime<Utc>,
    pub viewed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbReviewUpdate {
    pub id: Option<i64>,
    pub review_id: Option<i64>,
    pub review_content: Option<String>,
    pub reviewer_username: Option<String>,
    pub student_id: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub viewed: Option<bool>,
}

impl From<DbReviewUpdate> for ReviewUpdate {
    fn from(db: DbReviewUpdate) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            review_id: db.review_id.unwrap_or_default(),
            review_content: db.review_content.unwrap_or_default(),
            reviewer_username: db.reviewer_username.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            created_at: utc_from(db.created_at),
            viewed: db.viewed.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct TrustedReviewer {
    pub reviewer_id: i64,
    pub reviewer_username: String,
    pub weight: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTrustedReviewer {
    pub reviewer_id: Option<i64>,
    pub reviewer_username: Option<String>,
    pub weight: Option<i64>,
}

impl From<DbTrustedReviewer> for TrustedReviewer {
    fn from(db: DbTrustedReviewer) -> Self {
        Self {
            reviewer_id: db.reviewer_id.unwrap_or_default(),
            reviewer_username: db.reviewer_username.unwrap_or_default(),
            weight: db.weight.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Feedback {
    pub id: i64,
    pub student_id: i64,
    pub student_username: String,
    pub reviewer_id: i64,
    pub answer_id: i64,
    pub answer_content: String,
    pub review_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbFeedback {
    pub id: Option<i64>,
    pub student_id: Option<i64>,
    pub student_username: Option<String>,
    pub reviewer_id: Option<i64>,
    pub answer_id: Option<i64>,
    pub answer_content: Option<String>,
    pub review_id: Option<i64>,
    pub content: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbFeedback> for Feedback {
    fn from(db: DbFeedback) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            student_username: db.student_username.unwrap_or_default(),
            reviewer_id: db.reviewer_id.unwrap_or_default(),
            answer_id: db.answer_id.unwrap_or_default(),
            answer_content: db.answer_content.unwrap_or_default(),
            review_id: db.review_id.unwrap_or_default(),
            content: db.content.unwrap_or_default(),
            created_at: utc_from(db.created_at),
        }
    }
}
