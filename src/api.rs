use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Role, User};
use crate::db::{
    add_feedback, add_review, add_to_probation, add_trusted_reviewer, add_user_role,
    authenticate_user, create_answer, create_question, create_user, delete_answer, delete_question,
    delete_review, delete_user, get_all_users, get_answers_for_question, get_answers_trusted_first,
    get_feedback_for_reviewer, get_probation_list, get_question, get_questions_newest_first,
    get_questions_unresolved_first, get_questions_with_tag, get_review, get_review_chain,
    get_answers_by_author, get_questions_by_author, get_reviewer_role_requests,
    get_reviews_by_reviewer, get_reviews_for_answer, get_trusted_reviewers_for_student,
    get_unviewed_review_updates, get_user, has_requested_reviewer_role, mark_answer_as_solution,
    mark_question_resolved, mark_review_update_as_viewed, remove_from_probation,
    remove_trusted_reviewer, remove_user_role, request_reviewer_role, revise_review,
    revoke_reviewer_role, update_answer, update_question, update_reviewer_weight,
    update_user_email, update_user_password, withdraw_reviewer_request,
};
use crate::error::AppError;
use crate::models::{Answer, Feedback, Question, Review, ReviewUpdate, TrustedReviewer};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

type ValidationResult<T> = Result<T, Custom<Json<ValidationResponse>>>;

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

// ---------- users ----------

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    roles: Vec<String>,
}

#[post("/users", data = "<req>")]
pub async fn api_register_user(
    req: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;

    let mut roles = Vec::with_capacity(validated.roles.len());
    for role in &validated.roles {
        let role = Role::from_str(role)
            .map_err(|e| AppError::Validation(e.to_string()))
            .validate_custom()?;
        roles.push(role);
    }

    let id = create_user(
        db,
        &validated.username,
        &validated.password,
        &validated.email,
        &roles,
    )
    .await
    .validate_custom()?;

    Ok(Json(CreatedResponse { id }))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

#[post("/login", data = "<req>")]
pub async fn api_login(
    req: Json<LoginRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = req.into_inner();
    let success = authenticate_user(db, &req.username, &req.password).await?;
    Ok(Json(LoginResponse { success }))
}

#[get("/users")]
pub async fn api_get_all_users(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(get_all_users(db).await?))
}

#[get("/users/<id>")]
pub async fn api_get_user(id: i64, db: &State<Pool<Sqlite>>) -> Result<Json<User>, AppError> {
    Ok(Json(get_user(db, id).await?))
}

#[derive(Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email address"))]
    email: String,
}

#[put("/users/<id>/email", data = "<req>")]
pub async fn api_update_user_email(
    id: i64,
    req: Json<EmailRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    let validated = req.validate_custom()?;
    update_user_email(db, id, &validated.email)
        .await
        .validate_custom()?;
    Ok(Status::NoContent)
}

#[derive(Deserialize, Validate)]
pub struct PasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

#[put("/users/<id>/password", data = "<req>")]
pub async fn api_update_user_password(
    id: i64,
    req: Json<PasswordRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    let validated = req.validate_custom()?;
    update_user_password(db, id, &validated.password)
        .await
        .validate_custom()?;
    Ok(Status::NoContent)
}

#[derive(Deserialize)]
pub struct RoleRequest {
    role: String,
}

#[post("/users/<id>/roles", data = "<req>")]
pub async fn api_add_user_role(
    id: i64,
    req: Json<RoleRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    let role = Role::from_str(&req.role).map_err(|e| AppError::Validation(e.to_string()))?;
    add_user_role(db, id, role).await?;
    Ok(Status::NoContent)
}

#[delete("/users/<id>/roles/<role>")]
pub async fn api_remove_user_role(
    id: i64,
    role: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    let role = Role::from_str(role).map_err(|e| AppError::Validation(e.to_string()))?;
    remove_user_role(db, id, role).await?;
    Ok(Status::NoContent)
}

#[delete("/users/<id>")]
pub async fn api_delete_user(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_user(db, id).await?;
    Ok(Status::NoContent)
}

#[get("/users/<id>/questions")]
pub async fn api_get_questions_by_author(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Question>>, AppError> {
    Ok(Json(get_questions_by_author(db, id).await?))
}

#[get("/users/<id>/answers")]
pub async fn api_get_answers_by_author(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Answer>>, AppError> {
    Ok(Json(get_answers_by_author(db, id).await?))
}

// ---------- questions ----------

#[derive(Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
    author_id: i64,
    #[serde(default)]
    tags: Vec<String>,
}

#[post("/questions", data = "<req>")]
pub async fn api_create_question(
    req: Json<QuestionRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;
    let id = create_question(db, &validated.content, validated.author_id, &validated.tags)
        .await
        .validate_custom()?;
    Ok(Json(CreatedResponse { id }))
}

#[get("/questions?<tag>&<sort>")]
pub async fn api_get_questions(
    tag: Option<String>,
    sort: Option<String>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = match tag {
        Some(tag) => get_questions_with_tag(db, &tag).await?,
        None => match sort.as_deref() {
            Some("status") => get_questions_unresolved_first(db).await?,
            _ => get_questions_newest_first(db).await?,
        },
    };
    Ok(Json(questions))
}

#[get("/questions/<id>")]
pub async fn api_get_question(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Question>, AppError> {
    Ok(Json(get_question(db, id).await?))
}

#[derive(Deserialize, Validate)]
pub struct ContentRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
}

#[put("/questions/<id>", data = "<req>")]
pub async fn api_update_question(
    id: i64,
    req: Json<ContentRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    let validated = req.validate_custom()?;
    update_question(db, id, &validated.content)
        .await
        .validate_custom()?;
    Ok(Status::NoContent)
}

#[post("/questions/<id>/resolve")]
pub async fn api_resolve_question(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    mark_question_resolved(db, id).await?;
    Ok(Status::NoContent)
}

#[delete("/questions/<id>")]
pub async fn api_delete_question(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_question(db, id).await?;
    Ok(Status::NoContent)
}

// ---------- answers ----------

#[derive(Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
    question_id: i64,
    author_id: i64,
}

#[post("/answers", data = "<req>")]
pub async fn api_create_answer(
    req: Json<AnswerRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;
    let id = create_answer(db, &validated.content, validated.question_id, validated.author_id)
        .await
        .validate_custom()?;
    Ok(Json(CreatedResponse { id }))
}

/// With `viewer` set, answers from that student's trusted reviewers come
/// first; without it, plain newest-first display order.
#[get("/questions/<id>/answers?<viewer>")]
pub async fn api_get_answers(
    id: i64,
    viewer: Option<i64>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Answer>>, AppError> {
    let answers = match viewer {
        Some(student_id) => get_answers_trusted_first(db, id, student_id).await?,
        None => get_answers_for_question(db, id).await?,
    };
    Ok(Json(answers))
}

#[put("/answers/<id>", data = "<req>")]
pub async fn api_update_answer(
    id: i64,
    req: Json<ContentRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Status> {
    let validated = req.validate_custom()?;
    update_answer(db, id, &validated.content)
        .await
        .validate_custom()?;
    Ok(Status::NoContent)
}

#[post("/answers/<id>/solution")]
pub async fn api_mark_solution(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    mark_answer_as_solution(db, id).await?;
    Ok(Status::NoContent)
}

#[delete("/answers/<id>")]
pub async fn api_delete_answer(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_answer(db, id).await?;
    Ok(Status::NoContent)
}

// ---------- reviews ----------

#[derive(Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
    reviewer_id: i64,
    answer_id: i64,
    original_review_id: Option<i64>,
}

#[post("/reviews", data = "<req>")]
pub async fn api_add_review(
    req: Json<ReviewRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;
    let id = add_review(
        db,
        &validated.content,
        validated.reviewer_id,
        validated.answer_id,
        validated.original_review_id,
    )
    .await
    .validate_custom()?;
    Ok(Json(CreatedResponse { id }))
}

#[derive(Deserialize, Validate)]
pub struct ReviseRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
    reviewer_id: i64,
}

#[post("/reviews/<id>/revise", data = "<req>")]
pub async fn api_revise_review(
    id: i64,
    req: Json<ReviseRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;
    let new_id = revise_review(db, id, validated.reviewer_id, &validated.content)
        .await
        .validate_custom()?;
    Ok(Json(CreatedResponse { id: new_id }))
}

#[get("/reviews/<id>")]
pub async fn api_get_review(id: i64, db: &State<Pool<Sqlite>>) -> Result<Json<Review>, AppError> {
    Ok(Json(get_review(db, id).await?))
}

#[get("/reviews/<id>/chain")]
pub async fn api_get_review_chain(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(get_review_chain(db, id).await?))
}

#[get("/answers/<id>/reviews")]
pub async fn api_get_reviews_for_answer(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(get_reviews_for_answer(db, id).await?))
}

#[get("/reviewers/<id>/reviews")]
pub async fn api_get_reviews_by_reviewer(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(get_reviews_by_reviewer(db, id).await?))
}

#[delete("/reviews/<id>")]
pub async fn api_delete_review(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_review(db, id).await?;
    Ok(Status::NoContent)
}

// ---------- trusted reviewers ----------

#[derive(Deserialize)]
pub struct TrustRequest {
    reviewer_id: i64,
    #[serde(default = "default_weight")]
    weight: i64,
}

fn default_weight() -> i64 {
    1
}

#[post("/students/<id>/trusted-reviewers", data = "<req>")]
pub async fn api_add_trusted_reviewer(
    id: i64,
    req: Json<TrustRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    add_trusted_reviewer(db, id, req.reviewer_id, req.weight).await?;
    Ok(Status::Created)
}

#[delete("/students/<id>/trusted-reviewers/<reviewer_id>")]
pub async fn api_remove_trusted_reviewer(
    id: i64,
    reviewer_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    remove_trusted_reviewer(db, id, reviewer_id).await?;
    Ok(Status::NoContent)
}

#[derive(Deserialize)]
pub struct WeightRequest {
    weight: i64,
}

#[put("/students/<id>/trusted-reviewers/<reviewer_id>", data = "<req>")]
pub async fn api_update_reviewer_weight(
    id: i64,
    reviewer_id: i64,
    req: Json<WeightRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    update_reviewer_weight(db, id, reviewer_id, req.weight).await?;
    Ok(Status::NoContent)
}

#[get("/students/<id>/trusted-reviewers")]
pub async fn api_get_trusted_reviewers(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TrustedReviewer>>, AppError> {
    Ok(Json(get_trusted_reviewers_for_student(db, id).await?))
}

// ---------- review updates ----------

#[get("/students/<id>/review-updates")]
pub async fn api_get_review_updates(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<ReviewUpdate>>, AppError> {
    Ok(Json(get_unviewed_review_updates(db, id).await?))
}

#[post("/review-updates/<id>/viewed")]
pub async fn api_mark_update_viewed(id: i64, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    mark_review_update_as_viewed(db, id).await?;
    Ok(Status::NoContent)
}

// ---------- feedback ----------

#[derive(Deserialize, Validate)]
pub struct FeedbackRequest {
    student_id: i64,
    reviewer_id: i64,
    answer_id: i64,
    review_id: i64,
    #[validate(length(min = 1, max = 10000, message = "Content must not be empty"))]
    content: String,
}

#[post("/feedback", data = "<req>")]
pub async fn api_add_feedback(
    req: Json<FeedbackRequest>,
    db: &State<Pool<Sqlite>>,
) -> ValidationResult<Json<CreatedResponse>> {
    let validated = req.validate_custom()?;
    let id = add_feedback(
        db,
        validated.student_id,
        validated.reviewer_id,
        validated.answer_id,
        validated.review_id,
        &validated.content,
    )
    .await
    .validate_custom()?;
    Ok(Json(CreatedResponse { id }))
}

#[get("/reviewers/<id>/feedback")]
pub async fn api_get_feedback(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    Ok(Json(get_feedback_for_reviewer(db, id).await?))
}

// ---------- reviewer requests & probation ----------

#[derive(Deserialize)]
pub struct UserIdRequest {
    user_id: i64,
}

#[post("/reviewer-requests", data = "<req>")]
pub async fn api_request_reviewer(
    req: Json<UserIdRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    request_reviewer_role(db, req.user_id).await?;
    Ok(Status::Created)
}

#[delete("/reviewer-requests/<user_id>")]
pub async fn api_withdraw_reviewer_request(
    user_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    withdraw_reviewer_request(db, user_id).await?;
    Ok(Status::NoContent)
}

#[get("/reviewer-requests")]
pub async fn api_get_reviewer_requests(
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(get_reviewer_role_requests(db).await?))
}

#[post("/probation", data = "<req>")]
pub async fn api_add_to_probation(
    req: Json<UserIdRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    add_to_probation(db, req.user_id).await?;
    Ok(Status::Created)
}

#[delete("/probation/<user_id>")]
pub async fn api_remove_from_probation(
    user_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    remove_from_probation(db, user_id).await?;
    Ok(Status::NoContent)
}

#[get("/probation")]
pub async fn api_get_probation_list(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(get_probation_list(db).await?))
}

/// Approves a pending request: grants the reviewer role and clears the
/// request row.
#[post("/reviewer-requests/<user_id>/approve")]
pub async fn api_approve_reviewer_request(
    user_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    if !has_requested_reviewer_role(db, user_id).await? {
        return Err(AppError::NotFound(format!(
            "No reviewer role request for user {}",
            user_id
        )));
    }
    add_user_role(db, user_id, Role::Reviewer).await?;
    withdraw_reviewer_request(db, user_id).await?;
    Ok(Status::NoContent)
}

#[delete("/users/<id>/reviewer-role")]
pub async fn api_revoke_reviewer_role(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    revoke_reviewer_role(db, id).await?;
    Ok(Status::NoContent)
}

// ---------- misc ----------

#[get("/health")]
pub fn health() -> &'static str {
    "ok"
}

#[catch(404)]
pub fn not_found_api(req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Not Found",
        "path": req.uri().to_string(),
    });

    Custom(Status::NotFound, Json(error_json))
}
