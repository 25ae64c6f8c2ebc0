#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod database;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use std::str::FromStr;

use api::{
    api_add_feedback, api_add_review, api_add_to_probation, api_add_trusted_reviewer,
    api_add_user_role, api_approve_reviewer_request, api_create_answer, api_create_question,
    api_delete_answer, api_delete_question, api_delete_review, api_delete_user, api_get_all_users,
    api_get_answers, api_get_answers_by_author, api_get_feedback, api_get_probation_list,
    api_get_question, api_get_questions, api_get_questions_by_author, api_get_review,
    api_get_review_chain, api_get_review_updates, api_get_reviewer_requests,
    api_get_reviews_by_reviewer, api_get_reviews_for_answer, api_get_trusted_reviewers,
    api_get_user, api_login, api_mark_solution, api_mark_update_viewed, api_register_user,
    api_remove_from_probation, api_remove_trusted_reviewer, api_remove_user_role,
    api_request_reviewer, api_resolve_question, api_revise_review, api_revoke_reviewer_role,
    api_update_answer, api_update_question, api_update_reviewer_weight, api_update_user_email,
    api_update_user_password, api_withdraw_reviewer_request, health, not_found_api,
};
use database::create_schema;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use telemetry::{TelemetryFairing, init_telemetry, shutdown_telemetry};
use tracing::{error, info};

#[launch]
async fn rocket() -> _ {
    if let Err(e) = env::load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    init_telemetry();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:discussion.db".to_string());

    let options = SqliteConnectOptions::from_str(&database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Applying database schema...");
    if let Err(e) = create_schema(&pool).await {
        error!("Failed to apply database schema: {}", e);
        panic!("Database schema setup failed: {}", e);
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting discussion board");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_register_user,
                api_login,
                api_get_all_users,
                api_get_user,
                api_update_user_email,
                api_update_user_password,
                api_add_user_role,
                api_remove_user_role,
                api_delete_user,
                api_get_questions_by_author,
                api_get_answers_by_author,
                api_create_question,
                api_get_questions,
                api_get_question,
                api_update_question,
                api_resolve_question,
                api_delete_question,
                api_create_answer,
                api_get_answers,
                api_update_answer,
                api_mark_solution,
                api_delete_answer,
                api_add_review,
                api_revise_review,
                api_get_review,
                api_get_review_chain,
                api_get_reviews_for_answer,
                api_get_reviews_by_reviewer,
                api_delete_review,
                api_add_trusted_reviewer,
                api_remove_trusted_reviewer,
                api_update_reviewer_weight,
                api_get_trusted_reviewers,
                api_get_review_updates,
                api_mark_update_viewed,
                api_add_feedback,
                api_get_feedback,
                api_request_reviewer,
                api_withdraw_reviewer_request,
                api_get_reviewer_requests,
                api_approve_reviewer_request,
                api_add_to_probation,
                api_remove_from_probation,
                api_get_probation_list,
                api_revoke_reviewer_role,
                health,
            ],
        )
        .register("/api", catchers![not_found_api])
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async {
                shutdown_telemetry();
            })
        }))
}
