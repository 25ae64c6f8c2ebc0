#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::database::create_schema;
    use crate::db::{create_answer, create_question, create_user};
    use crate::error::AppError;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        questions: Vec<TestQuestion>,
        answers: Vec<TestAnswer>,
    }

    pub struct TestUser {
        pub username: String,
        pub roles: Vec<Role>,
        pub password: String,
    }

    pub struct TestQuestion {
        pub author_username: String,
        pub content: String,
        pub tags: Vec<String>,
    }

    pub struct TestAnswer {
        pub author_username: String,
        pub question_content: String,
        pub content: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                roles: vec![Role::Student],
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn reviewer(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                roles: vec![Role::Reviewer],
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn instructor(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                roles: vec![Role::Instructor],
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn user(mut self, username: &str, roles: &[Role]) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                roles: roles.to_vec(),
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn question(mut self, author_username: &str, content: &str, tags: &[&str]) -> Self {
            self.questions.push(TestQuestion {
                author_username: author_username.to_string(),
                content: content.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            });
            self
        }

        pub fn answer(mut self, author_username: &str, question_content: &str, content: &str) -> Self {
            self.answers.push(TestAnswer {
                author_username: author_username.to_string(),
                question_content: question_content.to_string(),
                content: content.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            // A single connection keeps every query on the same in-memory
            // database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            create_schema(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut question_id_map: HashMap<String, i64> = HashMap::new();
            let mut answer_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let email = format!("{}@example.com", user.username);
                let user_id =
                    create_user(&pool, &user.username, &user.password, &email, &user.roles).await?;
                user_id_map.insert(user.username.clone(), user_id);
            }

            for question in &self.questions {
                let author_id = user_id_map
                    .get(&question.author_username)
                    .copied()
                    .ok_or_else(|| sqlx::Error::RowNotFound)?;

                let question_id =
                    create_question(&pool, &question.content, author_id, &question.tags).await?;
                question_id_map.insert(question.content.clone(), question_id);
            }

            for answer in &self.answers {
                let author_id = user_id_map
                    .get(&answer.author_username)
                    .copied()
                    .ok_or_else(|| sqlx::Error::RowNotFound)?;
                let question_id = question_id_map
                    .get(&answer.question_content)
                    .copied()
                    .ok_or_else(|| sqlx::Error::RowNotFound)?;

                let answer_id = create_answer(&pool, &answer.content, question_id, author_id).await?;
                answer_id_map.insert(answer.content.clone(), answer_id);
            }

            Ok(TestDb {
                pool,
                user_id_map,
                question_id_map,
                answer_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub question_id_map: HashMap<String, i64>,
        pub answer_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> i64 {
            self.user_id_map[username]
        }

        pub fn question_id(&self, content: &str) -> i64 {
            self.question_id_map[content]
        }

        pub fn answer_id(&self, content: &str) -> i64 {
            self.answer_id_map[content]
        }

        pub async fn unviewed_update_count(&self, student_id: i64) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM review_updates WHERE student_id = ? AND viewed = FALSE",
            )
            .bind(student_id)
            .fetch_one(&self.pool)
            .await
        }
    }
}
