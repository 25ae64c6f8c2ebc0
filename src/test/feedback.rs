#[cfg(test)]
mod tests {
    use crate::db::{add_feedback, add_review, get_feedback_for_reviewer};
    use crate::error::AppError;
    use crate::test::utils::test_db::TestDbBuilder;

    #[rocket::async_test]
    async fn test_add_and_get_feedback() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");
        let answer_id = test_db.answer_id("Alice's answer");

        let review_id = add_review(&test_db.pool, "Needs a citation", bob_id, answer_id, None)
            .await
            .expect("Failed to add review");

        add_feedback(
            &test_db.pool,
            alice_id,
            bob_id,
            answer_id,
            review_id,
            "Added one, thanks",
        )
        .await
        .expect("Failed to add feedback");

        let feedback = get_feedback_for_reviewer(&test_db.pool, bob_id)
            .await
            .expect("Failed to list feedback");

        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].content, "Added one, thanks");
        assert_eq!(feedback[0].student_username, "alice");
        assert_eq!(feedback[0].answer_content, "Alice's answer");
        assert_eq!(feedback[0].review_id, review_id);
    }

    #[rocket::async_test]
    async fn test_feedback_is_append_only() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");
        let answer_id = test_db.answer_id("Alice's answer");

        let review_id = add_review(&test_db.pool, "Needs a citation", bob_id, answer_id, None)
            .await
            .expect("Failed to add review");

        for content in ["First note", "Second note"] {
            add_feedback(&test_db.pool, alice_id, bob_id, answer_id, review_id, content)
                .await
                .expect("Failed to add feedback");
        }

        let feedback = get_feedback_for_reviewer(&test_db.pool, bob_id)
            .await
            .expect("Failed to list feedback");
        assert_eq!(feedback.len(), 2);
    }

    #[rocket::async_test]
    async fn test_feedback_requires_existing_answer_and_review() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");
        let answer_id = test_db.answer_id("Alice's answer");

        let missing_answer =
            add_feedback(&test_db.pool, alice_id, bob_id, 9999, 1, "No such answer").await;
        assert!(matches!(missing_answer, Err(AppError::NotFound(_))));

        let missing_review =
            add_feedback(&test_db.pool, alice_id, bob_id, answer_id, 9999, "No such review").await;
        assert!(matches!(missing_review, Err(AppError::NotFound(_))));

        let feedback = get_feedback_for_reviewer(&test_db.pool, bob_id)
            .await
            .expect("Failed to list feedback");
        assert!(feedback.is_empty());
    }
}
