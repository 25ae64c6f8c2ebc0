#[cfg(test)]
mod tests {
    use crate::db::{add_review, get_unviewed_review_updates, mark_review_update_as_viewed};
    use crate::test::utils::test_db::TestDbBuilder;

    #[rocket::async_test]
    async fn test_each_review_lands_one_update() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let bob_id = test_db.user_id("bob");
        let answer_id = test_db.answer_id("Alice's answer");

        let first = add_review(&test_db.pool, "First review", bob_id, answer_id, None)
            .await
            .expect("Failed to add review");
        let second = add_review(&test_db.pool, "Second review", bob_id, answer_id, None)
            .await
            .expect("Failed to add review");

        let updates = get_unviewed_review_updates(&test_db.pool, test_db.user_id("alice"))
            .await
            .expect("Failed to list updates");

        assert_eq!(updates.len(), 2);
        let mut review_ids: Vec<i64> = updates.iter().map(|u| u.review_id).collect();
        review_ids.sort();
        assert_eq!(review_ids, vec![first, second]);
        assert!(updates.iter().all(|u| !u.viewed));
    }

    #[rocket::async_test]
    async fn test_update_carries_review_content_and_reviewer() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        add_review(
            &test_db.pool,
            "Nice work",
            test_db.user_id("bob"),
            test_db.answer_id("Alice's answer"),
            None,
        )
        .await
        .expect("Failed to add review");

        let updates = get_unviewed_review_updates(&test_db.pool, test_db.user_id("alice"))
            .await
            .expect("Failed to list updates");

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].review_content, "Nice work");
        assert_eq!(updates[0].reviewer_username, "bob");
        assert_eq!(updates[0].student_id, test_db.user_id("alice"));
    }

    #[rocket::async_test]
    async fn test_mark_viewed_is_permanent_and_idempotent() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");

        add_review(
            &test_db.pool,
            "Nice work",
            test_db.user_id("bob"),
            test_db.answer_id("Alice's answer"),
            None,
        )
        .await
        .expect("Failed to add review");

        let updates = get_unviewed_review_updates(&test_db.pool, alice_id)
            .await
            .expect("Failed to list updates");
        let update_id = updates[0].id;

        mark_review_update_as_viewed(&test_db.pool, update_id)
            .await
            .expect("Failed to mark viewed");

        let remaining = get_unviewed_review_updates(&test_db.pool, alice_id)
            .await
            .expect("Failed to list updates");
        assert!(remaining.is_empty());

        // Repeating the call does not resurrect the notification.
        mark_review_update_as_viewed(&test_db.pool, update_id)
            .await
            .expect("Failed to re-mark viewed");
        let still_empty = get_unviewed_review_updates(&test_db.pool, alice_id)
            .await
            .expect("Failed to list updates");
        assert!(still_empty.is_empty());
    }

    #[rocket::async_test]
    async fn test_updates_are_scoped_to_answer_author() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .student("dave")
            .reviewer("bob")
            .question("alice", "The question", &[])
            .answer("alice", "The question", "Alice's answer")
            .answer("dave", "The question", "Dave's answer")
            .build()
            .await
            .expect("Failed to build test database");

        let bob_id = test_db.user_id("bob");

        add_review(&test_db.pool, "For alice", bob_id, test_db.answer_id("Alice's answer"), None)
            .await
            .expect("Failed to add review");
        add_review(&test_db.pool, "For dave", bob_id, test_db.answer_id("Dave's answer"), None)
            .await
            .expect("Failed to add review");

        let alice_updates = get_unviewed_review_updates(&test_db.pool, test_db.user_id("alice"))
            .await
            .expect("Failed to list updates");
        assert_eq!(alice_updates.len(), 1);
        assert_eq!(alice_updates[0].review_content, "For alice");

        let dave_updates = get_unviewed_review_updates(&test_db.pool, test_db.user_id("dave"))
            .await
            .expect("Failed to list updates");
        assert_eq!(dave_updates.len(), 1);
        assert_eq!(dave_updates[0].review_content, "For dave");
    }
}
