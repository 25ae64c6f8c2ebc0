#[cfg(test)]
mod tests {
    use crate::db::{
        add_trusted_reviewer, get_trusted_reviewers_for_student, is_trusted_reviewer,
        remove_trusted_reviewer, update_reviewer_weight,
    };
    use crate::error::AppError;
    use crate::test::utils::test_db::TestDbBuilder;

    #[rocket::async_test]
    async fn test_add_and_list_trusted_reviewers() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("zed")
            .reviewer("bob")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");

        add_trusted_reviewer(&test_db.pool, alice_id, test_db.user_id("zed"), 2)
            .await
            .expect("Failed to add trusted reviewer");
        add_trusted_reviewer(&test_db.pool, alice_id, test_db.user_id("bob"), 1)
            .await
            .expect("Failed to add trusted reviewer");

        let trusted = get_trusted_reviewers_for_student(&test_db.pool, alice_id)
            .await
            .expect("Failed to list trusted reviewers");

        // Sorted by username for display.
        assert_eq!(trusted.len(), 2);
        assert_eq!(trusted[0].reviewer_username, "bob");
        assert_eq!(trusted[0].weight, 1);
        assert_eq!(trusted[1].reviewer_username, "zed");
        assert_eq!(trusted[1].weight, 2);

        assert!(
            is_trusted_reviewer(&test_db.pool, alice_id, test_db.user_id("zed"))
                .await
                .expect("Failed to check trust")
        );
    }

    #[rocket::async_test]
    async fn test_duplicate_trust_rejected() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");

        add_trusted_reviewer(&test_db.pool, alice_id, bob_id, 1)
            .await
            .expect("Failed to add trusted reviewer");

        let duplicate = add_trusted_reviewer(&test_db.pool, alice_id, bob_id, 3).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let trusted = get_trusted_reviewers_for_student(&test_db.pool, alice_id)
            .await
            .expect("Failed to list trusted reviewers");
        assert_eq!(trusted.len(), 1);
        assert_eq!(trusted[0].weight, 1);
    }

    #[rocket::async_test]
    async fn test_trust_is_per_student() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .student("dave")
            .reviewer("bob")
            .build()
            .await
            .expect("Failed to build test database");

        add_trusted_reviewer(
            &test_db.pool,
            test_db.user_id("alice"),
            test_db.user_id("bob"),
            1,
        )
        .await
        .expect("Failed to add trusted reviewer");

        let dave_trusts_bob = is_trusted_reviewer(
            &test_db.pool,
            test_db.user_id("dave"),
            test_db.user_id("bob"),
        )
        .await
        .expect("Failed to check trust");
        assert!(!dave_trusts_bob);
    }

    #[rocket::async_test]
    async fn test_remove_trusted_reviewer() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");

        add_trusted_reviewer(&test_db.pool, alice_id, bob_id, 1)
            .await
            .expect("Failed to add trusted reviewer");
        remove_trusted_reviewer(&test_db.pool, alice_id, bob_id)
            .await
            .expect("Failed to remove trusted reviewer");

        assert!(
            !is_trusted_reviewer(&test_db.pool, alice_id, bob_id)
                .await
                .expect("Failed to check trust")
        );

        let again = remove_trusted_reviewer(&test_db.pool, alice_id, bob_id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_update_reviewer_weight() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .reviewer("bob")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");
        let bob_id = test_db.user_id("bob");

        add_trusted_reviewer(&test_db.pool, alice_id, bob_id, 1)
            .await
            .expect("Failed to add trusted reviewer");
        update_reviewer_weight(&test_db.pool, alice_id, bob_id, 5)
            .await
            .expect("Failed to update weight");

        let trusted = get_trusted_reviewers_for_student(&test_db.pool, alice_id)
            .await
            .expect("Failed to list trusted reviewers");
        assert_eq!(trusted[0].weight, 5);
    }
}
