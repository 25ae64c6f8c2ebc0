#[cfg(test)]
mod tests {
    use crate::auth::Role;
    use crate::db::{
        add_user_role, authenticate_user, create_user, delete_user, get_all_users, get_user,
        get_user_by_username, get_users_with_role, remove_user_role, update_user_email,
        update_user_password,
    };
    use crate::error::AppError;
    use crate::test::utils::test_db::TestDbBuilder;

    #[rocket::async_test]
    async fn test_create_and_get_user() {
        let test_db = TestDbBuilder::new()
            .user("alice", &[Role::Student, Role::Reviewer])
            .build()
            .await
            .expect("Failed to build test database");

        let user = get_user(&test_db.pool, test_db.user_id("alice"))
            .await
            .expect("Failed to get user");

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.has_role(Role::Student));
        assert!(user.has_role(Role::Reviewer));
        assert!(!user.has_role(Role::Admin));
    }

    #[rocket::async_test]
    async fn test_duplicate_username_rejected() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let result = create_user(
            &test_db.pool,
            "alice",
            "anotherpassword",
            "other@example.com",
            &[Role::Student],
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));

        let users = get_all_users(&test_db.pool)
            .await
            .expect("Failed to get users");
        assert_eq!(users.len(), 1);
    }

    #[rocket::async_test]
    async fn test_authenticate_user() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let ok = authenticate_user(&test_db.pool, "alice", "password123")
            .await
            .expect("Failed to authenticate");
        assert!(ok);

        let wrong = authenticate_user(&test_db.pool, "alice", "wrongpassword")
            .await
            .expect("Failed to authenticate");
        assert!(!wrong);

        let unknown = authenticate_user(&test_db.pool, "nobody", "password123")
            .await
            .expect("Failed to authenticate");
        assert!(!unknown);
    }

    #[rocket::async_test]
    async fn test_update_password() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        update_user_password(&test_db.pool, test_db.user_id("alice"), "newpassword456")
            .await
            .expect("Failed to update password");

        let new_ok = authenticate_user(&test_db.pool, "alice", "newpassword456")
            .await
            .expect("Failed to authenticate");
        assert!(new_ok);

        let old_ok = authenticate_user(&test_db.pool, "alice", "password123")
            .await
            .expect("Failed to authenticate");
        assert!(!old_ok);
    }

    #[rocket::async_test]
    async fn test_update_email() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        update_user_email(&test_db.pool, test_db.user_id("alice"), "new@example.com")
            .await
            .expect("Failed to update email");

        let user = get_user_by_username(&test_db.pool, "alice")
            .await
            .expect("Failed to get user");
        assert_eq!(user.email, "new@example.com");

        let missing = update_user_email(&test_db.pool, 9999, "x@example.com").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_add_and_remove_role() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");

        add_user_role(&test_db.pool, alice_id, Role::Reviewer)
            .await
            .expect("Failed to add role");
        // Repeating the grant is a no-op.
        add_user_role(&test_db.pool, alice_id, Role::Reviewer)
            .await
            .expect("Failed to re-add role");

        let user = get_user(&test_db.pool, alice_id)
            .await
            .expect("Failed to get user");
        assert_eq!(user.roles.len(), 2);
        assert!(user.has_role(Role::Reviewer));

        remove_user_role(&test_db.pool, alice_id, Role::Reviewer)
            .await
            .expect("Failed to remove role");

        let user = get_user(&test_db.pool, alice_id)
            .await
            .expect("Failed to get user");
        assert!(!user.has_role(Role::Reviewer));
        assert!(user.has_role(Role::Student));
    }

    #[rocket::async_test]
    async fn test_get_users_with_role() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .student("bob")
            .reviewer("carol")
            .build()
            .await
            .expect("Failed to build test database");

        let students = get_users_with_role(&test_db.pool, Role::Student)
            .await
            .expect("Failed to get students");
        assert_eq!(students.len(), 2);
        assert!(students.iter().all(|u| u.has_role(Role::Student)));

        let reviewers = get_users_with_role(&test_db.pool, Role::Reviewer)
            .await
            .expect("Failed to get reviewers");
        assert_eq!(reviewers.len(), 1);
        assert_eq!(reviewers[0].username, "carol");
    }

    #[rocket::async_test]
    async fn test_delete_user() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_id = test_db.user_id("alice");

        delete_user(&test_db.pool, alice_id)
            .await
            .expect("Failed to delete user");

        let result = get_user(&test_db.pool, alice_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let again = delete_user(&test_db.pool, alice_id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_permission_checks_across_roles() {
        let test_db = TestDbBuilder::new()
            .user("alice", &[Role::Student, Role::Reviewer])
            .student("bob")
            .build()
            .await
            .expect("Failed to build test database");

        use crate::auth::Permission;

        let alice = get_user(&test_db.pool, test_db.user_id("alice"))
            .await
            .expect("Failed to get user");
        assert!(alice.has_permission(Permission::WriteReviews));
        assert!(alice.has_permission(Permission::AskQuestions));

        let bob = get_user(&test_db.pool, test_db.user_id("bob"))
            .await
            .expect("Failed to get user");
        assert!(!bob.has_permission(Permission::WriteReviews));
        assert!(bob.has_permission(Permission::PostAnswers));
    }
}
