use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Asha", "email": "asha@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["name"], "Asha");
        assert_eq!(res.body["user"]["email"], "asha@example.com");
        assert_eq!(res.body["user"]["is_admin"], false);
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;
        let body = json!({"name": "Asha", "email": "asha@example.com", "password": "securepass"});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(
            first.status, 201,
            "First registration failed: {}",
            first.text
        );

        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn email_comparison_ignores_case() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Asha", "email": "asha@example.com", "password": "securepass"}),
            )
            .await;
        assert_eq!(first.status, 201);

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Asha", "email": "Asha@Example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_password_that_is_too_short() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Asha", "email": "asha@example.com", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_a_malformed_email() {
        let app = TestApp::spawn().await;

        for email in ["not-an-email", "@nodomain", "user@tld"] {
            let res = app
                .post_without_token(
                    routes::REGISTER,
                    &json!({"name": "Asha", "email": email, "password": "securepass"}),
                )
                .await;

            assert_eq!(res.status, 400, "accepted {email:?}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn cannot_register_with_a_blank_name() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "   ", "email": "asha@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_log_in() {
        let app = TestApp::spawn().await;
        app.register_user("Asha", "asha@example.com").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "asha@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["email"], "asha@example.com");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register_user("Asha", "asha@example.com").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "asha@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_indistinguishable_from_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn admin_login_rejects_regular_accounts() {
        let app = TestApp::spawn().await;
        app.register_user("Asha", "asha@example.com").await;

        let res = app
            .post_without_token(
                routes::ADMIN_LOGIN,
                &json!({"email": "asha@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_login_accepts_admin_accounts() {
        let app = TestApp::spawn().await;

        // admin_token() itself asserts a 200 from the admin login endpoint.
        let token = app.admin_token().await;
        assert!(!token.is_empty());
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn returns_the_current_user_profile() {
        let app = TestApp::spawn().await;
        let token = app.register_user("Asha", "asha@example.com").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Asha");
        assert_eq!(res.body["email"], "asha@example.com");
        assert_eq!(res.body["is_admin"], false);
    }

    #[tokio::test]
    async fn requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn rejects_a_garbage_token() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
