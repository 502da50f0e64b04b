use common::UserRole;
use ecosystem_server::entity::user;
use ecosystem_server::utils::jwt;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde_json::json;

use crate::common::{ADMIN_EMAIL, JWT_SECRET, TestApp, routes};

async fn load_user(app: &TestApp, id: i32) -> user::Model {
    user::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .expect("Failed to query user")
        .expect("User not found")
}

mod google_sign_in {
    use super::*;

    #[tokio::test]
    async fn first_sign_in_creates_a_regular_user_and_returns_a_usable_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::GOOGLE_AUTH,
                &json!({"tokenId": "valid:Ana@Example.com:Ana:Pérez"}),
            )
            .await;

        assert_eq!(res.status, 200, "Sign-in failed: {}", res.text);
        assert_eq!(res.body["user"]["email"], "ana@example.com");
        assert_eq!(res.body["user"]["firstName"], "Ana");
        assert_eq!(res.body["user"]["role"], "USUARIO_REGULAR");

        let token = res.body["token"].as_str().expect("Missing token");
        let me = app.get_with_token(routes::ME, token).await;
        assert_eq!(me.status, 200, "GET /me failed: {}", me.text);
        assert_eq!(me.body["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn configured_admin_email_signs_in_as_administrator() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::GOOGLE_AUTH,
                &json!({"tokenId": format!("valid:{ADMIN_EMAIL}:Root:Admin")}),
            )
            .await;

        assert_eq!(res.status, 200, "Sign-in failed: {}", res.text);
        assert_eq!(res.body["user"]["role"], "ADMINISTRADOR");
    }

    #[tokio::test]
    async fn second_sign_in_reuses_the_existing_account() {
        let app = TestApp::spawn().await;
        let body = json!({"tokenId": "valid:ana@example.com:Ana:Pérez"});

        let first = app.post_without_token(routes::GOOGLE_AUTH, &body).await;
        let second = app.post_without_token(routes::GOOGLE_AUTH, &body).await;

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 200);
        assert_eq!(first.body["user"]["id"], second.body["user"]["id"]);
    }

    #[tokio::test]
    async fn rejected_identity_token_is_invalid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::GOOGLE_AUTH, &json!({"tokenId": "forged"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn blank_identity_token_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::GOOGLE_AUTH, &json!({"tokenId": "   "}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn deactivated_account_cannot_sign_in() {
        let app = TestApp::spawn().await;
        let (id, _) = app
            .create_user("gone@example.com", UserRole::UsuarioRegular)
            .await;
        let mut account = load_user(&app, id).await.into_active_model();
        account.deleted = Set(true);
        account.update(&app.db).await.expect("Failed to deactivate");

        let res = app
            .post_without_token(
                routes::GOOGLE_AUTH,
                &json!({"tokenId": "valid:gone@example.com:Gone:User"}),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod bearer_gate {
    use super::*;

    #[tokio::test]
    async fn request_without_token_is_token_missing() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn reference_data_is_readable_without_a_token() {
        let app = TestApp::spawn().await;
        app.insert_country("Argentina").await;

        let res = app.get_without_token(routes::COUNTRIES).await;

        assert_eq!(res.status, 200, "Listing failed: {}", res.text);
        assert_eq!(res.body[0]["name"], "Argentina");
    }

    #[tokio::test]
    async fn anonymous_writes_are_token_missing() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::COUNTRIES, &json!({"name": "Paraguay"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn bad_token_is_rejected_even_on_public_reads() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::COUNTRIES, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn non_bearer_authorization_is_token_invalid() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_authorization(routes::ALL_ACCEPTED, "Basic YW5hOnNlY3JldA==")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_token_invalid() {
        let app = TestApp::spawn().await;
        let (id, _) = app
            .create_user("ana@example.com", UserRole::UsuarioRegular)
            .await;
        let forged = jwt::sign(&load_user(&app, id).await, "another-secret", 7).unwrap();

        let res = app.get_with_token(routes::ME, &forged).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn expired_token_is_token_invalid() {
        let app = TestApp::spawn().await;
        let (id, _) = app
            .create_user("ana@example.com", UserRole::UsuarioRegular)
            .await;
        let expired = jwt::sign(&load_user(&app, id).await, JWT_SECRET, -1).unwrap();

        let res = app.get_with_token(routes::ME, &expired).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn garbage_token_is_token_invalid() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_of_a_deactivated_user_is_token_invalid() {
        let app = TestApp::spawn().await;
        let (id, token) = app
            .create_user("ana@example.com", UserRole::UsuarioRegular)
            .await;
        let mut account = load_user(&app, id).await.into_active_model();
        account.deleted = Set(true);
        account.update(&app.db).await.expect("Failed to deactivate");

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod user_statistics {
    use super::*;

    #[tokio::test]
    async fn admin_sees_users_registered_this_month() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.regular_token("ana@example.com").await;
        app.regular_token("luis@example.com").await;

        let res = app.get_with_token(routes::USER_STATISTICS, &admin).await;

        assert_eq!(res.status, 200, "Statistics failed: {}", res.text);
        assert_eq!(res.body["createdThisMonth"], 3);
    }

    #[tokio::test]
    async fn regular_user_cannot_read_user_statistics() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app.get_with_token(routes::USER_STATISTICS, &token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
