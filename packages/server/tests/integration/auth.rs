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
                &json!({"name": "Alice", "email": "Alice@Example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["role"], "user");
        assert!(res.body["token"].is_string());
        assert!(res.body["avatar_url"].is_null());
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;
        let body = json!({"name": "Alice", "email": "alice@example.com", "password": "securepass"});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Other", "email": "ALICE@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_invalid_fields() {
        let app = TestApp::spawn().await;

        for body in [
            json!({"name": "Alice", "email": "alice@example.com", "password": "short"}),
            json!({"name": "Alice", "email": "not-an-email", "password": "securepass"}),
            json!({"name": "", "email": "alice@example.com", "password": "securepass"}),
        ] {
            let res = app.post_without_token(routes::REGISTER, &body).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn registration_sets_an_http_only_session_cookie() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::REGISTER))
            .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "securepass"}))
            .send()
            .await
            .unwrap();

        let cookie = res
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .expect("Registration should set a cookie")
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=3600"));
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_login_and_receives_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("bob@example.com", "securepass").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "bob@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["name"], "Test User");
        assert_eq!(res.body["permissions"], json!([]));
    }

    #[tokio::test]
    async fn admin_login_carries_problem_permissions() {
        let app = TestApp::spawn().await;
        app.create_admin().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "admin@example.com", "password": "adminpass1"}),
            )
            .await;

        assert_eq!(res.status, 200);
        let permissions: Vec<&str> = res.body["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p.as_str())
            .collect();
        for expected in ["problem:create", "problem:edit", "problem:delete"] {
            assert!(permissions.contains(&expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn cannot_login_with_wrong_password() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("bob@example.com", "securepass").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "bob@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn cannot_login_with_unknown_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_json_body_returns_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::LOGIN))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn authenticated_user_can_retrieve_their_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("carol@example.com", "securepass").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "carol@example.com");
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn cookie_alone_authenticates_until_logout() {
        let app = TestApp::spawn().await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let reg = client
            .post(app.url(routes::REGISTER))
            .json(&json!({"name": "Dan", "email": "dan@example.com", "password": "securepass"}))
            .send()
            .await
            .unwrap();
        assert_eq!(reg.status().as_u16(), 201);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status().as_u16(), 200);

        let out = client.post(app.url(routes::LOGOUT)).send().await.unwrap();
        assert_eq!(out.status().as_u16(), 200);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn request_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn request_with_malformed_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod avatar {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    #[tokio::test]
    async fn uploaded_avatar_is_served_with_its_content_type() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("erin@example.com", "securepass").await;

        let res = app.upload_avatar(PNG.to_vec(), "image/png", &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["avatar_url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/api/v1/avatars/"));

        let image = app.client.get(app.url(&url)).send().await.unwrap();
        assert_eq!(image.status().as_u16(), 200);
        assert_eq!(image.headers()["content-type"], "image/png");
        assert_eq!(image.headers()["x-content-type-options"], "nosniff");
        assert_eq!(
            image.headers()["content-security-policy"],
            "default-src 'none'; sandbox"
        );
        assert_eq!(image.bytes().await.unwrap().as_ref(), PNG);

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["avatar_url"], url.as_str());
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("erin@example.com", "securepass").await;

        let res = app
            .upload_avatar(b"#!/bin/sh".to_vec(), "application/x-sh", &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_svg_uploads() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("erin@example.com", "securepass").await;
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;

        let res = app.upload_avatar(svg.to_vec(), "image/svg+xml", &token).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let me = app.get_with_token(routes::ME, &token).await;
        assert!(me.body["avatar_url"].is_null());
    }

    #[tokio::test]
    async fn rejects_oversized_uploads() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("erin@example.com", "securepass").await;

        let res = app
            .upload_avatar(vec![0u8; 65 * 1024], "image/png", &token)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_avatar_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("/api/v1/avatars/{}", "ab".repeat(32)))
            .await;
        assert_eq!(res.status, 404);

        let res = app.get_without_token("/api/v1/avatars/not-hex").await;
        assert_eq!(res.status, 404);
    }
}
