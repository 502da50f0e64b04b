use serde_json::json;

use crate::common::{TestApp, json_with_images, png_part, routes};

mod countries {
    use super::*;

    #[tokio::test]
    async fn countries_are_listed_by_name() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;
        app.insert_country("Uruguay").await;
        app.insert_country("Argentina").await;

        let res = app.get_with_token(routes::COUNTRIES, &token).await;

        assert_eq!(res.status, 200, "Listing failed: {}", res.text);
        assert_eq!(res.body[0]["name"], "Argentina");
        assert_eq!(res.body[1]["name"], "Uruguay");
    }

    #[tokio::test]
    async fn admin_creates_a_country() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::COUNTRIES, &json!({"name": "  Paraguay "}), &admin)
            .await;

        assert_eq!(res.status, 201, "Creation failed: {}", res.text);
        assert_eq!(res.body["name"], "Paraguay");
        assert!(res.body["id"].is_number());
    }

    #[tokio::test]
    async fn duplicate_country_name_ignoring_case_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.insert_country("Argentina").await;

        let res = app
            .post_with_token(routes::COUNTRIES, &json!({"name": "ARGENTINA"}), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_countries() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app
            .post_with_token(routes::COUNTRIES, &json!({"name": "Paraguay"}), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn blank_country_name_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::COUNTRIES, &json!({"name": "  "}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod provinces {
    use super::*;

    #[tokio::test]
    async fn provinces_of_a_country_are_listed_by_name() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;
        let argentina = app.insert_country("Argentina").await;
        let chile = app.insert_country("Chile").await;
        app.insert_province("Salta", argentina).await;
        app.insert_province("Mendoza", argentina).await;
        app.insert_province("Valparaiso", chile).await;

        let res = app
            .get_with_token(&routes::country_provinces(argentina), &token)
            .await;

        assert_eq!(res.status, 200, "Listing failed: {}", res.text);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Mendoza", "Salta"]);
    }

    #[tokio::test]
    async fn provinces_of_an_unknown_country_are_not_found() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app.get_with_token(&routes::country_provinces(999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_creates_a_province_in_an_existing_country() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let argentina = app.insert_country("Argentina").await;

        let res = app
            .post_with_token(
                routes::PROVINCES,
                &json!({"name": "Mendoza", "countryId": argentina}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "Creation failed: {}", res.text);
        assert_eq!(res.body["name"], "Mendoza");
        assert_eq!(res.body["countryId"], argentina);
    }

    #[tokio::test]
    async fn province_in_an_unknown_country_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::PROVINCES,
                &json!({"name": "Mendoza", "countryId": 999}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn same_province_name_is_allowed_in_another_country_only() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let argentina = app.insert_country("Argentina").await;
        let chile = app.insert_country("Chile").await;
        app.insert_province("Santa Cruz", argentina).await;

        let elsewhere = app
            .post_with_token(
                routes::PROVINCES,
                &json!({"name": "Santa Cruz", "countryId": chile}),
                &admin,
            )
            .await;
        let duplicate = app
            .post_with_token(
                routes::PROVINCES,
                &json!({"name": "santa cruz", "countryId": argentina}),
                &admin,
            )
            .await;

        assert_eq!(elsewhere.status, 201, "Creation failed: {}", elsewhere.text);
        assert_eq!(duplicate.status, 409);
        assert_eq!(duplicate.body["code"], "CONFLICT");
    }
}

mod categories {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_category_with_one_image() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let token = app.regular_token("ana@example.com").await;

        let form = json_with_images("category", &json!({"name": "Textiles"}), "image", &["icon.png"]);
        let res = app
            .post_multipart_with_token(routes::CATEGORIES, form, &admin)
            .await;

        assert_eq!(res.status, 201, "Creation failed: {}", res.text);
        assert_eq!(res.body["name"], "Textiles");
        assert!(res.body["image"].is_string());
        assert_eq!(app.store.len(), 1);

        let listed = app.get_with_token(routes::CATEGORIES, &token).await;
        assert_eq!(listed.status, 200);
        assert_eq!(listed.body[0]["name"], "Textiles");
        assert_eq!(listed.body[0]["image"], res.body["image"]);
    }

    #[tokio::test]
    async fn category_needs_exactly_one_image() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let none = json_with_images("category", &json!({"name": "Textiles"}), "image", &[]);
        let two = json_with_images(
            "category",
            &json!({"name": "Textiles"}),
            "image",
            &["a.png", "b.png"],
        );
        let without = app
            .post_multipart_with_token(routes::CATEGORIES, none, &admin)
            .await;
        let with_two = app
            .post_multipart_with_token(routes::CATEGORIES, two, &admin)
            .await;

        assert_eq!(without.status, 400);
        assert_eq!(without.body["code"], "VALIDATION_ERROR");
        assert_eq!(with_two.status, 400);
        assert_eq!(with_two.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_category_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.insert_category("Textiles").await;

        let form = json_with_images("category", &json!({"name": "TEXTILES"}), "image", &["icon.png"]);
        let res = app
            .post_multipart_with_token(routes::CATEGORIES, form, &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn update_renames_and_swaps_the_image() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let form = json_with_images("category", &json!({"name": "Textiles"}), "image", &["old.png"]);
        let created = app
            .post_multipart_with_token(routes::CATEGORIES, form, &admin)
            .await;
        let id = created.body["id"].as_i64().unwrap() as i32;

        let form = reqwest::multipart::Form::new()
            .text("category", json!({"name": "Tejidos"}).to_string())
            .part("image", png_part("new.png"));
        let res = app
            .put_multipart_with_token(&routes::category(id), form, &admin)
            .await;

        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        assert_eq!(res.body["name"], "Tejidos");
        assert_ne!(res.body["image"], created.body["image"]);
        assert_eq!(app.store.len(), 1);

        let fetched = app.get_with_token(&routes::category(id), &admin).await;
        assert_eq!(fetched.body["name"], "Tejidos");
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app.get_with_token(&routes::category(999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
