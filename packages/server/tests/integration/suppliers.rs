use common::SupplierStatus;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{PUBLIC_URL, TestApp, json_with_images, routes, supplier_body};

mod creation {
    use super::*;

    #[tokio::test]
    async fn new_supplier_starts_in_initial_review_with_feedback() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        let form = json_with_images(
            "supplier",
            &supplier_body("Huerta Los Andes", &places, "Mendoza"),
            "images",
            &["front.png", "back.png"],
        );
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 201, "Creation failed: {}", res.text);
        assert_eq!(res.body["status"], "REVISION_INICIAL");
        assert!(
            !res.body["feedback"].as_str().unwrap().trim().is_empty(),
            "Feedback must never be blank"
        );
        assert_eq!(res.body["deleted"], false);
        assert_eq!(res.body["country"]["name"], "Argentina");
        assert_eq!(res.body["province"]["name"], "Mendoza");
        assert_eq!(res.body["category"]["name"], "Agroecología");

        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0].as_str().unwrap().starts_with(PUBLIC_URL));
        assert_eq!(app.store.len(), 2);
    }

    #[tokio::test]
    async fn fourth_active_supplier_exceeds_the_quota() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        for i in 0..3 {
            app.create_supplier(&token, &supplier_body(&format!("Huerta {i}"), &places, "Mendoza"))
                .await;
        }

        let form = json_with_images(
            "supplier",
            &supplier_body("Huerta 3", &places, "Mendoza"),
            "images",
            &["front.png"],
        );
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "QUOTA_EXCEEDED");
        assert_eq!(app.store.len(), 3, "Rejected submission must not store images");
    }

    #[tokio::test]
    async fn concurrent_creates_by_one_user_stop_at_the_quota() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        let form = |i: usize| {
            json_with_images(
                "supplier",
                &supplier_body(&format!("Huerta {i}"), &places, "Mendoza"),
                "images",
                &["front.png"],
            )
        };
        let (a, b, c, d, e) = tokio::join!(
            app.post_multipart_with_token(routes::SUPPLIERS, form(0), &token),
            app.post_multipart_with_token(routes::SUPPLIERS, form(1), &token),
            app.post_multipart_with_token(routes::SUPPLIERS, form(2), &token),
            app.post_multipart_with_token(routes::SUPPLIERS, form(3), &token),
            app.post_multipart_with_token(routes::SUPPLIERS, form(4), &token),
        );

        let responses = [a, b, c, d, e];
        let created = responses.iter().filter(|r| r.status == 201).count();
        let refused = responses
            .iter()
            .filter(|r| r.status == 409 && r.body["code"] == "QUOTA_EXCEEDED")
            .count();
        assert_eq!(
            (created, refused),
            (3, 2),
            "Unexpected outcomes: {:?}",
            responses.iter().map(|r| (r.status, &r.text)).collect::<Vec<_>>()
        );
        assert_eq!(app.store.len(), 3);

        let mine = app.get_with_token(routes::MY_SUPPLIERS, &token).await;
        assert_eq!(mine.body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn soft_deleted_supplier_frees_a_quota_slot() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(
                app.create_supplier(&token, &supplier_body(&format!("Huerta {i}"), &places, "Mendoza"))
                    .await,
            );
        }

        let hidden = app
            .put_empty_with_token(&routes::supplier_deleted(ids[0]), &token)
            .await;
        assert_eq!(hidden.status, 204, "Soft delete failed: {}", hidden.text);

        app.create_supplier(&token, &supplier_body("Huerta 3", &places, "Mendoza"))
            .await;
    }

    #[tokio::test]
    async fn supplier_without_images_is_rejected() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        let form = json_with_images(
            "supplier",
            &supplier_body("Huerta", &places, "Mendoza"),
            "images",
            &[],
        );
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn file_that_is_not_an_image_is_rejected() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;

        let form = Form::new()
            .part(
                "supplier",
                Part::text(supplier_body("Huerta", &places, "Mendoza").to_string()),
            )
            .part(
                "images",
                Part::bytes(b"definitely not a png".to_vec()).file_name("fake.png"),
            );
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ASSET_INVALID");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn short_description_longer_than_fifty_chars_is_rejected() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let mut body = supplier_body("Huerta", &places, "Mendoza");
        body["shortDescription"] = json!("x".repeat(51));

        let form = json_with_images("supplier", &body, "images", &["front.png"]);
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn province_of_another_country_is_rejected() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let chile = app.insert_country("Chile").await;
        let santiago = app.insert_province("Santiago", chile).await;
        let token = app.regular_token("ana@example.com").await;
        let mut body = supplier_body("Huerta", &places, "Mendoza");
        body["provinceId"] = json!(santiago);

        let form = json_with_images("supplier", &body, "images", &["front.png"]);
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn administrator_cannot_submit_suppliers() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let admin = app.admin_token().await;

        let form = json_with_images(
            "supplier",
            &supplier_body("Huerta", &places, "Mendoza"),
            "images",
            &["front.png"],
        );
        let res = app
            .post_multipart_with_token(routes::SUPPLIERS, form, &admin)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod review {
    use super::*;

    #[tokio::test]
    async fn review_without_feedback_field_names_the_field() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app
            .put_with_token(
                &routes::supplier_feedback(id),
                &json!({"status": "ACEPTADO"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let message = res.body["message"].as_str().unwrap();
        assert!(message.contains("feedback"), "Unexpected message: {message}");
    }

    #[tokio::test]
    async fn admin_review_sets_status_and_feedback() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app
            .review_supplier(
                &admin,
                id,
                SupplierStatus::RequiereCambios,
                "Please add a phone with area code",
            )
            .await;

        assert_eq!(res.status, 200, "Review failed: {}", res.text);
        assert_eq!(res.body["status"], "REQUIERE_CAMBIOS");
        assert_eq!(res.body["feedback"], "Please add a phone with area code");

        let feedback = app.get_with_token(routes::MY_FEEDBACK, &token).await;
        assert_eq!(feedback.status, 200);
        assert_eq!(feedback.body[0]["status"], "REQUIERE_CAMBIOS");
        assert_eq!(feedback.body[0]["feedback"], "Please add a phone with area code");
    }

    #[tokio::test]
    async fn review_with_blank_feedback_is_rejected() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app
            .review_supplier(&admin, id, SupplierStatus::Aceptado, "  ")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_user_cannot_review() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app
            .review_supplier(&token, id, SupplierStatus::Aceptado, "Self approved")
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn reviewing_an_unknown_supplier_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .review_supplier(&admin, 999, SupplierStatus::Aceptado, "Fine")
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_overview_groups_by_status_and_skips_deleted() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let pending = app
            .create_supplier(&token, &supplier_body("Pendiente", &places, "Mendoza"))
            .await;
        let accepted = app
            .create_accepted_supplier(&token, &admin, &supplier_body("Aceptado", &places, "Mendoza"))
            .await;
        let hidden = app
            .create_supplier(&token, &supplier_body("Oculto", &places, "Mendoza"))
            .await;
        app.put_empty_with_token(&routes::supplier_deleted(hidden), &token)
            .await;

        let res = app.get_with_token(routes::SUPPLIERS, &admin).await;

        assert_eq!(res.status, 200, "Overview failed: {}", res.text);
        let new = res.body["newSuppliers"].as_array().unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0]["id"], pending);
        assert_eq!(new[0]["category"], "Agroecología");
        assert_eq!(res.body["approvedSuppliers"][0]["id"], accepted);
        assert!(res.body["deniedSuppliers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn monthly_statistics_count_by_status_and_category() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        app.create_supplier(&token, &supplier_body("Pendiente", &places, "Mendoza"))
            .await;
        app.create_accepted_supplier(&token, &admin, &supplier_body("Aceptado", &places, "Mendoza"))
            .await;

        let res = app.get_with_token(routes::SUPPLIER_STATISTICS, &admin).await;

        assert_eq!(res.status, 200, "Statistics failed: {}", res.text);
        assert_eq!(res.body["approved"], 1);
        assert_eq!(res.body["inReview"], 1);
        assert_eq!(res.body["denied"], 0);
        assert_eq!(res.body["categories"][0]["name"], "Agroecología");
        assert_eq!(res.body["categories"][0]["registered"], 2);
    }
}

mod owner_edits {
    use super::*;

    #[tokio::test]
    async fn update_resets_review_and_replaces_every_image() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_accepted_supplier(&token, &admin, &supplier_body("Huerta", &places, "Mendoza"))
            .await;
        let old_keys = app.store.keys();

        let mut body = supplier_body("Huerta Renovada", &places, "Godoy Cruz");
        body["provinceId"] = json!(places.other_province_id);
        let form = json_with_images("supplier", &body, "images", &["a.png", "b.png"]);
        let res = app
            .put_multipart_with_token(&routes::supplier(id), form, &token)
            .await;

        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        assert_eq!(res.body["name"], "Huerta Renovada");
        assert_eq!(res.body["city"], "Godoy Cruz");
        assert_eq!(res.body["province"]["id"], places.other_province_id);
        assert_eq!(res.body["status"], "REVISION_INICIAL");
        assert!(!res.body["feedback"].as_str().unwrap().trim().is_empty());
        assert_eq!(res.body["images"].as_array().unwrap().len(), 2);

        let keys = app.store.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| !old_keys.contains(k)));
    }

    #[tokio::test]
    async fn failed_upload_keeps_the_previous_images() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;
        let before = app.get_with_token(&routes::supplier(id), &token).await;
        let old_keys = app.store.keys();

        app.store.fail_puts_after(1);
        let form = json_with_images(
            "supplier",
            &supplier_body("Huerta Renovada", &places, "Mendoza"),
            "images",
            &["a.png", "b.png"],
        );
        let res = app
            .put_multipart_with_token(&routes::supplier(id), form, &token)
            .await;
        app.store.heal();

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "ASSET_INVALID");
        assert_eq!(app.store.keys(), old_keys);

        let after = app.get_with_token(&routes::supplier(id), &token).await;
        assert_eq!(after.body["name"], "Huerta");
        assert_eq!(after.body["images"], before.body["images"]);
    }

    #[tokio::test]
    async fn another_user_cannot_update_the_supplier() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let owner = app.regular_token("ana@example.com").await;
        let intruder = app.regular_token("luis@example.com").await;
        let id = app
            .create_supplier(&owner, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let form = json_with_images(
            "supplier",
            &supplier_body("Mine now", &places, "Mendoza"),
            "images",
            &["a.png"],
        );
        let res = app
            .put_multipart_with_token(&routes::supplier(id), form, &intruder)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn own_listing_excludes_soft_deleted_suppliers() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let kept = app
            .create_supplier(&token, &supplier_body("Visible", &places, "Mendoza"))
            .await;
        let hidden = app
            .create_supplier(&token, &supplier_body("Oculto", &places, "Mendoza"))
            .await;
        app.put_empty_with_token(&routes::supplier_deleted(hidden), &token)
            .await;

        let res = app.get_with_token(routes::MY_SUPPLIERS, &token).await;

        assert_eq!(res.status, 200);
        let listed = res.body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], kept);
    }

    #[tokio::test]
    async fn soft_deleted_supplier_is_hidden_from_non_admins() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;
        app.put_empty_with_token(&routes::supplier_deleted(id), &token)
            .await;

        let as_owner = app.get_with_token(&routes::supplier(id), &token).await;
        let as_admin = app.get_with_token(&routes::supplier(id), &admin).await;

        assert_eq!(as_owner.status, 404);
        assert_eq!(as_admin.status, 200);
        assert_eq!(as_admin.body["deleted"], true);
    }

    #[tokio::test]
    async fn hard_delete_removes_the_row_and_its_images() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let admin = app.admin_token().await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app.delete_with_token(&routes::supplier(id), &admin).await;

        assert_eq!(res.status, 204, "Delete failed: {}", res.text);
        assert!(app.store.is_empty());
        let gone = app.get_with_token(&routes::supplier(id), &admin).await;
        assert_eq!(gone.status, 404);
    }

    #[tokio::test]
    async fn owner_cannot_hard_delete() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let token = app.regular_token("ana@example.com").await;
        let id = app
            .create_supplier(&token, &supplier_body("Huerta", &places, "Mendoza"))
            .await;

        let res = app.delete_with_token(&routes::supplier(id), &token).await;

        assert_eq!(res.status, 403);
    }
}
