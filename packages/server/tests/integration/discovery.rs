use common::SupplierStatus;

use crate::common::{Places, TestApp, routes, supplier_body};

/// Three listings owned by one user: accepted, pending and accepted-then-hidden.
/// Returns the owner's token, the admin's token and the accepted listing's id.
async fn seed_directory(app: &TestApp, places: &Places) -> (String, String, i32) {
    let token = app.regular_token("ana@example.com").await;
    let admin = app.admin_token().await;

    let accepted = app
        .create_accepted_supplier(&token, &admin, &supplier_body("Huerta Los Andes", places, "Godoy Cruz"))
        .await;
    app.create_supplier(&token, &supplier_body("Huerta Pendiente", places, "Godoy Cruz"))
        .await;
    let hidden = app
        .create_accepted_supplier(&token, &admin, &supplier_body("Huerta Oculta", places, "Godoy Cruz"))
        .await;
    let res = app
        .put_empty_with_token(&routes::supplier_deleted(hidden), &token)
        .await;
    assert_eq!(res.status, 204, "Soft delete failed: {}", res.text);

    (token, admin, accepted)
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn all_accepted_skips_pending_and_deleted_suppliers() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;

        let res = app.get_with_token(routes::ALL_ACCEPTED, &token).await;

        assert_eq!(res.status, 200, "Listing failed: {}", res.text);
        let listed = res.body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], accepted);
        assert_eq!(listed[0]["status"], "ACEPTADO");
    }

    #[tokio::test]
    async fn all_names_returns_id_and_name_pairs() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;

        let res = app.get_with_token(routes::ALL_NAMES, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body,
            serde_json::json!([{"id": accepted, "name": "Huerta Los Andes"}])
        );
    }

    #[tokio::test]
    async fn rejected_supplier_leaves_discovery() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, admin, accepted) = seed_directory(&app, &places).await;

        app.review_supplier(&admin, accepted, SupplierStatus::Denegado, "Duplicate listing")
            .await;
        let res = app.get_with_token(routes::ALL_ACCEPTED, &token).await;

        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }
}

mod by_name {
    use super::*;

    #[tokio::test]
    async fn matches_substrings_ignoring_case() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_NAME, &[("name", "los AN")], &token)
            .await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        let found = res.body.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], accepted);
    }

    #[tokio::test]
    async fn blank_name_is_an_invalid_query() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_NAME, &[("name", "   ")], &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn missing_name_is_an_invalid_query() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app.get_with_token(routes::SEARCH_BY_NAME, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn pending_and_deleted_names_are_not_found() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, _) = seed_directory(&app, &places).await;

        for name in ["Pendiente", "Oculta"] {
            let res = app
                .get_query_with_token(routes::SEARCH_BY_NAME, &[("name", name)], &token)
                .await;

            assert_eq!(res.status, 404, "'{name}' should not be discoverable");
            assert_eq!(res.body["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn percent_sign_is_matched_literally() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, _) = seed_directory(&app, &places).await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_NAME, &[("name", "%")], &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod by_category {
    use super::*;

    #[tokio::test]
    async fn exact_name_ignoring_case_matches() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;

        let res = app
            .get_query_with_token(
                routes::SEARCH_BY_CATEGORY,
                &[("category", "AGROECOLOGÍA")],
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn partial_name_falls_back_to_containing_category() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_CATEGORY, &[("category", "agro")], &token)
            .await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn unknown_category_is_an_invalid_query() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_CATEGORY, &[("category", "Textiles")], &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn category_without_accepted_suppliers_is_not_found() {
        let app = TestApp::spawn().await;
        app.seed_places().await;
        app.insert_category("Textiles").await;
        let token = app.regular_token("ana@example.com").await;

        let res = app
            .get_query_with_token(routes::SEARCH_BY_CATEGORY, &[("category", "textiles")], &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod by_location {
    use super::*;

    async fn search(app: &TestApp, token: &str, lat: &str, lng: &str) -> crate::common::TestResponse {
        app.get_query_with_token(
            routes::SEARCH_BY_LOCATION,
            &[("lat", lat), ("lng", lng)],
            token,
        )
        .await
    }

    #[tokio::test]
    async fn same_city_matches_first() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;
        app.geocoder.answer(&[
            ("Godoy Cruz", "locality"),
            ("Mendoza Province", "administrative_area_level_1"),
            ("Argentina", "country"),
        ]);

        let res = search(&app, &token, "-32.92", "-68.84").await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn other_city_widens_to_the_province() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;
        app.geocoder.answer(&[
            ("Maipu", "locality"),
            ("Mendoza", "administrative_area_level_1"),
            ("Argentina", "country"),
        ]);

        let res = search(&app, &token, "-32.98", "-68.78").await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn other_province_widens_to_the_country() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;
        app.geocoder.answer(&[
            ("Salta", "locality"),
            ("Salta", "administrative_area_level_1"),
            ("Argentina", "country"),
        ]);

        let res = search(&app, &token, "-24.78", "-65.41").await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn other_country_yields_an_empty_list() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, _) = seed_directory(&app, &places).await;
        app.geocoder.answer(&[
            ("Santiago", "locality"),
            ("Region Metropolitana", "administrative_area_level_1"),
            ("Chile", "country"),
        ]);

        let res = search(&app, &token, "-33.45", "-70.66").await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn geocoder_failure_answers_no_content() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;
        app.geocoder.fail();

        let res = search(&app, &token, "-32.92", "-68.84").await;

        assert_eq!(res.status, 204);
        assert!(res.text.is_empty());
    }

    #[tokio::test]
    async fn result_without_country_answers_no_content() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;
        app.geocoder.answer(&[("Atlantic Ocean", "natural_feature")]);

        let res = search(&app, &token, "-40.0", "-30.0").await;

        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn out_of_range_latitude_is_an_invalid_query() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = search(&app, &token, "91", "0").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn non_numeric_coordinates_are_an_invalid_query() {
        let app = TestApp::spawn().await;
        let token = app.regular_token("ana@example.com").await;

        let res = search(&app, &token, "north", "0").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_QUERY");
    }
}

mod anonymous {
    use super::*;

    #[tokio::test]
    async fn visitors_list_and_search_without_signing_in() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (_, _, accepted) = seed_directory(&app, &places).await;

        let listed = app.get_without_token(routes::ALL_ACCEPTED).await;
        let names = app.get_without_token(routes::ALL_NAMES).await;
        let by_name = app
            .get_query_without_token(routes::SEARCH_BY_NAME, &[("name", "andes")])
            .await;
        let by_category = app
            .get_query_without_token(routes::SEARCH_BY_CATEGORY, &[("category", "agro")])
            .await;

        for res in [&listed, &names, &by_name, &by_category] {
            assert_eq!(res.status, 200, "Anonymous read failed: {}", res.text);
            assert_eq!(res.body.as_array().unwrap().len(), 1);
            assert_eq!(res.body[0]["id"], accepted);
        }
    }

    #[tokio::test]
    async fn visitors_search_by_location() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (_, _, accepted) = seed_directory(&app, &places).await;
        app.geocoder.answer(&[
            ("Godoy Cruz", "locality"),
            ("Mendoza Province", "administrative_area_level_1"),
            ("Argentina", "country"),
        ]);

        let res = app
            .get_query_without_token(
                routes::SEARCH_BY_LOCATION,
                &[("lat", "-32.92"), ("lng", "-68.84")],
            )
            .await;

        assert_eq!(res.status, 200, "Search failed: {}", res.text);
        assert_eq!(res.body[0]["id"], accepted);
    }

    #[tokio::test]
    async fn visitors_see_accepted_suppliers_but_not_deleted_ones() {
        let app = TestApp::spawn().await;
        let places = app.seed_places().await;
        let (token, _, accepted) = seed_directory(&app, &places).await;
        let hidden = app
            .create_supplier(&token, &supplier_body("Huerta Borrada", &places, "Godoy Cruz"))
            .await;
        app.put_empty_with_token(&routes::supplier_deleted(hidden), &token)
            .await;

        let visible = app.get_without_token(&routes::supplier(accepted)).await;
        let deleted = app.get_without_token(&routes::supplier(hidden)).await;

        assert_eq!(visible.status, 200, "Read failed: {}", visible.text);
        assert_eq!(visible.body["name"], "Huerta Los Andes");
        assert_eq!(deleted.status, 404);
    }

    #[tokio::test]
    async fn admin_only_supplier_reads_still_need_a_token() {
        let app = TestApp::spawn().await;

        let overview = app.get_without_token(routes::SUPPLIERS).await;
        let statistics = app.get_without_token(routes::SUPPLIER_STATISTICS).await;
        let mine = app.get_without_token(routes::MY_SUPPLIERS).await;

        for res in [overview, statistics, mine] {
            assert_eq!(res.status, 401);
            assert_eq!(res.body["code"], "TOKEN_MISSING");
        }
    }
}
