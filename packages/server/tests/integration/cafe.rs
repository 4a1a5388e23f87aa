use serde_json::json;

use crate::common::{TestApp, cafe_payload, routes};

mod permissions {
    use super::*;

    #[tokio::test]
    async fn anonymous_users_cannot_create_cafes() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::CAFES, &cafe_payload("Himalayan Java"))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn regular_users_cannot_create_cafes() {
        let app = TestApp::spawn().await;
        let token = app.register_user("Asha", "asha@example.com").await;

        let res = app
            .post_with_token(routes::CAFES, &cafe_payload("Himalayan Java"), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn regular_users_cannot_update_or_delete_cafes() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_cafe(&admin, &cafe_payload("Himalayan Java")).await;
        let token = app.register_user("Asha", "asha@example.com").await;

        let res = app
            .patch_with_token(&routes::cafe(id), &json!({"name": "Renamed"}), &token)
            .await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::cafe(id), &token).await;
        assert_eq!(res.status, 403);
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn created_cafe_has_defaults_and_empty_aggregate() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::CAFES, &cafe_payload("Himalayan Java"), &admin)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "Himalayan Java");
        assert_eq!(res.body["price_range"], "₹");
        assert_eq!(res.body["address"]["country"], "Nepal");
        assert_eq!(res.body["avg_rating"], 0.0);
        assert_eq!(res.body["review_count"], 0);
        // No schedule: open/closed is unknown, not false.
        assert!(res.body["open_now"].is_null());
        assert_eq!(res.body["today_hours"], "Hours not available");
    }

    #[tokio::test]
    async fn opening_hours_round_trip_in_text_map_shape() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Himalayan Java");
        payload["opening_hours"] = json!({
            "monday": "7:00 AM - 9:00 PM",
            "sunday": "closed",
        });

        let res = app.post_with_token(routes::CAFES, &payload, &admin).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let id = res.body["id"].as_i64().unwrap();
        let fetched = app.get_without_token(&routes::cafe(id)).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(
            fetched.body["opening_hours"],
            json!({"monday": "7:00 AM - 9:00 PM", "sunday": "closed"})
        );
        // A concrete schedule always yields a definite open/closed badge.
        assert!(fetched.body["open_now"].is_boolean());
    }

    #[tokio::test]
    async fn malformed_opening_hours_are_rejected_at_entry() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Himalayan Java");
        payload["opening_hours"] = json!({"monday": "open all day"});

        let res = app.post_with_token(routes::CAFES, &payload, &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn overnight_opening_hours_are_rejected_at_entry() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Night Owl");
        payload["opening_hours"] = json!({"friday": "10:00 PM - 2:00 AM"});

        let res = app.post_with_token(routes::CAFES, &payload, &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("overnight"));
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Nowhere");
        payload["lat"] = json!(91.0);

        let res = app.post_with_token(routes::CAFES, &payload, &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_price_range_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Overpriced");
        payload["price_range"] = json!("€€€");

        let res = app.post_with_token(routes::CAFES, &payload, &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn filters_by_name_substring_case_insensitively() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_cafe(&admin, &cafe_payload("Himalayan Java")).await;
        app.create_cafe(&admin, &cafe_payload("Lalitpur Beans")).await;

        let res = app
            .get_without_token(&format!("{}?search=JAVA", routes::CAFES))
            .await;

        assert_eq!(res.status, 200);
        let cafes = res.body.as_array().unwrap();
        assert_eq!(cafes.len(), 1);
        assert_eq!(cafes[0]["name"], "Himalayan Java");
    }

    #[tokio::test]
    async fn filters_by_city_and_price_range() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut in_thamel = cafe_payload("Thamel Roasters");
        in_thamel["city"] = json!("Kathmandu");
        in_thamel["price_range"] = json!("₹₹");
        app.create_cafe(&admin, &in_thamel).await;
        app.create_cafe(&admin, &cafe_payload("Lalitpur Beans")).await;

        let res = app
            .get_without_token(&format!("{}?city=kath", routes::CAFES))
            .await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);

        let res = app
            .get_without_token(&format!("{}?price_range=₹₹", routes::CAFES))
            .await;
        let cafes = res.body.as_array().unwrap();
        assert_eq!(cafes.len(), 1);
        assert_eq!(cafes[0]["name"], "Thamel Roasters");
    }

    #[tokio::test]
    async fn filters_by_amenity_membership() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut with_wifi = cafe_payload("Wired Cafe");
        with_wifi["amenities"] = json!(["wifi", "power outlets"]);
        app.create_cafe(&admin, &with_wifi).await;
        app.create_cafe(&admin, &cafe_payload("Unplugged Cafe")).await;

        let res = app
            .get_without_token(&format!("{}?amenity=wifi", routes::CAFES))
            .await;

        let cafes = res.body.as_array().unwrap();
        assert_eq!(cafes.len(), 1);
        assert_eq!(cafes[0]["name"], "Wired Cafe");
    }

    #[tokio::test]
    async fn proximity_filter_attaches_distance_and_drops_far_cafes() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        // Patan, ~600 m from the query point.
        let mut near = cafe_payload("Patan Espresso");
        near["lat"] = json!(27.6727);
        near["lng"] = json!(85.3250);
        app.create_cafe(&admin, &near).await;

        // Bhaktapur, ~10 km away.
        let mut far = cafe_payload("Bhaktapur Brews");
        far["lat"] = json!(27.6710);
        far["lng"] = json!(85.4298);
        app.create_cafe(&admin, &far).await;

        let res = app
            .get_without_token(&format!(
                "{}?lat=27.6780&lng=85.3240&radius_km=2",
                routes::CAFES
            ))
            .await;

        assert_eq!(res.status, 200);
        let cafes = res.body.as_array().unwrap();
        assert_eq!(cafes.len(), 1);
        assert_eq!(cafes[0]["name"], "Patan Espresso");
        let distance = cafes[0]["distance_km"].as_f64().unwrap();
        assert!(distance < 2.0, "got {distance}");
        assert!(cafes[0]["distance_text"].is_string());
    }

    #[tokio::test]
    async fn partial_proximity_parameters_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?lat=27.7", routes::CAFES))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn orders_by_average_rating_descending() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let low = app.create_cafe(&admin, &cafe_payload("Mediocre Cafe")).await;
        let high = app.create_cafe(&admin, &cafe_payload("Stellar Cafe")).await;

        let rater = app.register_user("Asha", "asha@example.com").await;
        let res = app
            .post_with_token(
                routes::REVIEWS,
                &json!({"cafe_id": high, "rating": 5, "comment": "Superb"}),
                &rater,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let rater2 = app.register_user("Bikram", "bikram@example.com").await;
        let res = app
            .post_with_token(
                routes::REVIEWS,
                &json!({"cafe_id": low, "rating": 2, "comment": "Meh"}),
                &rater2,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.get_without_token(routes::CAFES).await;
        let cafes = res.body.as_array().unwrap();
        assert_eq!(cafes[0]["name"], "Stellar Cafe");
        assert_eq!(cafes[1]["name"], "Mediocre Cafe");
    }
}

mod update_and_delete {
    use super::*;

    #[tokio::test]
    async fn patch_changes_only_provided_fields() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_cafe(&admin, &cafe_payload("Old Name")).await;

        let res = app
            .patch_with_token(&routes::cafe(id), &json!({"name": "New Name"}), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "New Name");
        assert_eq!(res.body["address"]["city"], "Lalitpur");
    }

    #[tokio::test]
    async fn patch_can_clear_opening_hours_with_null() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let mut payload = cafe_payload("Himalayan Java");
        payload["opening_hours"] = json!({"monday": "7:00 AM - 9:00 PM"});
        let id = app.create_cafe(&admin, &payload).await;

        let res = app
            .patch_with_token(&routes::cafe(id), &json!({"opening_hours": null}), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["opening_hours"].is_null());
        assert!(res.body["open_now"].is_null());
    }

    #[tokio::test]
    async fn empty_patch_returns_the_unchanged_cafe() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_cafe(&admin, &cafe_payload("Himalayan Java")).await;

        let res = app.patch_with_token(&routes::cafe(id), &json!({}), &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Himalayan Java");
    }

    #[tokio::test]
    async fn delete_removes_the_cafe_and_its_reviews() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_cafe(&admin, &cafe_payload("Doomed Cafe")).await;

        let rater = app.register_user("Asha", "asha@example.com").await;
        let res = app
            .post_with_token(
                routes::REVIEWS,
                &json!({"cafe_id": id, "rating": 4, "comment": "Shame it's closing"}),
                &rater,
            )
            .await;
        assert_eq!(res.status, 201);

        let res = app.delete_with_token(&routes::cafe(id), &admin).await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(&routes::cafe(id)).await;
        assert_eq!(res.status, 404);

        let res = app.get_without_token(&routes::cafe_reviews(id)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn updating_a_missing_cafe_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .patch_with_token(&routes::cafe(9999), &json!({"name": "Ghost"}), &admin)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
