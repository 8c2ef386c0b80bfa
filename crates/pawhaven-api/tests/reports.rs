mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, User, app};

async fn rescue(app: &TestApp, user: &User, lat: f64, lon: f64) -> Value {
    let (status, body) = app
        .post(
            "/rescue-rep",
            &user.token,
            json!({
                "location": "Harbour Rd",
                "latitude": lat,
                "longitude": lon,
                "description": "Injured dog",
                "alert_type": "High",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn rescue_report_lifecycle() {
    let app = app();
    let reporter = app.user("reporter").await;
    let helper = app.user("helper").await;
    let report = rescue(&app, &reporter, 6.93, 79.86).await;

    assert_eq!(report["status"], "Pending");
    assert_eq!(report["userFullName"], "Test User");
    let id = report["reportId"].as_str().expect("id");
    let chat_id = report["chatId"].as_str().expect("chat");
    assert_eq!(app.score(&reporter).await["rescues"], 1);
    assert_eq!(app.score(&reporter).await["score"], 10);

    let (status, found) = app.get(&format!("/rescue-rep/by-chat/{chat_id}"), &helper.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["reportId"], id);

    app.call(Method::POST, &format!("/chats/{chat_id}/join"), Some(&helper.token), None)
        .await;
    let (status, _) = app
        .post(&format!("/chats/{chat_id}/messages"), &helper.token, json!({ "content": "On my way" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put(&format!("/rescue-rep/{id}"), &helper.token, json!({ "status": "Resolved" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resolved) = app
        .put(&format!("/rescue-rep/{id}"), &reporter.token, json!({ "status": "Resolved" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "Resolved");
    assert_eq!(resolved["description"], "Injured dog");

    let helper_score = app.score(&helper).await;
    assert_eq!(helper_score["score"], 2);
    assert_eq!(helper_score["rescues"], 0);

    // Re-saving a resolved report pays nothing more.
    app.put(&format!("/rescue-rep/{id}"), &reporter.token, json!({ "status": "Resolved" }))
        .await;
    assert_eq!(app.score(&helper).await["score"], 2);

    let (_, stats) = app.call(Method::GET, "/api/stats", None, None).await;
    assert_eq!(stats["rescues"], 1);

    let (status, _) = app.delete(&format!("/rescue-rep/{id}"), &helper.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/rescue-rep/{id}"), &reporter.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/rescue-rep/{id}"), &reporter.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_resolves_award_the_chat_once() {
    let app = app();
    let reporter = app.user("reporter").await;
    let helper = app.user("helper").await;

    for _ in 0..10 {
        let report = rescue(&app, &reporter, 6.93, 79.86).await;
        let id = report["reportId"].as_str().expect("id");
        let chat_id = report["chatId"].as_str().expect("chat");
        app.call(Method::POST, &format!("/chats/{chat_id}/join"), Some(&helper.token), None)
            .await;
        app.post(&format!("/chats/{chat_id}/messages"), &helper.token, json!({ "content": "here" }))
            .await;
        let before = app.score(&helper).await["score"].as_i64().unwrap_or(0);

        let uri = format!("/rescue-rep/{id}");
        let resolve = || app.put(&uri, &reporter.token, json!({ "status": "Resolved" }));
        let (a, b, c, d) = tokio::join!(resolve(), resolve(), resolve(), resolve());
        for (status, _) in [a, b, c, d] {
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(app.score(&helper).await["score"], before + 2);
    }
}

#[tokio::test]
async fn malformed_requests_answer_with_detail() {
    let app = app();
    let user = app.user("sloppy").await;

    let (status, body) = app.get("/pets/not-a-uuid", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()), "{body}");

    let (status, body) = app
        .post(
            "/rescue-rep",
            &user.token,
            json!({ "location": "Harbour Rd", "status": "Teleported" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()), "{body}");

    let (status, body) = app
        .get("/rescue-rep/nearby?lat=north&lon=0", &user.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string(), "{body}");

    let (status, body) = app
        .form("/notifications/nearby", Some(&user.token), "latitude=somewhere")
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string(), "{body}");
}

#[tokio::test]
async fn nearby_filters_by_radius() {
    let app = app();
    let user = app.user("walker").await;
    rescue(&app, &user, 0.0, 0.0).await;
    rescue(&app, &user, 0.5, 0.5).await;

    let (status, near) = app.get("/rescue-rep/nearby?lat=0.01&lon=0.01", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(near.as_array().map(Vec::len), Some(1));

    let (_, wide) = app
        .get("/rescue-rep/nearby?lat=0.01&lon=0.01&radius_km=100", &user.token)
        .await;
    assert_eq!(wide.as_array().map(Vec::len), Some(2));

    let (status, _) = app
        .get("/rescue-rep/nearby?lat=0&lon=0&radius_km=-1", &user.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/lost-found/nearby?lat=95&lon=0", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lost_found_report_and_relink() {
    let app = app();
    let owner = app.user("owner").await;
    let other = app.user("other").await;

    let (status, report) = app
        .post(
            "/lost-found",
            &owner.token,
            json!({ "pet_name": "Milo", "location": "Park Ave", "latitude": 1.0, "longitude": 1.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["status"], "Lost");
    assert_eq!(report["gender"], "Unknown");
    let id = report["reportId"].as_str().expect("id");
    assert_eq!(app.score(&owner).await["score"], 5);
    assert_eq!(app.score(&owner).await["lost_pets"], 1);

    let (status, _) = app
        .put(&format!("/lost-found/{id}"), &other.token, json!({ "status": "Found" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(
            &format!("/lost-found/{id}"),
            &owner.token,
            json!({ "chat_id": "00000000-0000-4000-8000-000000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, chat) = app
        .post("/chats", &owner.token, json!({ "chat_type": "generic" }))
        .await;
    let (status, updated) = app
        .put(
            &format!("/lost-found/{id}"),
            &owner.token,
            json!({ "chat_id": chat["chatId"], "status": "Reunited" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["chatId"], chat["chatId"]);
    assert_eq!(updated["status"], "Reunited");
    assert_eq!(updated["pet_name"], "Milo");

    let (_, all) = app.get("/lost-found", &other.token).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn stray_map_is_public_to_read() {
    let app = app();
    let mapper = app.user("mapper").await;
    let other = app.user("other").await;

    for (name, kind) in [("Shelter", "rescue_home"), ("Colony", "stray_animal")] {
        let (status, _) = app
            .post(
                "/stray-map",
                &mapper.token,
                json!({ "name": name, "latitude": 7.0, "longitude": 80.0, "location_type": kind }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(app.score(&mapper).await["map_contributions"], 2);
    assert_eq!(app.score(&mapper).await["score"], 20);

    let (status, all) = app.call(Method::GET, "/stray-map", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (_, strays) = app
        .call(Method::GET, "/stray-map?location_type=stray_animal", None, None)
        .await;
    assert_eq!(strays.as_array().map(Vec::len), Some(1));
    let id = strays[0]["id"].as_str().expect("id");

    let (_, stats) = app.call(Method::GET, "/api/stats", None, None).await;
    assert_eq!(stats["located"], 1);

    // Writing still needs a token.
    let (status, _) = app
        .call(Method::POST, "/stray-map", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.delete(&format!("/stray-map/{id}"), &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/stray-map/{id}"), &mapper.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, &format!("/stray-map/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Poll until the background scan has written `expected` notifications.
async fn wait_for_notifications(app: &TestApp, user: &User, expected: usize) -> Value {
    for _ in 0..50 {
        let (_, list) = app.get("/notifications", &user.token).await;
        if list.as_array().map(Vec::len) == Some(expected) {
            return list;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} notifications");
}

#[tokio::test]
async fn nearby_notifications_skip_own_and_duplicates() {
    let app = app();
    let me = app.user("me").await;
    let other = app.user("neighbour").await;
    rescue(&app, &other, 0.0, 0.0).await;
    rescue(&app, &me, 0.0, 0.0).await;
    app.post(
        "/lost-found",
        &other.token,
        json!({ "location": "Corner", "latitude": 0.01, "longitude": 0.0 }),
    )
    .await;

    let (status, _) = app
        .form("/notifications/nearby", Some(&me.token), "latitude=0.0&longitude=0.0")
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let list = wait_for_notifications(&app, &me, 2).await;
    let mut messages: Vec<_> = list
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["message"].as_str().unwrap_or_default().to_string())
        .collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "Nearby lost pet: Unknown pet at Corner".to_string(),
            "Rescue alert nearby (High) - Injured dog".to_string(),
        ]
    );

    // A second scan finds the same reports and adds nothing.
    app.form("/notifications/nearby", Some(&me.token), "latitude=0.0&longitude=0.0")
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (_, again) = app.get("/notifications", &me.token).await;
    assert_eq!(again.as_array().map(Vec::len), Some(2));

    let notif_id = list[0]["notif_id"].as_str().expect("id");
    let (status, _) = app.get(&format!("/notifications/{notif_id}"), &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, viewed) = app
        .call(Method::PATCH, &format!("/notifications/{notif_id}/viewed"), Some(&me.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["viewed"], true);
}

#[tokio::test]
async fn manual_notification_belongs_to_caller() {
    let app = app();
    let me = app.user("me").await;
    let (status, created) = app
        .post("/notifications", &me.token, json!({ "message": "Remember the vet" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], me.id.as_str());
    assert_eq!(created["viewed"], false);
    assert!(created["notif_type"].is_null());
}
