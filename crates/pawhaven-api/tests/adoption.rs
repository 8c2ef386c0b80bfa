mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, User, app};

async fn rehome(app: &TestApp, owner: &User, name: &str) -> Value {
    let (status, body) = app
        .post(
            "/adoption_reqs",
            &owner.token,
            json!({
                "description": "Needs a garden",
                "pet": { "name": name, "species": "Dog", "age": 18, "size": "medium" },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn request_creates_pet_chat_and_award() {
    let app = app();
    let owner = app.user("owner").await;
    let req = rehome(&app, &owner, "Biscuit").await;

    assert_eq!(req["status"], "Pending");
    assert_eq!(req["requester_id"], owner.id.as_str());
    assert_eq!(req["pet"]["owner_id"], owner.id.as_str());
    assert_eq!(req["pet"]["is_adopted"], false);
    let chat_id = req["chat_id"].as_str().expect("linked chat");

    let (status, chat) = app.get(&format!("/chats/{chat_id}"), &owner.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["chat_type"], "adoption");
    assert_eq!(chat["related_entity_id"], req["id"]);
    assert_eq!(chat["members"], json!([owner.id]));

    let (status, by_chat) = app
        .get(&format!("/adoption_reqs/by-chat/{chat_id}"), &owner.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_chat["id"], req["id"]);

    let score = app.score(&owner).await;
    assert_eq!(score["score"], 10);
    assert_eq!(score["adoptions"], 1);
}

#[tokio::test]
async fn listings_split_mine_and_open() {
    let app = app();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    rehome(&app, &alice, "Rex").await;
    rehome(&app, &bob, "Tom").await;

    let (_, mine) = app.get("/adoption_reqs/mine", &alice.token).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["pet"]["name"], "Rex");

    let (_, open) = app.get("/adoption_reqs/all", &alice.token).await;
    assert_eq!(open.as_array().map(Vec::len), Some(1));
    assert_eq!(open[0]["pet"]["name"], "Tom");
}

#[tokio::test]
async fn approval_adopts_pet_and_awards_chat_once() {
    let app = app();
    let owner = app.user("owner").await;
    let adopter = app.user("adopter").await;
    let req = rehome(&app, &owner, "Biscuit").await;
    let id = req["id"].as_str().expect("id");
    let chat_id = req["chat_id"].as_str().expect("chat");

    let (status, _) = app
        .call(Method::POST, &format!("/chats/{chat_id}/join"), Some(&adopter.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    for text in ["Hi!", "Is he good with cats?"] {
        let (status, _) = app
            .post(&format!("/chats/{chat_id}/messages"), &adopter.token, json!({ "content": text }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    app.post(&format!("/chats/{chat_id}/messages"), &owner.token, json!({ "content": "Yes" }))
        .await;

    // Only the pet owner moves the status.
    let (status, _) = app
        .put(&format!("/adoption_reqs/{id}"), &adopter.token, json!({ "status": "Approved" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&format!("/adoption_reqs/{id}"), &owner.token, json!({ "status": "Maybe" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(&format!("/adoption_reqs/{id}"), &owner.token, json!({ "status": "Approved" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Approved");
    assert_eq!(updated["pet"]["is_adopted"], true);

    let adopter_score = app.score(&adopter).await;
    assert_eq!(adopter_score["score"], 2);
    assert_eq!(adopter_score["adoptions"], 1);
    let owner_score = app.score(&owner).await;
    assert_eq!(owner_score["score"], 11);
    assert_eq!(owner_score["adoptions"], 2);

    // Completing an already adopted pet does not pay out again.
    let (status, _) = app
        .put(&format!("/adoption_reqs/{id}"), &owner.token, json!({ "status": "Completed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.score(&adopter).await["score"], 2);

    let (_, stats) = app.call(Method::GET, "/api/stats", None, None).await;
    assert_eq!(stats["adoptions"], 1);

    // Adopted pets leave the open list.
    let (_, open) = app.get("/adoption_reqs/all", &adopter.token).await;
    assert_eq!(open, json!([]));
}

#[tokio::test]
async fn description_belongs_to_requester() {
    let app = app();
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let req = rehome(&app, &owner, "Biscuit").await;
    let id = req["id"].as_str().expect("id");

    let (status, _) = app
        .put(&format!("/adoption_reqs/{id}"), &other.token, json!({ "description": "mine now" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/adoption_reqs/{id}"), &owner.token, json!({ "description": "Loves walks" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Loves walks");
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn delete_needs_requester_or_owner() {
    let app = app();
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let req = rehome(&app, &owner, "Biscuit").await;
    let id = req["id"].as_str().expect("id");

    let (status, _) = app.delete(&format!("/adoption_reqs/{id}"), &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/adoption_reqs/{id}"), &owner.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/adoption_reqs/{id}"), &owner.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pets_are_private_to_their_owner() {
    let app = app();
    let owner = app.user("owner").await;
    let other = app.user("other").await;

    let (status, pet) = app
        .post("/pets", &owner.token, json!({ "name": "Mittens", "species": "Cat" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pet["gender"], "Unknown");
    let id = pet["pet_id"].as_str().expect("pet id");

    let (status, _) = app.get(&format!("/pets/{id}"), &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .put(&format!("/pets/{id}"), &owner.token, json!({ "age": 7, "images": ["a.jpg"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["age"], 7);
    assert_eq!(updated["images"], json!(["a.jpg"]));
    assert_eq!(updated["name"], "Mittens");

    let (status, adopted) = app
        .call(Method::PUT, &format!("/pets/{id}/adopt"), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(adopted["is_adopted"], true);

    let (_, list) = app.get("/pets", &owner.token).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = app.delete(&format!("/pets/{id}"), &owner.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = app.get("/pets", &owner.token).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn recommendations_follow_preferences() {
    let app = app();
    let seeker = app
        .user_with_email(
            "seeker@example.com",
            json!({ "preferred_species": "cat", "preferred_size": "small" }),
        )
        .await;
    let shelter = app.user("shelter").await;
    for (name, species, size) in [("Rex", "Dog", "large"), ("Tiny", "Cat", "small"), ("Bo", "Dog", "small")] {
        let (status, _) = app
            .post("/pets", &shelter.token, json!({ "name": name, "species": species, "size": size }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    // The seeker's own pet is never suggested.
    app.post("/pets", &seeker.token, json!({ "name": "Own", "species": "Cat", "size": "small" }))
        .await;

    let (status, body) = app.get("/recommend?top_k=2", &seeker.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], seeker.id.as_str());
    let names: Vec<_> = body["recommendations"]
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Tiny".to_string(), "Bo".to_string()]);

    let (status, _) = app.get("/recommend?top_k=0", &seeker.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/recommend?top_k=51", &seeker.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
