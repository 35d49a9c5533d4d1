//! End-to-end tests of the HTTP surface.
//!
//! The router runs against the in-memory store and a model that always gives
//! the same scripted reply, so no database or network is touched.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_lib::{
    config::Config,
    web::{
        auth::{Claims, JwtKeys},
        router,
        state::AppState,
    },
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fridge_core::{InMemoryStore, LanguageModel, ModelReply, ModelRequest, PortResult};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot
use tracing::Level;

const SECRET: &str = "integration-secret";

/// A `LanguageModel` that answers every request with the same reply.
struct ScriptedModel {
    reply: ModelReply,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _request: ModelRequest) -> PortResult<ModelReply> {
        Ok(self.reply.clone())
    }
}

fn test_config() -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: None,
        log_level: Level::INFO,
        jwt_secret: SECRET.to_string(),
        recipe_api_key: None,
        recipe_api_base: None,
        recipe_model: "test-model".to_string(),
        vision_model: "test-vision".to_string(),
        model_timeout: Duration::from_secs(5),
        cors_origin: None,
    }
}

fn app_with(reply: ModelReply) -> Router {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel { reply });
    let state = AppState::new(
        Arc::new(test_config()),
        Arc::new(InMemoryStore::new()),
        model.clone(),
        model,
    );
    router(Arc::new(state))
}

fn app() -> Router {
    app_with(ModelReply::Text("Have a sandwich.".to_string()))
}

fn token(user_id: &str, email: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        name: Some(user_id.to_uppercase()),
        email: Some(email.to_string()),
        picture: None,
    };
    JwtKeys::from_secret(SECRET).sign(&claims).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn multipart_upload(token: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "fridge-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"image_file\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/fridge/load_from_image")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

//=========================================================================================
// Public routes and authentication
//=========================================================================================

#[tokio::test]
async fn welcome_is_public() {
    let app = app();
    let request = Request::builder().uri("/welcome").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Message": "Welcome to the fridge app!" }));
}

#[tokio::test]
async fn fridge_routes_require_a_valid_token() {
    let app = app();

    let anonymous = Request::builder().uri("/fridge/get").body(Body::empty()).unwrap();
    let (status, body) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let forged = JwtKeys::from_secret("other-secret")
        .sign(&Claims {
            sub: "mallory".into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            name: None,
            email: None,
            picture: None,
        })
        .unwrap();
    let (status, _) = send(&app, get("/fridge/get", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//=========================================================================================
// Inventory
//=========================================================================================

#[tokio::test]
async fn add_remove_and_update_flow() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "egg", "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "5 egg(s) added to the fridge.");
    assert_eq!(body["all_items"][0]["quantity"], 5);

    let (status, body) = send(
        &app,
        json_request(Method::DELETE, "/fridge/remove", &alice, json!({ "name": "egg", "quantity": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("egg"));

    let (status, body) = send(
        &app,
        json_request(Method::DELETE, "/fridge/remove", &alice, json!({ "name": "egg", "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Decremented egg by 2.");
    assert_eq!(body["all_items"][0]["quantity"], 3);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/fridge/update_quantity",
            &alice,
            json!({ "name": "egg", "quantity": 12 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "egg quantity updated to 12.");

    let (status, body) = send(
        &app,
        json_request(
            Method::DELETE,
            "/fridge/remove",
            &alice,
            json!({ "name": "egg", "quantity": 1_000_000_000 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "egg completely removed.");
    assert_eq!(body["all_items"], json!([]));

    let (status, body) = send(
        &app,
        json_request(Method::DELETE, "/fridge/remove", &alice, json!({ "name": "egg", "all": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item not found in the fridge.");
}

#[tokio::test]
async fn non_positive_add_is_rejected() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "egg", "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fridges_are_isolated_per_user() {
    let app = app();
    let alice = token("alice", "alice@example.com");
    let bob = token("bob", "bob@example.com");

    send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "milk", "quantity": 3 })),
    )
    .await;

    let (status, body) = send(&app, get("/fridge/get", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, get("/fridge/get", &alice)).await;
    assert_eq!(body[0]["name"], "milk");
}

#[tokio::test]
async fn suggestions_need_a_non_empty_fridge() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, _) = send(&app, get("/fridge/suggestions", &alice)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "leek", "quantity": 1 })),
    )
    .await;
    let (status, body) = send(&app, get("/fridge/suggestions", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["suggestions"],
        json!(["How about making something with leek?"])
    );
}

//=========================================================================================
// Recipe generation and image extraction
//=========================================================================================

#[tokio::test]
async fn generation_on_an_empty_fridge_is_a_client_error() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, body) = send(&app, get("/fridge/generate_recipes", &alice)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "The fridge is empty! Please add some ingredients first."
    );
}

#[tokio::test]
async fn structured_reply_becomes_three_recipes() {
    let recipe = |name: &str| json!({ "name": name, "ingredients": "2 eggs, 1 leek", "steps": "1. Cook." });
    let arguments = json!({
        "recipe1": recipe("Leek Omelette"),
        "recipe2": recipe("Leek Soup"),
        "recipe3": recipe("Leek Tart"),
    })
    .to_string();
    let app = app_with(ModelReply::FunctionCall {
        name: "create_recipe_list".to_string(),
        arguments,
    });
    let alice = token("alice", "alice@example.com");
    send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "leek", "quantity": 2 })),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/fridge/generate_recipes",
            &alice,
            json!({ "preferences": { "isVegan": true, "cuisines": ["French"] } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe1"]["name"], "Leek Omelette");
    assert_eq!(body["recipe3"]["ingredients"], json!(["2 eggs", "1 leek"]));
}

#[tokio::test]
async fn free_text_reply_is_returned_as_fallback() {
    let app = app();
    let alice = token("alice", "alice@example.com");
    send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "bread", "quantity": 1 })),
    )
    .await;

    let (status, body) = send(&app, get("/fridge/generate_recipes", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "fallback_content": "Have a sandwich." }));
}

#[tokio::test]
async fn malformed_arguments_are_returned_verbatim() {
    let app = app_with(ModelReply::FunctionCall {
        name: "create_recipe_list".to_string(),
        arguments: "{\"recipe1\": ".to_string(),
    });
    let alice = token("alice", "alice@example.com");
    send(
        &app,
        json_request(Method::POST, "/fridge/add", &alice, json!({ "name": "rice", "quantity": 1 })),
    )
    .await;

    let (status, body) = send(&app, get("/fridge/generate_recipes", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["raw_arguments"], "{\"recipe1\": ");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn uploaded_photo_yields_ingredients() {
    let arguments = json!({ "ingredients": [{ "name": "tomato", "quantity": "3 whole" }] }).to_string();
    let app = app_with(ModelReply::FunctionCall {
        name: "extract_ingredients".to_string(),
        arguments,
    });
    let alice = token("alice", "alice@example.com");

    let request = multipart_upload(&alice, "fridge.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "ingredients": [{ "name": "tomato", "quantity": "3 whole" }] })
    );
}

#[tokio::test]
async fn bad_uploads_are_rejected_before_the_model() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, body) = send(&app, multipart_upload(&alice, "notes.txt", "text/plain", b"hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Unsupported file format"));

    let (status, body) = send(&app, multipart_upload(&alice, "empty.png", "image/png", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No image data received.");
}

//=========================================================================================
// Favorites, profile and friends
//=========================================================================================

#[tokio::test]
async fn favoriting_the_same_title_twice_keeps_one_entry() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    for description in ["first", "second"] {
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/recipes/favorite",
                &alice,
                json!({ "title": "Soup", "description": description, "isFavorited": true }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Added Soup to favorites");
    }

    let (_, body) = send(&app, get("/fridge/get_favorite_recipes", &alice)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["description"], "second");

    let remove = || {
        json_request(
            Method::POST,
            "/fridge/remove_favorite_recipe",
            &alice,
            json!({ "title": "Soup" }),
        )
    };
    let (status, _) = send(&app, remove()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, remove()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Recipe not found");
}

#[tokio::test]
async fn friends_can_read_each_others_favorites() {
    let app = app();
    let alice = token("alice", "alice@example.com");
    let bob = token("bob", "bob@example.com");

    // Profiles are created on the first picture update.
    for (who, url) in [(&alice, "https://img/a.png"), (&bob, "https://img/b.png")] {
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/user/update-profile-picture",
                who,
                json!({ "picture_url": url }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (status, body) = send(&app, get("/user/profile", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["picture"], "https://img/b.png");

    send(
        &app,
        json_request(
            Method::POST,
            "/recipes/favorite",
            &bob,
            json!({ "title": "Tacos", "description": "spicy", "isFavorited": true }),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/user/add_friend", &alice, json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "bob");

    let (_, friends) = send(&app, get("/user/friends", &bob)).await;
    assert_eq!(friends[0]["id"], "alice");

    let (status, favorites) = send(&app, get("/user/friend_favorites?friend_id=bob", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(favorites[0]["title"], "Tacos");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/user/remove_friend?friend_id=bob")
        .header(header::AUTHORIZATION, format!("Bearer {alice}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Friend removed");

    let (_, friends) = send(&app, get("/user/friends", &alice)).await;
    assert_eq!(friends, json!([]));
}

#[tokio::test]
async fn adding_an_unknown_or_malformed_email_fails() {
    let app = app();
    let alice = token("alice", "alice@example.com");

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/user/add_friend", &alice, json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/user/add_friend", &alice, json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
