//! End-to-end API tests against the in-memory application state.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use nutricare::{
    ai::{GenerativeClient, ScriptedClient},
    app::build_app,
    auth::AuthEvent,
    state::AppState,
    storage::keys,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn sign_up(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "masala123",
            "confirm_password": "masala123",
            "agree_terms": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().unwrap().to_owned()
}

fn scripted_state() -> (Arc<ScriptedClient>, AppState) {
    let client = Arc::new(ScriptedClient::new("**Day 1**\n- **Breakfast:** Poha - 250 cal"));
    let shared: Arc<dyn GenerativeClient> = client.clone();
    (client, AppState::fake_with_ai(Some(shared)))
}

#[tokio::test]
async fn health_check() {
    let app = build_app(AppState::fake());
    let response = app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_up_validates_form_before_provider() {
    let app = build_app(AppState::fake());
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "A", "email": "a@x.in", "password": "one", "confirm_password": "two", "agree_terms": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "A", "email": "a@x.in", "password": "same1", "confirm_password": "same1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please agree to the terms and conditions");
}

#[tokio::test]
async fn sign_up_sets_display_name_and_publishes_event() {
    let state = AppState::fake();
    let mut events = state.auth_events.subscribe();
    let app = build_app(state);

    let token = sign_up(&app, "Asha", "Asha@Example.in").await;
    let (status, me) = call(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["displayName"], "Asha");
    assert_eq!(me["email"], "asha@example.in");
    assert!(me["metadata"]["creationTime"].is_string());

    match events.try_next() {
        Some(AuthEvent::SignedIn { profile }) => assert_eq!(profile.display_name.as_deref(), Some("Asha")),
        other => panic!("expected sign-in event, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_and_weak_sign_up_messages() {
    let app = build_app(AppState::fake());
    sign_up(&app, "Ravi", "ravi@example.in").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "Ravi", "email": "ravi@example.in", "password": "masala123", "confirm_password": "masala123", "agree_terms": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This email is already registered. Please login instead.");

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "Z", "email": "z@example.in", "password": "abc", "confirm_password": "abc", "agree_terms": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password is too weak. Please use at least 8 characters.");
}

#[tokio::test]
async fn login_maps_provider_errors() {
    let app = build_app(AppState::fake());
    sign_up(&app, "Meera", "meera@example.in").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "meera@example.in", "password": "wrong-one"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect password.");

    let (_, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "nobody@example.in", "password": "masala123"})),
    )
    .await;
    assert_eq!(body["error"], "No account found with this email.");

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "meera@example.in", "password": "masala123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn federated_login_is_rejected_by_local_provider() {
    let app = build_app(AppState::fake());
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/federated",
        None,
        Some(json!({"id_token": "google-token"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to login with Google.");
}

#[tokio::test]
async fn refresh_issues_new_pair() {
    let app = build_app(AppState::fake());
    let (_, body) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "R", "email": "r@example.in", "password": "masala123", "confirm_password": "masala123", "agree_terms": true})),
    )
    .await;
    let refresh = body["refresh_token"].as_str().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "r@example.in");

    let access = body["access_token"].as_str().unwrap();
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_ends_provider_session() {
    let app = build_app(AppState::fake());
    let token = sign_up(&app, "L", "l@example.in").await;
    let (status, _) = call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session expired. Please log in again.");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = build_app(AppState::fake());
    for uri in ["/api/v1/me", "/api/v1/pantry", "/api/v1/meal-plans", "/api/v1/dashboard"] {
        let (status, _) = call(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let (status, _) = call(&app, "GET", "/api/v1/dishes", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn account_profile_and_password() {
    let app = build_app(AppState::fake());
    let token = sign_up(&app, "Old", "acct@example.in").await;

    let (status, body) = call(
        &app,
        "PUT",
        "/api/v1/account/profile",
        Some(&token),
        Some(json!({"display_name": "New Name"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully!");
    assert_eq!(body["user"]["displayName"], "New Name");

    let (status, body) = call(
        &app,
        "PUT",
        "/api/v1/account/password",
        Some(&token),
        Some(json!({"new_password": "abcdefgh", "confirm_password": "abcdefgX"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "New passwords do not match");

    let (_, body) = call(
        &app,
        "PUT",
        "/api/v1/account/password",
        Some(&token),
        Some(json!({"new_password": "short", "confirm_password": "short"})),
    )
    .await;
    assert_eq!(body["error"], "Password must be at least 8 characters");

    let (status, body) = call(
        &app,
        "PUT",
        "/api/v1/account/password",
        Some(&token),
        Some(json!({"new_password": "newmasala1", "confirm_password": "newmasala1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully!");

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "acct@example.in", "password": "newmasala1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn pantry_crud_round_trip() {
    let app = build_app(AppState::fake());
    let token = sign_up(&app, "P", "p@example.in").await;

    let (_, items) = call(&app, "GET", "/api/v1/pantry", Some(&token), None).await;
    assert_eq!(items.as_array().unwrap().len(), 8);

    let (_, spices) = call(&app, "GET", "/api/v1/pantry?category=Spices", Some(&token), None).await;
    assert_eq!(spices.as_array().unwrap().len(), 2);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/pantry",
        Some(&token),
        Some(json!({"name": "", "quantity": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, added) = call(
        &app,
        "POST",
        "/api/v1/pantry",
        Some(&token),
        Some(json!({"name": "Jaggery", "category": "Other", "quantity": 1.0, "unit": "kg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["lowStock"], false);
    let id = added["id"].as_str().unwrap().to_owned();

    let (_, updated) = call(
        &app,
        "PATCH",
        &format!("/api/v1/pantry/{id}/quantity"),
        Some(&token),
        Some(json!({"delta": -5.0})),
    )
    .await;
    assert_eq!(updated["quantity"], 0.0);
    assert_eq!(updated["lowStock"], false);

    let (_, low) = call(&app, "GET", "/api/v1/pantry/low-stock", Some(&token), None).await;
    assert_eq!(low.as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/pantry/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "DELETE", &format!("/api/v1/pantry/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, items) = call(&app, "GET", "/api/v1/pantry", Some(&token), None).await;
    assert_eq!(items.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn generated_plans_keep_one_active() {
    let (client, state) = scripted_state();
    let app = build_app(state);
    let token = sign_up(&app, "G", "g@example.in").await;

    let (status, first) = call(
        &app,
        "POST",
        "/api/v1/meal-plans/generate",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["name"], "Weight loss Plan");
    assert_eq!(first["isActive"], true);
    assert_eq!(first["calorieTarget"], "1800");
    assert!(first["plan"].as_str().unwrap().contains("Poha"));

    // No saved pantry yet, so no pantry block in the prompt.
    let prompt = client.calls()[0].input.clone();
    assert!(!prompt.contains("User's Pantry Items"));
    assert!(prompt.contains("Dietary Preference: vegetarian"));

    let (_, second) = call(
        &app,
        "POST",
        "/api/v1/meal-plans/generate",
        Some(&token),
        Some(json!({"goal": "muscle-gain", "days": "3"})),
    )
    .await;
    assert_eq!(second["isActive"], false);
    assert_eq!(second["name"], "Muscle gain Plan");

    let second_id = second["id"].as_str().unwrap();
    let (_, plans) = call(
        &app,
        "POST",
        &format!("/api/v1/meal-plans/{second_id}/activate"),
        Some(&token),
        None,
    )
    .await;
    let active: Vec<_> = plans
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["isActive"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], second["id"]);

    let (_, current) = call(&app, "GET", "/api/v1/meal-plans/active", Some(&token), None).await;
    assert_eq!(current["id"], second["id"]);

    let (_, edited) = call(
        &app,
        "PUT",
        &format!("/api/v1/meal-plans/{second_id}"),
        Some(&token),
        Some(json!({"name": "Bulk", "plan": "edited"})),
    )
    .await;
    assert_eq!(edited["name"], "Bulk");
    assert_eq!(edited["plan"], "edited");

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/api/v1/meal-plans/{second_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/api/v1/meal-plans/active", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn saved_pantry_feeds_generation_prompt() {
    let (client, state) = scripted_state();
    let app = build_app(state);
    let token = sign_up(&app, "Q", "q@example.in").await;

    call(
        &app,
        "POST",
        "/api/v1/pantry",
        Some(&token),
        Some(json!({"name": "Moringa", "quantity": 2.0})),
    )
    .await;
    call(
        &app,
        "POST",
        "/api/v1/meal-plans/generate",
        Some(&token),
        Some(json!({"dietaryPreference": "vegan"})),
    )
    .await;

    let prompt = client.calls()[0].input.clone();
    assert!(prompt.contains("User's Pantry Items: Basmati Rice, Toor Dal"));
    assert!(prompt.contains("Moringa\nPrioritize dishes that use these pantry items when possible."));
}

#[tokio::test]
async fn generation_without_key_stores_nothing() {
    let app = build_app(AppState::fake_with_ai(None));
    let token = sign_up(&app, "N", "n@example.in").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/meal-plans/generate",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Error: Gemini API key not configured");

    let (_, plans) = call(&app, "GET", "/api/v1/meal-plans", Some(&token), None).await;
    assert!(plans.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn legacy_plan_is_migrated_on_list() {
    let state = AppState::fake();
    let app = build_app(state.clone());
    let token = sign_up(&app, "M", "m@example.in").await;
    let (_, me) = call(&app, "GET", "/api/v1/me", Some(&token), None).await;
    let uid = me["uid"].as_str().unwrap();

    let store = state.user_store(uid);
    store
        .set_raw(
            keys::LEGACY_SAVED_MEAL_PLAN,
            json!({"generatedDate": "1/10/2025", "days": "7", "goal": "weight-loss", "calorieTarget": "1800", "plan": "old plan"})
                .to_string(),
        )
        .await
        .unwrap();

    let (_, plans) = call(&app, "GET", "/api/v1/meal-plans", Some(&token), None).await;
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["name"], "weight-loss Plan");
    assert_eq!(plans[0]["isActive"], true);
    assert!(store.get_raw(keys::LEGACY_SAVED_MEAL_PLAN).await.unwrap().is_none());
}

#[tokio::test]
async fn meal_handoff_and_logging() {
    let app = build_app(AppState::fake());
    let token = sign_up(&app, "Kavita", "k@example.in").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/meal-plans/log-meal",
        Some(&token),
        Some(json!({"mealName": "Poha"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, pending) = call(&app, "GET", "/api/v1/meal-log/pending", Some(&token), None).await;
    assert_eq!(pending["mealName"], "Poha");
    assert_eq!(pending["dish"]["name"], "Poha");
    let dish_id = pending["dish"]["id"].as_str().unwrap().to_owned();
    let calories = pending["dish"]["calories"].as_f64().unwrap();

    let (_, again) = call(&app, "GET", "/api/v1/meal-log/pending", Some(&token), None).await;
    assert!(again["mealName"].is_null());

    let (status, entry) = call(
        &app,
        "POST",
        "/api/v1/meal-log",
        Some(&token),
        Some(json!({"dishId": dish_id, "mealType": "breakfast", "portion": 2.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["calories"].as_f64().unwrap(), calories * 2.0);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/meal-log",
        Some(&token),
        Some(json!({"dishId": "999", "mealType": "lunch"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, log) = call(&app, "GET", "/api/v1/meal-log", Some(&token), None).await;
    assert_eq!(log["totals"]["meals"], 1);

    let (_, dashboard) = call(&app, "GET", "/api/v1/dashboard", Some(&token), None).await;
    assert_eq!(dashboard["name"], "Kavita");
    assert_eq!(dashboard["mealsLogged"], 1);
    assert_eq!(dashboard["caloriesConsumed"].as_f64().unwrap(), calories * 2.0);
    assert_eq!(dashboard["lowStockCount"], 2);

    let (status, _) = call(&app, "DELETE", "/api/v1/meal-log", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, log) = call(&app, "GET", "/api/v1/meal-log", Some(&token), None).await;
    assert_eq!(log["totals"]["meals"], 0);
}

#[tokio::test]
async fn ai_query_is_routed_by_keyword() {
    let (client, state) = scripted_state();
    let app = build_app(state);
    let token = sign_up(&app, "Ai", "ai@example.in").await;

    let (status, answer) = call(
        &app,
        "POST",
        "/api/v1/ai/query",
        Some(&token),
        Some(json!({"query": "Give me a recipe for upma"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["route"], "recipe");
    assert!(client.calls()[0].input.contains("(2 servings)"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/ai/explain",
        Some(&token),
        Some(json!({"topic": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("topic"));
}

#[tokio::test]
async fn ai_without_key_degrades() {
    let app = build_app(AppState::fake_with_ai(None));
    let token = sign_up(&app, "Nk", "nk@example.in").await;

    let (status, answer) = call(
        &app,
        "POST",
        "/api/v1/ai/query",
        Some(&token),
        Some(json!({"query": "Is jaggery healthy?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["text"], "AI features require API key to be configured.");

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/ai/recipe",
        Some(&token),
        Some(json!({"dish_name": "Poha"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn public_catalog_and_news() {
    let app = build_app(AppState::fake());

    let (_, veg) = call(&app, "GET", "/api/v1/dishes?vegetarian_only=true", None, None).await;
    assert!(veg.as_array().unwrap().iter().all(|d| d["vegetarian"] == true));

    let (_, categories) = call(&app, "GET", "/api/v1/dishes/categories", None, None).await;
    assert_eq!(categories[0], "All");

    let (status, _) = call(&app, "GET", "/api/v1/dishes/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, articles) = call(&app, "GET", "/api/v1/news?search=diabetes", None, None).await;
    assert_eq!(articles.as_array().unwrap().len(), 1);
    let (_, article) = call(&app, "GET", "/api/v1/news/4", None, None).await;
    assert_eq!(article["readTime"], "6 min read");
}

#[tokio::test]
async fn logout_discards_meal_log() {
    let app = build_app(AppState::fake());
    let token = sign_up(&app, "Lata", "lata@example.in").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/meal-log",
        Some(&token),
        Some(json!({"dishId": "1", "mealType": "dinner"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "lata@example.in", "password": "masala123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap();

    let (_, log) = call(&app, "GET", "/api/v1/meal-log", Some(token), None).await;
    assert!(log["entries"].as_array().unwrap().is_empty());
    assert_eq!(log["totals"]["meals"], 0);
}
