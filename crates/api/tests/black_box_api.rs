use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use taxtally_api::config::{AppConfig, StoreConfig};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build the app (same router as prod) against a fresh in-memory
        // store, bound to an ephemeral port.
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.to_string(),
            cors_origins: vec!["*".to_string()],
            store: StoreConfig::InMemory,
        };
        let app = taxtally_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sign arbitrary claims with `jwt_secret`, bypassing the server's issuer.
fn mint_token(jwt_secret: &str, user_id: &str, issued_at: i64, expires_at: i64) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": user_id, "iat": issued_at, "exp": expires_at }),
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({ "name": name, "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

/// Register and return the session token plus the public user object.
async fn register_ok(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> (String, serde_json::Value) {
    let res = register(client, base_url, name, email, password).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (token, body["user"].clone())
}

#[tokio::test]
async fn health_route_needs_no_token() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    // Served both with and without the trailing slash.
    for url in [srv.base_url.clone(), format!("{}/", srv.base_url)] {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "url {url}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "taxtally api");
    }
}

#[tokio::test]
async fn register_returns_a_token_and_the_public_user() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, user) = register_ok(
        &client,
        &srv.base_url,
        "Ada",
        "ada@example.com",
        "hunter22",
    )
    .await;

    assert!(!token.is_empty());
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["email"], "ada@example.com");
    assert!(user["id"].as_str().is_some());
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    // The token works immediately against /auth/me.
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["email"], "ada@example.com");
}

#[tokio::test]
async fn duplicate_email_registration_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;

    let res = register(&client, &srv.base_url, "Eve", "ada@example.com", "other-pass").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "email already registered");
}

#[tokio::test]
async fn login_checks_credentials() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;

    // Correct credentials yield a working session.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ada@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // A wrong password and an unknown email fail identically.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "invalid email or password");

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "nobody@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "invalid email or password");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    for path in ["/auth/me", "/calculations", "/reminders"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path {path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "not authenticated");
    }

    // A non-bearer authorization header is rejected the same way.
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .header("authorization", "Basic abc123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "not authenticated");
}

#[tokio::test]
async fn bad_tokens_are_rejected_with_specific_messages() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (_, user) = register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;
    let user_id = user["id"].as_str().unwrap();
    let now = Utc::now();

    // Expired token, correctly signed.
    let expired = mint_token(
        jwt_secret,
        user_id,
        (now - ChronoDuration::days(8)).timestamp(),
        (now - ChronoDuration::days(1)).timestamp(),
    );
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "token expired");

    // Token signed with a different secret.
    let forged = mint_token(
        "another-secret",
        user_id,
        now.timestamp(),
        (now + ChronoDuration::days(7)).timestamp(),
    );
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "invalid token");

    // Correctly signed token whose subject is not a stored user.
    let ghost = mint_token(
        jwt_secret,
        &uuid::Uuid::now_v7().to_string(),
        now.timestamp(),
        (now + ChronoDuration::days(7)).timestamp(),
    );
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&ghost)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "user not found");
}

#[tokio::test]
async fn calculation_lifecycle_create_list_delete() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, _) = register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;

    let inputs = json!({ "income": 82000, "filing_status": "single" });
    let results = json!({ "tax_owed": 13456.5, "effective_rate": 0.164 });

    let res = client
        .post(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "calc_type": "income_tax", "inputs": inputs, "results": results }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: serde_json::Value = res.json().await.unwrap();
    assert_eq!(first["calc_type"], "income_tax");
    assert_eq!(first["inputs"], inputs);
    assert_eq!(first["results"], results);
    assert!(first["created_at"].as_str().is_some());
    assert!(first.get("owner_id").is_none());
    let first_id = first["id"].as_str().unwrap().to_string();

    // A later calculation must list before the earlier one.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let res = client
        .post(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "calc_type": "quarterly_estimate",
            "inputs": { "quarter": 3 },
            "results": { "payment": 2100 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let second: serde_json::Value = res.json().await.unwrap();
    let second_id = second["id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"].as_str().unwrap(), second_id);
    assert_eq!(listed[1]["id"].as_str().unwrap(), first_id);

    // Delete, then confirm both the body and the shrunken list.
    let res = client
        .delete(format!("{}/calculations/{}", srv.base_url, first_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "deleted");

    let res = client
        .get(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), second_id);

    // Deleting twice, or with an unparseable id, is the same 404.
    let res = client
        .delete(format!("{}/calculations/{}", srv.base_url, first_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "calculation not found");

    let res = client
        .delete(format!("{}/calculations/not-a-uuid", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reminder_lifecycle_with_partial_updates() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, _) = register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;

    let res = client
        .post(format!("{}/reminders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Q3 estimated payment",
            "description": "Pay the third estimated installment",
            "due_date": "2026-09-15",
            "category": "estimated_tax"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["completed"], false);
    assert_eq!(created["due_date"], "2026-09-15");
    assert!(created.get("owner_id").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    // Updating one field leaves the rest untouched.
    let res = client
        .put(format!("{}/reminders/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "Q3 estimated payment");
    assert_eq!(updated["due_date"], "2026-09-15");
    assert_eq!(updated["category"], "estimated_tax");

    // An empty update body is a validation error, not a no-op.
    let res = client
        .put(format!("{}/reminders/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "no fields to update");

    // Updating a reminder that does not exist is a 404.
    let res = client
        .put(format!(
            "{}/reminders/{}",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .bearer_auth(&token)
        .json(&json!({ "title": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "reminder not found");

    let res = client
        .delete(format!("{}/reminders/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "deleted");

    let res = client
        .delete(format!("{}/reminders/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reminders_list_soonest_due_first() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, _) = register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;

    for due_date in ["2026-09-15", "2026-01-31", "2026-04-15"] {
        let res = client
            .post(format!("{}/reminders", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "title": format!("due {due_date}"),
                "description": "deadline",
                "due_date": due_date,
                "category": "filing"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(format!("{}/reminders", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    let dates: Vec<&str> = listed
        .iter()
        .map(|reminder| reminder["due_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-01-31", "2026-04-15", "2026-09-15"]);
}

#[tokio::test]
async fn users_cannot_see_or_touch_each_others_records() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token_a, _) = register_ok(&client, &srv.base_url, "Ada", "ada@example.com", "hunter22").await;
    let (token_b, _) = register_ok(&client, &srv.base_url, "Bob", "bob@example.com", "hunter23").await;

    let res = client
        .post(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token_a)
        .json(&json!({ "calc_type": "income_tax", "inputs": {}, "results": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let calc: serde_json::Value = res.json().await.unwrap();
    let calc_id = calc["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/reminders", srv.base_url))
        .bearer_auth(&token_a)
        .json(&json!({
            "title": "File return",
            "description": "Annual filing",
            "due_date": "2026-04-15",
            "category": "filing"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reminder: serde_json::Value = res.json().await.unwrap();
    let reminder_id = reminder["id"].as_str().unwrap().to_string();

    // The other user's lists stay empty.
    let res = client
        .get(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(listed.is_empty());

    let res = client
        .get(format!("{}/reminders", srv.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(listed.is_empty());

    // Writes against another user's records read as misses.
    let res = client
        .delete(format!("{}/calculations/{}", srv.base_url, calc_id))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .put(format!("{}/reminders/{}", srv.base_url, reminder_id))
        .bearer_auth(&token_b)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The records are still there, unchanged, for their owner.
    let res = client
        .get(format!("{}/calculations", srv.base_url))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), calc_id);

    let res = client
        .get(format!("{}/reminders", srv.base_url))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["completed"], false);
}
