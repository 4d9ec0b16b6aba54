//! End-to-end API tests against a server spawned on a random port with
//! a throwaway sqlite file and media directory.

use std::sync::Arc;
use std::time::Duration;

use foodgram::{get_random_free_port, init_db, make_router, run_app, AppState, Config};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

struct TestApp {
    base: String,
    client: reqwest::Client,
    pool: SqlitePool,
    // Dropped with the app, deleting the database and media files.
    _dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    let (port, addr) = get_random_free_port();
    let config = Config {
        database_url: database_url.clone(),
        bind_addr: addr,
        media_root: dir.path().join("media"),
        page_size: 6,
        ingredients_csv: None,
    };
    let pool = init_db(&database_url).await.unwrap();
    let state = Arc::new(AppState {
        pool: pool.clone(),
        config,
    });
    tokio::spawn(run_app(make_router(), addr, state));

    let client = reqwest::Client::new();
    let base = format!("http://localhost:{port}");
    for _ in 0..50 {
        if client.get(format!("{base}/check_health")).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    TestApp {
        base,
        client,
        pool,
        _dir: dir,
    }
}

impl TestApp {
    async fn register(&self, username: &str) {
        let response = self
            .client
            .post(format!("{}/api/users/", self.base))
            .json(&json!({
                "email": format!("{username}@example.com"),
                "username": username,
                "first_name": "Test",
                "last_name": "User",
                "password": "password123",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    async fn login(&self, username: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/auth/token/login/", self.base))
            .json(&json!({
                "email": format!("{username}@example.com"),
                "password": "password123",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["auth_token"].as_str().unwrap().to_string()
    }

    async fn user(&self, username: &str) -> String {
        self.register(username).await;
        self.login(username).await
    }

    async fn admin(&self, username: &str) -> String {
        self.register(username).await;
        sqlx::query("UPDATE users SET is_admin = TRUE WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .unwrap();
        self.login(username).await
    }

    async fn seed_tag(&self, name: &str, slug: &str, color: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) RETURNING id")
            .bind(name)
            .bind(slug)
            .bind(color)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn seed_ingredient(&self, name: &str, unit: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(unit)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    fn auth(&self, request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Token {token}"))
    }

    async fn create_recipe(&self, token: &str, name: &str, payload: Value) -> i64 {
        let mut body = payload;
        body["name"] = json!(name);
        let response = self
            .auth(
                self.client.post(format!("{}/api/recipes/", self.base)),
                token,
            )
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "{}", response.text().await.unwrap());
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}

fn recipe_payload(tag: i64, ingredients: Value) -> Value {
    json!({
        "text": "Нарезать и перемешать",
        "cooking_time": 10,
        "image": "data:image/png;base64,aGVsbG8=",
        "tags": [tag],
        "ingredients": ingredients,
    })
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/check_health", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let response = app
        .client
        .get(format!("{}/api/nope/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn register_login_me_logout() {
    let app = spawn_app().await;
    let token = app.user("alice").await;

    let response = app
        .auth(app.client.get(format!("{}/api/users/me/", app.base)), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["is_subscribed"], false);

    let response = app
        .auth(
            app.client
                .post(format!("{}/api/auth/token/logout/", app.base)),
            &token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // The revoked token now resolves to anonymous.
    let response = app
        .auth(app.client.get(format!("{}/api/users/me/", app.base)), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn register_collects_field_errors() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(format!("{}/api/users/", app.base))
        .json(&json!({
            "email": "not-an-email",
            "username": "bad name!",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(body[field].is_array(), "missing error for {field}: {body}");
    }
}

#[tokio::test]
async fn duplicate_registration_answers_per_field() {
    let app = spawn_app().await;
    app.register("alice").await;
    let response = app
        .client
        .post(format!("{}/api/users/", app.base))
        .json(&json!({
            "email": "alice@example.com",
            "username": "somebody-else",
            "first_name": "Test",
            "last_name": "User",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["email"].is_array());
}

#[tokio::test]
async fn login_with_bad_credentials() {
    let app = spawn_app().await;
    app.register("alice").await;
    let response = app
        .client
        .post(format!("{}/api/auth/token/login/", app.base))
        .json(&json!({"email": "alice@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unknown_token_is_anonymous() {
    let app = spawn_app().await;
    let response = app
        .auth(
            app.client.get(format!("{}/api/users/me/", app.base)),
            "deadbeef",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    // Listing endpoints still answer for the anonymous principal.
    let response = app
        .auth(
            app.client.get(format!("{}/api/recipes/", app.base)),
            "deadbeef",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn tag_creation_is_admin_only() {
    let app = spawn_app().await;
    let user = app.user("alice").await;
    let admin = app.admin("root").await;
    let payload = json!({"name": "Завтрак", "slug": "breakfast", "color": "#E6E6FA"});

    let response = app
        .client
        .post(format!("{}/api/tags/", app.base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .auth(app.client.post(format!("{}/api/tags/", app.base)), &user)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app
        .auth(app.client.post(format!("{}/api/tags/", app.base)), &admin)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["slug"], "breakfast");

    let id = body["id"].as_i64().unwrap();
    let response = app
        .client
        .get(format!("{}/api/tags/{id}/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn tag_color_without_css_name_is_rejected() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    // #000000 has no entry in the color table.
    let response = app
        .auth(app.client.post(format!("{}/api/tags/", app.base)), &admin)
        .json(&json!({"name": "Ночь", "slug": "night", "color": "#000000"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["color"].is_array());
}

#[tokio::test]
async fn ingredient_search_matches_prefix_case_insensitively() {
    let app = spawn_app().await;
    app.seed_ingredient("Молоко", "мл").await;
    app.seed_ingredient("Мука", "г").await;
    app.seed_ingredient("Сахар", "г").await;

    let response = app
        .client
        .get(format!("{}/api/ingredients/?name=мо", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Молоко"]);

    // ASCII prefixes fold case too.
    app.seed_ingredient("Salt", "г").await;
    let response = app
        .client
        .get(format!("{}/api/ingredients/?name=sa", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0]["name"], "Salt");
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .client
        .get(format!("{}/api/ingredients/999/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn recipe_create_roundtrip() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;

    let id = app
        .create_recipe(
            &token,
            "Омлет",
            recipe_payload(tag, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let response = app
        .client
        .get(format!("{}/api/recipes/{id}/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Омлет");
    assert_eq!(body["cooking_time"], 10);
    assert_eq!(body["author"]["username"], "alice");
    assert_eq!(body["tags"][0]["slug"], "lunch");
    assert_eq!(body["ingredients"][0]["amount"], 200);
    assert_eq!(body["ingredients"][0]["measurement_unit"], "мл");
    assert_eq!(body["is_favorited"], false);
    assert_eq!(body["is_in_shopping_cart"], false);
    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("/media/recipes/image/"), "{image}");
}

#[tokio::test]
async fn recipe_validation_collects_all_errors() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let response = app
        .auth(app.client.post(format!("{}/api/recipes/", app.base)), &token)
        .json(&json!({"cooking_time": 0, "tags": [], "image": "nonsense"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    for field in ["name", "text", "cooking_time", "image", "tags", "ingredients"] {
        assert!(body[field].is_array(), "missing error for {field}: {body}");
    }
}

#[tokio::test]
async fn recipe_with_unknown_edges_is_rejected() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let response = app
        .auth(app.client.post(format!("{}/api/recipes/", app.base)), &token)
        .json(&json!({
            "name": "Омлет",
            "text": "Взбить",
            "cooking_time": 5,
            "image": "data:image/png;base64,aGVsbG8=",
            "tags": [999],
            "ingredients": [{"id": 999, "amount": 1}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["tags"].is_array());
    assert!(body["ingredients"].is_array());
}

#[tokio::test]
async fn anonymous_cannot_create_recipes() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(format!("{}/api/recipes/", app.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn only_the_author_may_edit_or_delete() {
    let app = spawn_app().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let id = app
        .create_recipe(
            &alice,
            "Омлет",
            recipe_payload(tag, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let response = app
        .auth(
            app.client.patch(format!("{}/api/recipes/{id}/", app.base)),
            &bob,
        )
        .json(&json!({"name": "Чужой омлет"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // An unknown recipe is 404 even for non-authors.
    let response = app
        .auth(
            app.client.patch(format!("{}/api/recipes/999/", app.base)),
            &bob,
        )
        .json(&json!({"name": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = app
        .auth(
            app.client.patch(format!("{}/api/recipes/{id}/", app.base)),
            &alice,
        )
        .json(&json!({"name": "Омлет с сыром", "cooking_time": 15}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Омлет с сыром");
    assert_eq!(body["cooking_time"], 15);
    // Untouched fields keep their values.
    assert_eq!(body["ingredients"][0]["amount"], 200);

    let response = app
        .auth(
            app.client.delete(format!("{}/api/recipes/{id}/", app.base)),
            &bob,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let response = app
        .auth(
            app.client.delete(format!("{}/api/recipes/{id}/", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    let response = app
        .client
        .get(format!("{}/api/recipes/{id}/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn concurrent_duplicate_recipe_names_conflict() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;

    let mut payload = recipe_payload(tag, json!([{"id": milk, "amount": 200}]));
    payload["name"] = json!("Омлет");
    let submit = || {
        app.auth(
            app.client.post(format!("{}/api/recipes/", app.base)),
            &token,
        )
        .json(&payload)
        .send()
    };
    // Two identical submissions in flight at once: exactly one recipe,
    // the loser answers 400, never 500.
    let (first, second) = tokio::join!(submit(), submit());
    let mut statuses = [
        first.unwrap().status().as_u16(),
        second.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [201, 400]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn put_replaces_the_whole_recipe() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let breakfast = app.seed_tag("Завтрак", "breakfast", "#FFA500").await;
    let dinner = app.seed_tag("Ужин", "dinner", "#E6E6FA").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let sugar = app.seed_ingredient("Сахар", "г").await;
    let id = app
        .create_recipe(
            &token,
            "Каша",
            recipe_payload(breakfast, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let response = app
        .auth(
            app.client.put(format!("{}/api/recipes/{id}/", app.base)),
            &token,
        )
        .json(&json!({
            "name": "Каша сладкая",
            "text": "Сварить и посыпать",
            "cooking_time": 20,
            "image": "data:image/png;base64,aGVsbG8=",
            "tags": [dinner],
            "ingredients": [{"id": sugar, "amount": 30}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The read-back carries exactly the replacement edge sets.
    let response = app
        .client
        .get(format!("{}/api/recipes/{id}/", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Каша сладкая");
    assert_eq!(body["cooking_time"], 20);
    let tags: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(tags, ["dinner"]);
    let ingredients = body["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Сахар");
    assert_eq!(ingredients[0]["amount"], 30);

    // PUT requires every field; a missing one is a 400.
    let response = app
        .auth(
            app.client.put(format!("{}/api/recipes/{id}/", app.base)),
            &token,
        )
        .json(&json!({
            "name": "Каша сладкая",
            "text": "Сварить",
            "cooking_time": 20,
            "tags": [dinner],
            "ingredients": [{"id": sugar, "amount": 30}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["image"].is_array());
}

#[tokio::test]
async fn admins_may_moderate_any_recipe() {
    let app = spawn_app().await;
    let alice = app.user("alice").await;
    let admin = app.admin("root").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let id = app
        .create_recipe(
            &alice,
            "Омлет",
            recipe_payload(tag, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let response = app
        .auth(
            app.client.patch(format!("{}/api/recipes/{id}/", app.base)),
            &admin,
        )
        .json(&json!({"name": "Омлет (проверен)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .auth(
            app.client.delete(format!("{}/api/recipes/{id}/", app.base)),
            &admin,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn patch_with_empty_edge_list_is_rejected() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let id = app
        .create_recipe(
            &token,
            "Омлет",
            recipe_payload(tag, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let response = app
        .auth(
            app.client.patch(format!("{}/api/recipes/{id}/", app.base)),
            &token,
        )
        .json(&json!({"ingredients": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["ingredients"].is_array());
}

#[tokio::test]
async fn favorite_lifecycle() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let id = app
        .create_recipe(
            &token,
            "Омлет",
            recipe_payload(tag, json!([{"id": milk, "amount": 200}])),
        )
        .await;

    let url = format!("{}/api/recipes/{id}/favorite/", app.base);
    let response = app.auth(app.client.post(&url), &token).send().await.unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Омлет");
    assert_eq!(body["cooking_time"], 10);

    // Doubling up answers 400, removing twice answers 404.
    let response = app.auth(app.client.post(&url), &token).send().await.unwrap();
    assert_eq!(response.status(), 400);
    let response = app.auth(app.client.delete(&url), &token).send().await.unwrap();
    assert_eq!(response.status(), 204);
    let response = app.auth(app.client.delete(&url), &token).send().await.unwrap();
    assert_eq!(response.status(), 404);

    let response = app
        .auth(
            app.client
                .post(format!("{}/api/recipes/999/favorite/", app.base)),
            &token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn shopping_list_aggregates_cart_ingredients() {
    let app = spawn_app().await;
    let token = app.user("alice").await;
    let tag = app.seed_tag("Обед", "lunch", "#FFA500").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let sugar = app.seed_ingredient("Сахар", "г").await;

    let first = app
        .create_recipe(
            &token,
            "Каша",
            recipe_payload(
                tag,
                json!([{"id": milk, "amount": 200}, {"id": sugar, "amount": 50}]),
            ),
        )
        .await;
    let second = app
        .create_recipe(
            &token,
            "Какао",
            recipe_payload(tag, json!([{"id": milk, "amount": 150}])),
        )
        .await;
    for id in [first, second] {
        let response = app
            .auth(
                app.client
                    .post(format!("{}/api/recipes/{id}/shopping_cart/", app.base)),
                &token,
            )
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = app
        .auth(
            app.client
                .get(format!("{}/api/recipes/download_shopping_cart/", app.base)),
            &token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, "text/plain; charset=utf-8");
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=shopping_list.txt");
    let text = response.text().await.unwrap();
    // Cart recipes come newest-first, so milk appears before sugar.
    assert_eq!(text, "Список покупок:\nМолоко (мл) - 350\nСахар (г) - 50\n");
}

#[tokio::test]
async fn shopping_list_requires_authentication() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/api/recipes/download_shopping_cart/", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn subscription_lifecycle() {
    let app = spawn_app().await;
    let alice = app.user("alice").await;
    let _bob = app.user("bob").await;
    let bob_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'bob'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let alice_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'alice'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let url = format!("{}/api/users/{bob_id}/subscribe/", app.base);
    let response = app.auth(app.client.post(&url), &alice).send().await.unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "bob");
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 0);

    let response = app.auth(app.client.post(&url), &alice).send().await.unwrap();
    assert_eq!(response.status(), 400);
    let response = app
        .auth(
            app.client
                .post(format!("{}/api/users/{alice_id}/subscribe/", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // The author card in user listings reflects the subscription.
    let response = app
        .auth(
            app.client.get(format!("{}/api/users/{bob_id}/", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_subscribed"], true);

    let response = app
        .auth(
            app.client
                .get(format!("{}/api/users/subscriptions/", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "bob");

    let response = app.auth(app.client.delete(&url), &alice).send().await.unwrap();
    assert_eq!(response.status(), 204);
    let response = app.auth(app.client.delete(&url), &alice).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn recipe_listing_filters_and_paginates() {
    let app = spawn_app().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let breakfast = app.seed_tag("Завтрак", "breakfast", "#FFA500").await;
    let dinner = app.seed_tag("Ужин", "dinner", "#E6E6FA").await;
    let milk = app.seed_ingredient("Молоко", "мл").await;
    let ingredients = json!([{"id": milk, "amount": 100}]);

    let omelette = app
        .create_recipe(&alice, "Омлет", recipe_payload(breakfast, ingredients.clone()))
        .await;
    app.create_recipe(&alice, "Суп", recipe_payload(dinner, ingredients.clone()))
        .await;
    app.create_recipe(&bob, "Каша", recipe_payload(breakfast, ingredients.clone()))
        .await;

    // Tag filters are OR-combined.
    let response = app
        .client
        .get(format!(
            "{}/api/recipes/?tags=breakfast&tags=dinner",
            app.base
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);

    let response = app
        .client
        .get(format!("{}/api/recipes/?tags=dinner", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Суп");

    let bob_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'bob'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let response = app
        .client
        .get(format!("{}/api/recipes/?author={bob_id}", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Каша");

    // Pagination envelope with page links, newest first.
    let response = app
        .client
        .get(format!("{}/api/recipes/?limit=2", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][0]["name"], "Каша");
    assert_eq!(body["next"], "/api/recipes/?limit=2&page=2");
    assert_eq!(body["previous"], Value::Null);

    // Anonymous viewers get relation filters ignored rather than empty.
    let response = app
        .auth(
            app.client
                .post(format!("{}/api/recipes/{omelette}/favorite/", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let response = app
        .client
        .get(format!("{}/api/recipes/?is_favorited=1", app.base))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);

    let response = app
        .auth(
            app.client
                .get(format!("{}/api/recipes/?is_favorited=1", app.base)),
            &alice,
        )
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Омлет");
    assert_eq!(body["results"][0]["is_favorited"], true);
}

#[tokio::test]
async fn user_listing_paginates() {
    let app = spawn_app().await;
    for name in ["alice", "bob", "carol"] {
        app.register(name).await;
    }
    let response = app
        .client
        .get(format!("{}/api/users/?limit=2&page=2", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["username"], "carol");
    assert_eq!(body["previous"], "/api/users/?limit=2&page=1");
}
