//! End-to-end tests against the real router and a real database.
//!
//! They need `DATABASE_URL` pointing at a migrated Postgres, so they are
//! ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p tallerhub-api -- --ignored
//! ```

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use tallerhub_auth::{Claims, Role};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = tallerhub_infra::db::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");
        tallerhub_infra::db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        // Same router as prod, bound to an ephemeral port.
        let app = tallerhub_api::app::build_app(pool, JWT_SECRET.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

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

fn mint_jwt(user_id: i64, rol: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        rol,
        iat: now,
        exp: now + 600,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Seed a user, vehicle, repair and stocked item through the API.
/// Returns (repair_id, item_id).
async fn seed(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    stock: i64,
) -> (i64, i64) {
    let suffix = unique_suffix();

    let res = client
        .post(format!("{base_url}/api/usuarios"))
        .bearer_auth(token)
        .json(&json!({
            "nombre": "Cliente Prueba",
            "email": format!("cliente+{suffix}@taller.test"),
            "password": "s3creta",
            "telefono": "555-0100",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: serde_json::Value = res.json().await.unwrap();
    let user_id = user["data"]["id"].as_i64().unwrap();

    let res = client
        .post(format!("{base_url}/api/vehiculos"))
        .bearer_auth(token)
        .json(&json!({
            "marca": "Toyota",
            "modelo": "Corolla",
            "año": 2020,
            "placa": format!("E2E-{}", suffix % 1_000_000_000),
            "usuario_id": user_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let vehicle: serde_json::Value = res.json().await.unwrap();
    let vehicle_id = vehicle["data"]["id"].as_i64().unwrap();

    let res = client
        .post(format!("{base_url}/api/reparaciones"))
        .bearer_auth(token)
        .json(&json!({
            "fecha_inicio": "2024-03-01T09:00:00Z",
            "descripcion": "Cambio de frenos",
            "costo": 50.0,
            "usuario_id": user_id,
            "vehiculo_id": vehicle_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let repair: serde_json::Value = res.json().await.unwrap();
    let repair_id = repair["data"]["id"].as_i64().unwrap();

    let res = client
        .post(format!("{base_url}/api/inventario"))
        .bearer_auth(token)
        .json(&json!({
            "nombre": format!("Pastillas de freno {suffix}"),
            "descripcion": "Juego delantero",
            "categoria": "frenos",
            "precio": 10.0,
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let item_id = item["data"]["id"].as_i64().unwrap();

    (repair_id, item_id)
}

async fn item_stock(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    item_id: i64,
) -> i64 {
    let res = client
        .get(format!("{base_url}/api/inventario/{item_id}"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["data"]["stock"].as_i64().unwrap()
}

fn money(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::String(s) => s.parse().unwrap(),
        other => other.as_f64().unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/api/inventario", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn user_management_requires_admin() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(1, Role::Mecanico);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/api/usuarios", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn inventory_consumption_lifecycle() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(1, Role::Admin);
    let client = reqwest::Client::new();

    let (repair_id, item_id) = seed(&client, &srv.base_url, &token, 10).await;

    // attach 4 units at 10.00 -> stock drops to 6
    let res = client
        .post(format!(
            "{}/api/reparaciones/{repair_id}/inventario",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "inventario_id": item_id, "cantidad": 4, "precio_unitario": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let link_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["inventario"]["categoria"], json!("frenos"));
    assert_eq!(item_stock(&client, &srv.base_url, &token, item_id).await, 6);

    // duplicate attach conflicts
    let res = client
        .post(format!(
            "{}/api/reparaciones/{repair_id}/inventario",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "inventario_id": item_id, "cantidad": 1, "precio_unitario": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // grow the link to 6 units -> delta +2 -> stock 4
    let res = client
        .put(format!(
            "{}/api/reparaciones/{repair_id}/inventario/{link_id}",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "cantidad": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(item_stock(&client, &srv.base_url, &token, item_id).await, 4);

    // listing reports the snapshot total: 6 x 10.00
    let res = client
        .get(format!(
            "{}/api/reparaciones/{repair_id}/inventario",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total_items"], json!(1));
    assert_eq!(money(&body["total_repuestos"]), 60.0);

    // cost aggregation: labor 50.00 + parts 60.00
    let res = client
        .get(format!(
            "{}/api/reparaciones/{repair_id}/costo-total",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(money(&body["data"]["costo_mano_obra"]), 50.0);
    assert_eq!(money(&body["data"]["costo_repuestos"]), 60.0);
    assert_eq!(money(&body["data"]["costo_total"]), 110.0);

    // the item's usage history shows this repair while linked
    let res = client
        .get(format!(
            "{}/api/inventario/{item_id}/reparaciones",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["reparacion"]["id"], json!(repair_id));

    // detach restores the updated quantity -> stock back to 10
    let res = client
        .delete(format!(
            "{}/api/reparaciones/{repair_id}/inventario/{link_id}",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(item_stock(&client, &srv.base_url, &token, item_id).await, 10);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn attach_beyond_stock_reports_availability() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(1, Role::Admin);
    let client = reqwest::Client::new();

    let (repair_id, item_id) = seed(&client, &srv.base_url, &token, 2).await;

    let res = client
        .post(format!(
            "{}/api/reparaciones/{repair_id}/inventario",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "inventario_id": item_id, "cantidad": 3, "precio_unitario": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        json!("Stock insuficiente. Disponible: 2, Solicitado: 3")
    );

    // nothing was consumed
    assert_eq!(item_stock(&client, &srv.base_url, &token, item_id).await, 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn unknown_repair_is_not_found() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(1, Role::Admin);
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/reparaciones/999999999/inventario",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
