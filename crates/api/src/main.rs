#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tallerhub_observability::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let pool = tallerhub_infra::db::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");
    tallerhub_infra::db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let app = tallerhub_api::app::build_app(pool, jwt_secret);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
