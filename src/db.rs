use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Opened once at process start and handed to components as an injected
/// handle; `main` closes it on shutdown.
pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .expect("Failed to connect to database")
}
