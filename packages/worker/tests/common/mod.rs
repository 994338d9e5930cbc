//! Shared Postgres harness for integration tests.
//!
//! One container is shared across the test run; each test gets its own
//! freshly migrated database so writes never cross test boundaries.

use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

struct SharedContainer {
    base_url: String,
    _postgres: ContainerAsync<Postgres>,
}

static CONTAINER: OnceCell<SharedContainer> = OnceCell::const_new();

async fn shared_container() -> &'static SharedContainer {
    CONTAINER
        .get_or_init(|| async {
            let postgres = Postgres::default()
                .with_tag("16")
                .start()
                .await
                .expect("failed to start Postgres container");

            let host = postgres.get_host().await.expect("container host");
            let port = postgres
                .get_host_port_ipv4(5432)
                .await
                .expect("container port");

            SharedContainer {
                base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
                _postgres: postgres,
            }
        })
        .await
}

/// A fresh, migrated database for one test.
pub async fn fresh_pool() -> PgPool {
    let container = shared_container().await;

    let admin = PgPool::connect(&format!("{}/postgres", container.base_url))
        .await
        .expect("connect to admin database");
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    sqlx::query(&format!(r#"CREATE DATABASE "{db_name}""#))
        .execute(&admin)
        .await
        .expect("create test database");

    let pool = PgPool::connect(&format!("{}/{db_name}", container.base_url))
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}
