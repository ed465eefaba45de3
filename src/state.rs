use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::catalog::cache::ProductCache;
use crate::catalog::erp::ErpClient;
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub erp: Arc<ErpClient>,
    pub catalog: Arc<ProductCache>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let erp = Arc::new(ErpClient::new(config.erp.clone())?);
        let catalog = Arc::new(ProductCache::new(Duration::from_secs(config.catalog_ttl_secs)));
        Ok(Self {
            db,
            config,
            erp,
            catalog,
        })
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("memory options")
            .foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("migrations");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_hours: 24,
            },
            erp: crate::config::ErpConfig {
                base_url: "http://127.0.0.1:9".into(),
                username: "test".into(),
                password: "test".into(),
                item_group: "Nike".into(),
            },
            catalog_ttl_secs: 300,
            image_dir: "target/test-images".into(),
        });
        let erp = Arc::new(ErpClient::new(config.erp.clone()).expect("erp client"));
        let catalog = Arc::new(ProductCache::new(Duration::from_secs(config.catalog_ttl_secs)));
        Self {
            db,
            config,
            erp,
            catalog,
        }
    }
}
