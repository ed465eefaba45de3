use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErpConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub item_group: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub erp: ErpConfig,
    pub catalog_ttl_secs: u64,
    pub image_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/urbankicks.db".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let erp = ErpConfig {
            base_url: std::env::var("ERP_BASE_URL")?,
            username: std::env::var("ERP_USERNAME")?,
            password: std::env::var("ERP_PASSWORD")?,
            item_group: std::env::var("ERP_ITEM_GROUP").unwrap_or_else(|_| "Nike".into()),
        };
        let catalog_ttl_secs = std::env::var("CATALOG_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        let image_dir = std::env::var("IMAGE_DIR").unwrap_or_else(|_| "data/item_images".into());
        Ok(Self {
            database_url,
            jwt,
            erp,
            catalog_ttl_secs,
            image_dir,
        })
    }
}
