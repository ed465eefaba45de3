use anyhow::Context;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ErpConfig;

/// Catalog entry as the storefront sees it, mapped from an ERP Item row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub item_code: String,
    pub item_name: String,
    pub item_group: String,
    pub price: f64,
    pub stock_qty: i64,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    item_code: Option<String>,
    item_name: Option<String>,
    item_group: Option<String>,
    standard_rate: Option<f64>,
    image: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    data: Vec<ItemRow>,
}

#[derive(Debug, Deserialize)]
struct ItemDetail {
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceOne {
    data: ItemDetail,
}

/// Cookie-session client for the upstream ERP. Logs in lazily on first use;
/// a rejected session drops the flag so the next call logs in again.
pub struct ErpClient {
    http: reqwest::Client,
    config: ErpConfig,
    logged_in: Mutex<bool>,
}

impl ErpClient {
    pub fn new(config: ErpConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            config,
            logged_in: Mutex::new(false),
        })
    }

    async fn ensure_login(&self) -> anyhow::Result<()> {
        let mut logged_in = self.logged_in.lock().await;
        if *logged_in {
            return Ok(());
        }
        let response = self
            .http
            .post(format!("{}/", self.config.base_url))
            .form(&[
                ("cmd", "login"),
                ("usr", self.config.username.as_str()),
                ("pwd", self.config.password.as_str()),
            ])
            .send()
            .await
            .context("erp login request")?;
        if !response.status().is_success() {
            anyhow::bail!("erp login failed with status {}", response.status());
        }
        *logged_in = true;
        info!("erp session established");
        Ok(())
    }

    async fn drop_session(&self) {
        *self.logged_in.lock().await = false;
    }

    pub async fn fetch_products(&self) -> anyhow::Result<Vec<Product>> {
        self.ensure_login().await?;

        let url = format!("{}/api/resource/Item", self.config.base_url);
        let fields = r#"["item_code", "item_name", "item_group", "standard_rate", "image", "description"]"#;
        let filters = format!(r#"[["item_group", "like", "%{}%"]]"#, self.config.item_group);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("fields", fields),
                ("filters", filters.as_str()),
                ("limit_page_length", "20"),
            ])
            .send()
            .await
            .context("erp item query")?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            self.drop_session().await;
            anyhow::bail!("erp session rejected with status {status}");
        }
        if !status.is_success() {
            anyhow::bail!("erp item query failed with status {status}");
        }

        let list: ResourceList = response.json().await.context("decode erp item list")?;
        debug!(count = list.data.len(), "erp items fetched");

        let products = list
            .data
            .into_iter()
            .filter_map(|row| {
                let item_code = row.item_code?;
                Some(Product {
                    item_name: row.item_name.unwrap_or_else(|| item_code.clone()),
                    item_group: row.item_group.unwrap_or_default(),
                    price: row.standard_rate.unwrap_or(0.0),
                    stock_qty: 5, // placeholder until per-warehouse Bin stock lands
                    image: row.image.unwrap_or_default(),
                    description: row.description.unwrap_or_default(),
                    item_code,
                })
            })
            .collect();
        Ok(products)
    }

    /// Resolves an item's image URL and downloads the bytes; `None` when the
    /// item or its image does not exist upstream.
    pub async fn fetch_image(&self, item_code: &str) -> anyhow::Result<Option<Bytes>> {
        self.ensure_login().await?;

        let url = format!("{}/api/resource/Item/{}", self.config.base_url, item_code);
        let response = self.http.get(&url).send().await.context("erp item detail")?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let detail: ResourceOne = response.json().await.context("decode erp item detail")?;
        let Some(image) = detail.data.image.filter(|i| !i.is_empty()) else {
            return Ok(None);
        };
        let image_url = if image.starts_with('/') {
            format!("{}{}", self.config.base_url, image)
        } else {
            image
        };

        let img = self
            .http
            .get(&image_url)
            .send()
            .await
            .context("erp image download")?;
        if !img.status().is_success() {
            return Ok(None);
        }
        let bytes = img.bytes().await.context("read erp image body")?;
        debug!(item_code, size = bytes.len(), "image downloaded");
        Ok(Some(bytes))
    }
}
