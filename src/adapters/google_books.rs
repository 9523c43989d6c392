use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::adapters::check_status;
use crate::domain::model::Book;
use crate::domain::ports::{BookCatalog, SearchRequest};
use crate::utils::error::{BookFeedError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[allow(dead_code)]
    total_items: Option<u64>,
    items: Option<Vec<VolumeItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    id: String,
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    description: Option<String>,
    categories: Option<Vec<String>>,
    average_rating: Option<f64>,
    page_count: Option<u32>,
    published_date: Option<String>,
    image_links: Option<ImageLinks>,
    info_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

fn force_https(link: &str) -> String {
    link.replace("http://", "https://")
}

impl ImageLinks {
    fn best_quality(&self) -> Option<&String> {
        self.large
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.small.as_ref())
            .or(self.thumbnail.as_ref())
            .or(self.small_thumbnail.as_ref())
    }
}

impl From<VolumeItem> for Book {
    fn from(item: VolumeItem) -> Self {
        let info = item.volume_info;
        let thumbnail_url = info
            .image_links
            .as_ref()
            .and_then(|l| l.thumbnail.as_deref())
            .map(force_https);
        let large_cover_url = info
            .image_links
            .as_ref()
            .and_then(ImageLinks::best_quality)
            .map(|l| force_https(l));

        Book {
            id: item.id,
            title: info.title.unwrap_or_else(|| "Untitled".to_string()),
            authors: info
                .authors
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| vec!["Unknown Author".to_string()]),
            description: info.description,
            categories: info.categories.unwrap_or_default(),
            average_rating: info.average_rating,
            page_count: info.page_count,
            published_date: info.published_date,
            thumbnail_url,
            large_cover_url,
            info_link: info.info_link,
        }
    }
}

/// Client for the Google Books volumes API.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn volume_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| BookFeedError::ConfigError {
                message: format!("catalog base URL cannot take a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }
}

#[async_trait]
impl BookCatalog for GoogleBooksClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Book>> {
        tracing::debug!(
            "Catalog search q={:?} start={} max={}",
            request.query,
            request.start_index,
            request.max_results
        );

        let start_index = request.start_index.to_string();
        let max_results = request.max_results.to_string();
        let query = [
            ("q", request.query.as_str()),
            ("startIndex", start_index.as_str()),
            ("maxResults", max_results.as_str()),
            ("orderBy", request.order_by.as_str()),
            ("printType", "books"),
            ("langRestrict", "en"),
        ];

        let response = self
            .with_key(self.client.get(&self.base_url).query(&query))
            .send()
            .await?;
        let response = check_status(response)?;
        let body: VolumesResponse = response.json().await?;

        let books: Vec<Book> = body
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Book::from)
            .filter(|b| b.thumbnail_url.is_some() && b.description.is_some())
            .collect();

        tracing::debug!("Catalog search returned {} usable books", books.len());
        Ok(books)
    }

    async fn volume(&self, id: &str) -> Result<Book> {
        let url = self.volume_url(id)?;
        let response = self.with_key(self.client.get(url)).send().await?;
        let response = check_status(response)?;
        let item: VolumeItem = response.json().await?;
        Ok(Book::from(item))
    }
}
