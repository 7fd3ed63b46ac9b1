//! Bibliographic catalog search against the OBA search API.
//!
//! Each search signs a short-lived bearer token, issues one keyword query
//! and reads fixed field paths out of the returned markup: every `result`
//! element's `title`, `coverimage` and `detail-page`. Zero matches is a
//! normal outcome and yields an empty list.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod handlers;

/// Signed access tokens are valid this long.
const TOKEN_TTL_SECS: u64 = 30 * 60;
const REQUEST_TIMEOUT_SECS: u64 = 15;
const TOKEN_DESCRIPTION: &str = "obi-chat";

/// One search hit, in the order the catalog returned it (never re-sorted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResult {
    pub title: String,
    pub cover_image_url: String,
    pub detail_page_url: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API returned status {0}")]
    Api(u16),

    #[error("failed to sign access token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("malformed search response: {0}")]
    Parse(String),
}

/// Seam for the catalog backend; tests inject fakes with canned results.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, keyword: &str) -> Result<Vec<CatalogResult>, CatalogError>;
}

#[derive(Debug, Serialize)]
struct AccessClaims<'a> {
    key: &'a str,
    exp: u64,
    description: &'a str,
}

/// Production client for the OBA search API.
pub struct ObaCatalogClient {
    http: Client,
    base_url: String,
    public_key: String,
    secret_key: String,
}

impl ObaCatalogClient {
    pub fn new(base_url: String, public_key: String, secret_key: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            public_key,
            secret_key,
        }
    }

    /// Signs a fresh HS256 bearer token for one search call.
    fn sign_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();

        let claims = AccessClaims {
            key: &self.public_key,
            exp: now + TOKEN_TTL_SECS,
            description: TOKEN_DESCRIPTION,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )
    }
}

#[async_trait]
impl CatalogSearch for ObaCatalogClient {
    async fn search(&self, keyword: &str) -> Result<Vec<CatalogResult>, CatalogError> {
        let token = self.sign_token()?;

        let response = self
            .http
            .get(format!("{}/search/", self.base_url))
            .query(&[("q", keyword)])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Api(status.as_u16()));
        }

        let body = response.text().await?;
        let results = parse_search_results(&body)?;

        debug!("catalog search '{keyword}': {} result(s)", results.len());

        Ok(results)
    }
}

#[derive(Clone, Copy)]
enum ResultField {
    Title,
    CoverImage,
    DetailPage,
}

/// Reads `result` elements out of the search response markup.
///
/// Only the three fixed field paths are read; anything else in the document
/// is skipped. An empty document (zero `result` elements) parses to an
/// empty list.
pub fn parse_search_results(xml: &str) -> Result<Vec<CatalogResult>, CatalogError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut results = Vec::new();
    let mut current: Option<CatalogResult> = None;
    let mut field: Option<ResultField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"result" => {
                    current = Some(CatalogResult {
                        title: String::new(),
                        cover_image_url: String::new(),
                        detail_page_url: String::new(),
                    });
                }
                b"title" => field = current.is_some().then_some(ResultField::Title),
                b"coverimage" => field = current.is_some().then_some(ResultField::CoverImage),
                b"detail-page" => field = current.is_some().then_some(ResultField::DetailPage),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(result), Some(field)) = (current.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| CatalogError::Parse(e.to_string()))?;
                    match field {
                        ResultField::Title => result.title.push_str(&text),
                        ResultField::CoverImage => result.cover_image_url.push_str(&text),
                        ResultField::DetailPage => result.detail_page_url.push_str(&text),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"result" => {
                    if let Some(mut result) = current.take() {
                        // cover URLs arrive with entity-escaped ampersands
                        result.cover_image_url = unescape_ampersands(&result.cover_image_url);
                        results.push(result);
                    }
                    field = None;
                }
                b"title" | b"coverimage" | b"detail-page" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(CatalogError::Parse(e.to_string())),
            _ => {}
        }
    }

    Ok(results)
}

fn unescape_ampersands(url: &str) -> String {
    url.replace("&amp;", "&")
}
