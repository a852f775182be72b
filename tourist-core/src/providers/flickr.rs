use std::{fmt, time::Duration};

use async_trait::async_trait;
use tourist_model::BoundingBox;
use tracing::{debug, warn};

use super::flickr_types::{SearchEnvelope, SearchQuery};

pub const FLICKR_REST_ENDPOINT: &str = "https://api.flickr.com/services/rest";
pub const SEARCH_METHOD: &str = "flickr.photos.search";
/// The search API never serves results beyond this page, whatever `pages`
/// claims.
pub const MAX_SEARCH_PAGES: u32 = 40;
pub const DEFAULT_PER_PAGE: u32 = 100;
const MEDIUM_URL_EXTRA: &str = "url_m";
const OK_STATUS: &str = "ok";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode search response: {0}")]
    Decode(String),

    #[error("Search service returned an error: {0}")]
    RemoteStatus(String),

    #[error("No photos were found for these coordinates")]
    NoResults,
}

impl SearchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Network(_))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

/// One usable result: a title and the medium-size image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub photos: Vec<SearchHit>,
}

impl SearchPage {
    /// Number of pages a caller may actually request.
    pub fn capped_pages(&self) -> u32 {
        self.pages.min(MAX_SEARCH_PAGES)
    }
}

/// Remote photo search, queried by bounding box.
#[async_trait]
pub trait PhotoSearchClient: Send + Sync {
    /// Fetch one page of results. `None` lets the service pick its default
    /// (first) page.
    async fn search(
        &self,
        bbox: &BoundingBox,
        page: Option<u32>,
    ) -> Result<SearchPage, SearchError>;
}

/// Decode a `flickr.photos.search` JSON body.
///
/// Items without a medium URL are skipped; a page with nothing usable left is
/// reported as [`SearchError::NoResults`].
pub fn parse_search_response(body: &[u8]) -> Result<SearchPage, SearchError> {
    let envelope: SearchEnvelope = serde_json::from_slice(body)
        .map_err(|err| SearchError::Decode(err.to_string()))?;

    if envelope.stat != OK_STATUS {
        return Err(SearchError::RemoteStatus(
            envelope
                .message
                .unwrap_or_else(|| format!("stat was {:?}", envelope.stat)),
        ));
    }

    let payload = envelope.photos.ok_or_else(|| {
        SearchError::Decode("could not find key `photos`".to_string())
    })?;

    let listed = payload.photo.len();
    let photos: Vec<SearchHit> = payload
        .photo
        .into_iter()
        .filter_map(|item| {
            let image_url = item.url_m.filter(|url| !url.trim().is_empty())?;
            Some(SearchHit {
                title: item.title.unwrap_or_default(),
                image_url,
            })
        })
        .collect();

    if photos.len() < listed {
        debug!(
            "[flickr] skipped {} of {} results without `{}`",
            listed - photos.len(),
            listed,
            MEDIUM_URL_EXTRA
        );
    }

    if photos.is_empty() {
        return Err(SearchError::NoResults);
    }

    Ok(SearchPage {
        page: u32::try_from(payload.page).unwrap_or(u32::MAX).max(1),
        pages: u32::try_from(payload.pages).unwrap_or(u32::MAX),
        total: payload.total,
        photos,
    })
}

#[derive(Clone)]
pub struct FlickrSettings {
    pub api_key: String,
    pub endpoint: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl FlickrSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: FLICKR_REST_ENDPOINT.to_string(),
            per_page: DEFAULT_PER_PAGE,
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for FlickrSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlickrSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("per_page", &self.per_page)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct FlickrSearchClient {
    http: reqwest::Client,
    settings: FlickrSettings,
}

impl fmt::Debug for FlickrSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlickrSearchClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl FlickrSearchClient {
    pub fn new(settings: FlickrSettings) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("virtual-tourist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, settings })
    }

    fn query<'a>(
        &'a self,
        bbox: &BoundingBox,
        page: Option<u32>,
    ) -> SearchQuery<'a> {
        SearchQuery {
            method: SEARCH_METHOD,
            api_key: &self.settings.api_key,
            bbox: bbox.to_query_param(),
            per_page: self.settings.per_page,
            safe_search: "1",
            extras: MEDIUM_URL_EXTRA,
            format: "json",
            nojsoncallback: "1",
            page: page.map(|p| p.max(1)),
        }
    }
}

#[async_trait]
impl PhotoSearchClient for FlickrSearchClient {
    async fn search(
        &self,
        bbox: &BoundingBox,
        page: Option<u32>,
    ) -> Result<SearchPage, SearchError> {
        let query = self.query(bbox, page);
        debug!("[flickr] searching bbox={} page={:?}", query.bbox, page);

        let response = self
            .http
            .get(&self.settings.endpoint)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("[flickr] search returned HTTP {} for bbox={}", status, bbox);
            return Err(SearchError::Network(format!(
                "search request returned a status code other than 2xx \
                 ({status})"
            )));
        }

        let body = response.bytes().await?;
        parse_search_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourist_model::Coordinate;

    #[test]
    fn parses_ok_page_and_skips_items_without_url() {
        let body = br#"{
            "photos": {"page": 1, "pages": "57", "perpage": 100,
                "total": "5612",
                "photo": [
                    {"id": "1", "title": "Harbor",
                     "url_m": "https://live.staticflickr.com/1/a_m.jpg"},
                    {"id": "2", "title": "No url"},
                    {"id": "3",
                     "url_m": "https://live.staticflickr.com/1/c_m.jpg"}
                ]},
            "stat": "ok"
        }"#;

        let page = parse_search_response(body).expect("page");
        assert_eq!(page.pages, 57);
        assert_eq!(page.capped_pages(), MAX_SEARCH_PAGES);
        assert_eq!(page.total, 5612);
        assert_eq!(page.photos.len(), 2);
        assert_eq!(page.photos[0].title, "Harbor");
        assert_eq!(page.photos[1].title, "");
    }

    #[test]
    fn failed_stat_is_a_remote_status_error() {
        let body = br#"{"stat": "fail", "code": 100,
            "message": "Invalid API Key (Key has invalid format)"}"#;
        let err = parse_search_response(body).unwrap_err();
        assert!(
            matches!(err, SearchError::RemoteStatus(ref msg)
                if msg.starts_with("Invalid API Key"))
        );
    }

    #[test]
    fn missing_fields_are_decode_errors() {
        let no_photos = br#"{"stat": "ok"}"#;
        assert!(matches!(
            parse_search_response(no_photos),
            Err(SearchError::Decode(_))
        ));

        let no_pages = br#"{"stat": "ok", "photos": {"page": 1, "photo": []}}"#;
        assert!(matches!(
            parse_search_response(no_pages),
            Err(SearchError::Decode(_))
        ));

        let no_total = br#"{"stat": "ok",
            "photos": {"page": 1, "pages": 3, "photo": []}}"#;
        assert!(matches!(
            parse_search_response(no_total),
            Err(SearchError::Decode(_))
        ));

        let no_page = br#"{"stat": "ok",
            "photos": {"pages": 3, "total": 9, "photo": []}}"#;
        assert!(matches!(
            parse_search_response(no_page),
            Err(SearchError::Decode(_))
        ));

        assert!(matches!(
            parse_search_response(b"jsonFlickrApi({})"),
            Err(SearchError::Decode(_))
        ));
    }

    #[test]
    fn empty_photo_list_is_no_results() {
        let body = br#"{"stat": "ok",
            "photos": {"page": 1, "pages": 0, "total": 0, "photo": []}}"#;
        assert!(matches!(
            parse_search_response(body),
            Err(SearchError::NoResults)
        ));
    }

    #[test]
    fn query_carries_fixed_parameters_and_optional_page() {
        let client =
            FlickrSearchClient::new(FlickrSettings::with_api_key("abc"))
                .expect("client");
        let bbox = BoundingBox::around(
            Coordinate::new(10.0, 20.0).unwrap(),
            1.0,
            1.0,
        );

        let without_page =
            serde_json::to_value(client.query(&bbox, None)).unwrap();
        assert_eq!(without_page["method"], SEARCH_METHOD);
        assert_eq!(without_page["bbox"], "19,9,21,11");
        assert_eq!(without_page["safe_search"], "1");
        assert_eq!(without_page["extras"], "url_m");
        assert_eq!(without_page["nojsoncallback"], "1");
        assert!(without_page.get("page").is_none());

        let with_page =
            serde_json::to_value(client.query(&bbox, Some(3))).unwrap();
        assert_eq!(with_page["page"], 3);
    }
}
