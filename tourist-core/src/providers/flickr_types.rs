use serde::{Deserialize, Deserializer, Serialize};

/// Flickr sometimes encodes counters as strings (`"total": "1523"`).
fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(raw) => raw
            .trim()
            .parse()
            .map_err(|_| {
                serde::de::Error::custom(format!("not a number: {raw}"))
            }),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub stat: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub photos: Option<PhotosPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PhotosPayload {
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub page: u64,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub pages: u64,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub total: u64,
    pub photo: Vec<PhotoItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PhotoItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url_m: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchQuery<'a> {
    pub method: &'a str,
    pub api_key: &'a str,
    pub bbox: String,
    pub per_page: u32,
    pub safe_search: &'a str,
    pub extras: &'a str,
    pub format: &'a str,
    pub nojsoncallback: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
