//! Azure AI Vision image-analysis client.

use std::time::Duration;

use serde::Deserialize;

use super::{VisionAnalysis, VisionProvider};
use crate::error::{Error, Result};

const API_VERSION: &str = "2023-10-01";
const FEATURES: &str = "caption,read";

/// Blocking client for the `imageanalysis:analyze` endpoint.
#[derive(Debug, Clone)]
pub struct AzureVisionClient {
    endpoint: String,
    key: String,
    http: reqwest::blocking::Client,
}

impl AzureVisionClient {
    /// Create a client for `endpoint` authenticated with `key`.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::DescriptionUnavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            http,
        })
    }

    /// Build a client from `VISION_ENDPOINT` and `VISION_KEY`.
    ///
    /// Returns `None` when either variable is missing.
    pub fn from_env() -> Option<Result<Self>> {
        let endpoint = std::env::var("VISION_ENDPOINT").ok()?;
        let key = std::env::var("VISION_KEY").ok()?;
        Some(Self::new(endpoint, key))
    }

    fn analyze_url_for(&self, gender_neutral: bool) -> String {
        let mut url = format!(
            "{}/computervision/imageanalysis:analyze?api-version={}&features={}",
            self.endpoint, API_VERSION, FEATURES
        );
        if gender_neutral {
            url.push_str("&gender-neutral-caption=true");
        }
        url
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<VisionAnalysis> {
        let response = request
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .map_err(|e| Error::DescriptionUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::DescriptionUnavailable(format!("HTTP {}: {}", status, body)));
        }

        let body: AnalyzeResponse = response
            .json()
            .map_err(|e| Error::DescriptionUnavailable(format!("bad response: {}", e)))?;
        Ok(body.into_analysis())
    }
}

impl VisionProvider for AzureVisionClient {
    fn analyze(&self, image: &[u8]) -> Result<VisionAnalysis> {
        let request = self
            .http
            .post(self.analyze_url_for(false))
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());
        self.send(request)
    }

    fn analyze_url(&self, url: &str) -> Result<VisionAnalysis> {
        let request = self
            .http
            .post(self.analyze_url_for(true))
            .json(&serde_json::json!({ "url": url }));
        self.send(request)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    caption_result: Option<CaptionResult>,
    #[serde(default)]
    read_result: Option<ReadResult>,
}

#[derive(Debug, Deserialize)]
struct CaptionResult {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReadResult {
    #[serde(default)]
    blocks: Vec<ReadBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadBlock {
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
}

impl AnalyzeResponse {
    fn into_analysis(self) -> VisionAnalysis {
        VisionAnalysis {
            caption: self.caption_result.map(|c| c.text).filter(|t| !t.is_empty()),
            ocr_lines: self
                .read_result
                .unwrap_or_default()
                .blocks
                .into_iter()
                .flat_map(|b| b.lines)
                .map(|l| l.text)
                .collect(),
        }
    }
}
