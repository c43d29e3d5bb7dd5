//! HTTP client for the TourAPI (Korea Tourism Organization open data) REST API.
//!
//! Wraps `reqwest` with service-key management, the shared query parameters
//! every operation needs, envelope validation, and retry. Every response is
//! checked for the `resultCode` success sentinel; anything else surfaces as a
//! typed [`TourApiError`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tourmap_core::config::DEFAULT_TOURAPI_BASE_URL;
use tourmap_core::AppConfig;

use crate::error::TourApiError;
use crate::normalize::{listing_records, ListingRecord};
use crate::retry::RetryPolicy;
use crate::types::{ApiBody, ApiEnvelope, SUCCESS_CODE};

pub(crate) const OP_AREA_BASED_LIST: &str = "areaBasedList2";
pub(crate) const OP_SEARCH_KEYWORD: &str = "searchKeyword2";
pub(crate) const OP_DETAIL_PET_TOUR: &str = "detailPetTour2";


static GATEWAY_REASON_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<returnReasonCode>\s*([0-9]+)\s*</returnReasonCode>").expect("valid regex")
});
static GATEWAY_AUTH_MSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<returnAuthMsg>\s*([^<]*?)\s*</returnAuthMsg>").expect("valid regex")
});

/// Parameters shared by the list and keyword-search operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub area_code: Option<String>,
    pub content_type_id: Option<String>,
    /// Remote ordering (`A` title, `C` modified time).
    pub arrange: Option<&'static str>,
    pub page_no: u32,
    pub num_of_rows: u32,
}

impl ListingQuery {
    #[must_use]
    pub fn page(page_no: u32, num_of_rows: u32) -> Self {
        Self {
            area_code: None,
            content_type_id: None,
            arrange: None,
            page_no,
            num_of_rows,
        }
    }
}

/// One decoded page of listing results.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub items: Vec<ListingRecord>,
    pub total_count: Option<u32>,
    pub page_no: u32,
    /// Rows the remote returned, including any skipped as malformed. This is
    /// what "has more" is judged on.
    pub fetched: usize,
}

/// Client for the TourAPI REST API.
///
/// Use [`TourApiClient::new`] for production or
/// [`TourApiClient::with_base_url`] to point at a mock server in tests.
pub struct TourApiClient {
    client: Client,
    service_key: String,
    mobile_app: String,
    base_url: Url,
    retry: RetryPolicy,
}

impl TourApiClient {
    /// Creates a client pointed at the production TourAPI.
    ///
    /// # Errors
    ///
    /// Returns [`TourApiError::MissingServiceKey`] for a blank key, or
    /// [`TourApiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(service_key: &str, mobile_app: &str, timeout_secs: u64) -> Result<Self, TourApiError> {
        Self::with_base_url(service_key, mobile_app, timeout_secs, DEFAULT_TOURAPI_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// - [`TourApiError::MissingServiceKey`] if `service_key` is blank.
    /// - [`TourApiError::InvalidBaseUrl`] if `base_url` is not an http(s) URL.
    /// - [`TourApiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        service_key: &str,
        mobile_app: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TourApiError> {
        if service_key.trim().is_empty() {
            return Err(TourApiError::MissingServiceKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("tourmap/0.1 (tourism-discovery)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| TourApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(TourApiError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an http(s) URL".to_owned(),
            });
        }

        Ok(Self {
            client,
            service_key: service_key.trim().to_owned(),
            mobile_app: mobile_app.to_owned(),
            base_url: parsed,
            retry: RetryPolicy::default(),
        })
    }

    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`TourApiClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, TourApiError> {
        Ok(Self::with_base_url(
            &config.tourapi_service_key,
            &config.tourapi_mobile_app,
            config.tourapi_request_timeout_secs,
            &config.tourapi_base_url,
        )?
        .with_retry_policy(
            config.tourapi_max_retries,
            config.tourapi_retry_backoff_base_ms,
        ))
    }

    /// Overrides the retry policy. `max_retries = 0` disables retries.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy {
            max_retries,
            backoff_base_ms,
        };
        self
    }

    /// Lists records for a region (`areaBasedList2`).
    ///
    /// # Errors
    ///
    /// - [`TourApiError::Api`], [`TourApiError::RateLimited`], or
    ///   [`TourApiError::InvalidServiceKey`] when the envelope reports failure.
    /// - [`TourApiError::Http`] / [`TourApiError::UnexpectedStatus`] on
    ///   transport failure after retries.
    /// - [`TourApiError::Malformed`] / [`TourApiError::Deserialize`] if the
    ///   response does not have the expected shape.
    pub async fn area_based_list(&self, query: &ListingQuery) -> Result<ListingPage, TourApiError> {
        let params = Self::listing_params(query);
        self.fetch_listing(OP_AREA_BASED_LIST, &params, query.page_no)
            .await
    }

    /// Searches records by keyword (`searchKeyword2`), optionally narrowed
    /// by region and content type.
    ///
    /// # Errors
    ///
    /// Same as [`TourApiClient::area_based_list`].
    pub async fn search_keyword(
        &self,
        keyword: &str,
        query: &ListingQuery,
    ) -> Result<ListingPage, TourApiError> {
        let mut params = vec![("keyword", keyword.trim().to_owned())];
        params.extend(Self::listing_params(query));
        self.fetch_listing(OP_SEARCH_KEYWORD, &params, query.page_no)
            .await
    }

    fn listing_params(query: &ListingQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageNo", query.page_no.to_string()),
            ("numOfRows", query.num_of_rows.to_string()),
        ];
        if let Some(area) = &query.area_code {
            params.push(("areaCode", area.clone()));
        }
        if let Some(content_type) = &query.content_type_id {
            params.push(("contentTypeId", content_type.clone()));
        }
        if let Some(arrange) = query.arrange {
            params.push(("arrange", arrange.to_owned()));
        }
        params
    }

    async fn fetch_listing(
        &self,
        op: &str,
        params: &[(&str, String)],
        page_no: u32,
    ) -> Result<ListingPage, TourApiError> {
        let body = self.get_body(op, params).await?;
        let values = body.items.into_values();
        let fetched = values.len();
        let items = listing_records(values, op);
        tracing::debug!(op, page_no, fetched, kept = items.len(), "listing page fetched");
        Ok(ListingPage {
            items,
            total_count: body.total_count,
            page_no: body.page_no.unwrap_or(page_no),
            fetched,
        })
    }

    /// Sends the request for `op` with retry and returns the validated body.
    pub(crate) async fn get_body(
        &self,
        op: &str,
        params: &[(&str, String)],
    ) -> Result<ApiBody, TourApiError> {
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let url = self.build_url(op, &borrowed);
        self.retry.run(op, || self.request_body(&url, op)).await
    }

    /// Builds the full request URL with the shared parameters and `extra`,
    /// all percent-encoded.
    fn build_url(&self, op: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(op);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("serviceKey", &self.service_key);
            pairs.append_pair("MobileOS", "ETC");
            pairs.append_pair("MobileApp", &self.mobile_app);
            pairs.append_pair("_type", "json");
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// One attempt: GET, status check, body decode, envelope validation.
    async fn request_body(&self, url: &Url, op: &str) -> Result<ApiBody, TourApiError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TourApiError::Http(e.without_url()))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TourApiError::RateLimited {
                code: status.as_u16().to_string(),
                message: "HTTP 429 Too Many Requests".to_owned(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TourApiError::Http(e.without_url()))?;

        if !status.is_success() {
            // The gateway reports key problems with an XML body and a 4xx/5xx.
            return Err(gateway_error(&text).unwrap_or(TourApiError::UnexpectedStatus {
                status: status.as_u16(),
                operation: op.to_owned(),
            }));
        }

        parse_response(&text, op)
    }
}

/// Validates a response body and returns the envelope's `body` section.
pub(crate) fn parse_response(text: &str, context: &str) -> Result<ApiBody, TourApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(malformed(context, "empty body"));
    }
    if trimmed.starts_with('<') {
        return Err(gateway_error(trimmed).unwrap_or_else(|| malformed(context, "non-JSON body")));
    }

    let mut value: Value = serde_json::from_str(trimmed).map_err(|e| TourApiError::Deserialize {
        context: context.to_owned(),
        source: e,
    })?;
    if let Some(inner) = value.get_mut("response").map(Value::take) {
        value = inner;
    }

    if value.get("header").is_none() {
        // Some gateway errors arrive as a bare `{"resultCode": .., "resultMsg": ..}`.
        return match scalar(value.get("resultCode")) {
            Some(code) if code != SUCCESS_CODE => Err(map_result_code(
                &code,
                &scalar(value.get("resultMsg")).unwrap_or_default(),
            )),
            _ => Err(malformed(context, "missing envelope header")),
        };
    }

    let envelope: ApiEnvelope =
        serde_json::from_value(value).map_err(|e| TourApiError::Deserialize {
            context: context.to_owned(),
            source: e,
        })?;

    if envelope.header.result_code != SUCCESS_CODE {
        return Err(map_result_code(
            &envelope.header.result_code,
            &envelope.header.result_msg,
        ));
    }

    envelope
        .body
        .ok_or_else(|| malformed(context, "missing envelope body"))
}

/// Maps a non-success result code onto the error taxonomy.
pub(crate) fn map_result_code(code: &str, message: &str) -> TourApiError {
    let code = code.trim().to_owned();
    let message = if message.trim().is_empty() {
        "unknown error".to_owned()
    } else {
        message.trim().to_owned()
    };
    match code.as_str() {
        "22" => TourApiError::RateLimited { code, message },
        "20" | "30" | "31" | "32" => TourApiError::InvalidServiceKey { code, message },
        _ => TourApiError::Api { code, message },
    }
}

/// Recognises the data.go.kr gateway's XML error document.
fn gateway_error(text: &str) -> Option<TourApiError> {
    let code = GATEWAY_REASON_CODE.captures(text)?.get(1)?.as_str();
    let message = GATEWAY_AUTH_MSG
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str());
    Some(map_result_code(code, message))
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn malformed(context: &str, reason: &str) -> TourApiError {
    TourApiError::Malformed {
        context: context.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
