//! HTTP client for the remote code store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use terminology_types::{StoredCode, WrittenCode};

use super::{CodeStore, RangeQuery};
use crate::error::{StoreError, StoreResult};

const CODE_API: &str = "rest/v2/code";

/// Range filter body of the filter endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IntervalFilter<'a> {
    #[serde(rename = "$type")]
    filter_type: &'static str,
    start_type: &'a str,
    start_code: &'a str,
    start_version: Option<&'a str>,
    end_type: &'a str,
    end_code: &'a str,
    end_version: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct FilterChain<'a> {
    filter: IntervalFilter<'a>,
}

impl<'a> FilterChain<'a> {
    fn for_range(query: &'a RangeQuery) -> Self {
        Self {
            filter: IntervalFilter {
                filter_type: "CodeIdsByTypeCodeVersionIntervalFilter",
                start_type: &query.code_type,
                start_code: &query.start_code,
                start_version: query.start_version.as_deref(),
                end_type: &query.code_type,
                end_code: &query.end_code,
                end_version: query.end_version.as_deref(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOfIds<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PaginatedList {
    #[serde(default)]
    rows: Vec<StoredCode>,
}

/// Code store reached over its REST API with basic authentication.
#[derive(Debug, Clone)]
pub struct HttpCodeStore {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl HttpCodeStore {
    /// Creates a client for the store at `base_url`.
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Uses a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The store's base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, CODE_API, path)
    }

    async fn send<B, T>(&self, request: reqwest::RequestBuilder, body: &B) -> StoreResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned + Send,
    {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CodeStore for HttpCodeStore {
    async fn range_query(&self, query: &RangeQuery, limit: usize) -> StoreResult<Vec<StoredCode>> {
        let request = self
            .client
            .post(self.endpoint("filter"))
            .query(&[("limit", limit)]);
        let page: PaginatedList = self.send(request, &FilterChain::for_range(query)).await?;
        Ok(page.rows)
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<StoredCode>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = self.client.post(self.endpoint("byIds"));
        self.send(request, &ListOfIds { ids }).await
    }

    async fn create_batch(&self, codes: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>> {
        let request = self.client.post(self.endpoint("batch"));
        self.send(request, &codes).await
    }

    async fn modify_batch(&self, codes: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>> {
        let request = self.client.put(self.endpoint("batch"));
        self.send(request, &codes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let store = HttpCodeStore::new("https://store.example.org/", "user", "secret");
        assert_eq!(store.base_url(), "https://store.example.org");
        assert_eq!(
            store.endpoint("filter"),
            "https://store.example.org/rest/v2/code/filter"
        );
    }

    #[test]
    fn test_filter_body() {
        let query = RangeQuery::new("SNOMED", ("1001", Some("20210101")), ("1009", None));
        let body = serde_json::to_value(FilterChain::for_range(&query)).unwrap();

        assert_eq!(body["filter"]["$type"], "CodeIdsByTypeCodeVersionIntervalFilter");
        assert_eq!(body["filter"]["startType"], "SNOMED");
        assert_eq!(body["filter"]["endType"], "SNOMED");
        assert_eq!(body["filter"]["startVersion"], "20210101");
        assert!(body["filter"]["endVersion"].is_null());
    }

    #[test]
    fn test_page_rows_default() {
        let page: PaginatedList = serde_json::from_str(r#"{"pageSize":0}"#).unwrap();
        assert!(page.rows.is_empty());

        let page: PaginatedList = serde_json::from_str(
            r#"{"rows":[{"id":"LOINC|1-8|2.73","type":"LOINC","code":"1-8","version":"2.73","rev":"3-a"}]}"#,
        )
        .unwrap();
        assert_eq!(page.rows[0].rev.as_deref(), Some("3-a"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_an_error() {
        let store = HttpCodeStore::new("http://127.0.0.1:9", "user", "secret");
        let query = RangeQuery::new("SNOMED", ("1", None), ("2", None));
        let err = store.range_query(&query, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }
}
