use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::QueryError;

/// Thin HTTP wrapper around an external nested-document full-text engine
/// (an Elasticsearch/OpenSearch-shaped `_doc`/`_search` API).
pub struct SearchClient {
    client: Client,
    base_url: String,
}

impl SearchClient {
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, QueryError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether a document with `id` already exists in `index`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] on network failure.
    pub async fn document_exists(&self, index: &str, id: &str) -> Result<bool, QueryError> {
        let url = format!("{}/{index}/_doc/{id}", self.base_url);
        let response = self.client.head(&url).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    /// Fetches a document by id, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] on network failure or
    /// [`QueryError::Deserialize`] if the body is not valid JSON.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, QueryError> {
        let url = format!("{}/{index}/_doc/{id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Upserts a document by id.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] on network failure.
    pub async fn upsert_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<(), QueryError> {
        let url = format!("{}/{index}/_doc/{id}", self.base_url);
        self.client
            .put(&url)
            .json(doc)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Runs a search query against `index` and returns the raw response
    /// body. The caller projects out the hits it cares about.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] on network failure or
    /// [`QueryError::Deserialize`] if the body is not valid JSON.
    pub async fn search(&self, index: &str, query: &Value) -> Result<Value, QueryError> {
        let url = format!("{}/{index}/_search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(query)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn document_exists_true_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/sections/_doc/117hr200ih"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = SearchClient::new(&server.uri()).unwrap();
        assert!(client.document_exists("sections", "117hr200ih").await.unwrap());
    }

    #[tokio::test]
    async fn document_exists_false_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/sections/_doc/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = SearchClient::new(&server.uri()).unwrap();
        assert!(!client.document_exists("sections", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_sends_put_with_json_body() {
        let server = MockServer::start().await;
        let doc = json!({"id": "117hr200ih"});
        Mock::given(method("PUT"))
            .and(path("/sections/_doc/117hr200ih"))
            .and(body_json(&doc))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = SearchClient::new(&server.uri()).unwrap();
        client
            .upsert_document("sections", "117hr200ih", &doc)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn search_returns_parsed_body() {
        let server = MockServer::start().await;
        let body = json!({"hits": {"hits": []}});
        Mock::given(method("POST"))
            .and(path("/sections/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = SearchClient::new(&server.uri()).unwrap();
        let result = client.search("sections", &json!({"query": {}})).await.unwrap();
        assert_eq!(result, body);
    }
}
