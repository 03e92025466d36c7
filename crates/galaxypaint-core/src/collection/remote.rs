//! Direct HTTP access to the document collection.

use super::{DocumentEntry, DocumentPage, DocumentSource};
use crate::transport::{BoxFuture, Endpoint, TransportError, TransportResult};

/// Document collection client for a widget with direct API access.
#[derive(Clone)]
pub struct CollectionClient {
    client: reqwest::Client,
    endpoint: Endpoint,
    bearer_token: Option<String>,
}

impl CollectionClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// A request builder carrying the credentials, if any.
    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl DocumentSource for CollectionClient {
    fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>> {
        let url = self.endpoint.documents_url();
        Box::pin(async move {
            let response = self
                .request(reqwest::Method::GET, &url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                    message: format!("Failed to list documents at {}", url),
                });
            }
            let page: DocumentPage = response.json().await?;
            log::info!("Listed {} documents for site {}", page.items.len(), self.endpoint.group_id());
            Ok(page.items)
        })
    }

    fn fetch_content(&self, entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
        let url = self.endpoint.resolve(&entry.content_url);
        Box::pin(async move {
            let response = self.request(reqwest::Method::GET, &url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                    message: format!("Failed to fetch {}", url),
                });
            }
            Ok(response.bytes().await?.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_fetch() {
        let app = Router::new()
            .route(
                "/o/headless-delivery/v1.0/sites/20121/documents",
                get(|| async {
                    Json(json!({
                        "items": [{"id": 7, "title": "Logo", "contentUrl": "/documents/7/logo.png"}]
                    }))
                }),
            )
            .route("/documents/7/logo.png", get(|| async { vec![0x89u8, b'P', b'N', b'G'] }));
        let base = serve(app).await;

        let client = CollectionClient::new(Endpoint::remote(&base, "20121").unwrap());
        let items = client.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Logo");

        let bytes = client.fetch_content(&items[0]).await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_list_http_error() {
        let app = Router::new().route(
            "/o/headless-delivery/v1.0/sites/1/documents",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let base = serve(app).await;

        let client = CollectionClient::new(Endpoint::remote(&base, "1").unwrap());
        let result = client.list().await;
        assert!(matches!(result, Err(TransportError::Http { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_fetch_missing_content() {
        let base = serve(Router::new()).await;
        let client = CollectionClient::new(Endpoint::remote(&base, "1").unwrap());
        let entry = DocumentEntry {
            id: "9".to_string(),
            title: "Gone".to_string(),
            content_url: "/documents/9/gone.png".to_string(),
        };

        let result = client.fetch_content(&entry).await;
        assert!(matches!(result, Err(TransportError::Http { status: 404, .. })));
    }
}
