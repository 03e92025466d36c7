//! Document collection access relayed through the host page.

use super::{DocumentEntry, DocumentPage, DocumentSource};
use crate::host::{ProxyRequest, RequestProxy};
use crate::transport::{BoxFuture, Endpoint, TransportError, TransportResult};
use std::rc::Rc;

/// Document collection client for a sandboxed widget.
#[derive(Clone)]
pub struct ProxyCollectionClient {
    proxy: Rc<dyn RequestProxy>,
    endpoint: Endpoint,
}

impl ProxyCollectionClient {
    pub fn new(proxy: Rc<dyn RequestProxy>, endpoint: Endpoint) -> Self {
        Self { proxy, endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl DocumentSource for ProxyCollectionClient {
    fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>> {
        let url = self.endpoint.documents_url();
        Box::pin(async move {
            let request = ProxyRequest::get().header("Accept", "application/json");
            let response = self.proxy.fetch(&url, request).await?;
            if !response.is_success() {
                return Err(TransportError::Http {
                    status: response.status,
                    message: format!("Failed to list documents at {}", url),
                });
            }
            let page: DocumentPage = response.json()?;
            Ok(page.items)
        })
    }

    fn fetch_content(&self, entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
        let url = self.endpoint.resolve(&entry.content_url);
        Box::pin(async move {
            let response = self.proxy.fetch(&url, ProxyRequest::get()).await?;
            if !response.is_success() {
                return Err(TransportError::Http {
                    status: response.status,
                    message: format!("Failed to fetch {}", url),
                });
            }
            Ok(response.body)
        })
    }
}
