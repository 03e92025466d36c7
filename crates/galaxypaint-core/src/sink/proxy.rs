//! Upload relayed through the host page's request proxy.

use super::{PersistenceSink, SaveOutcome, interpret_upload_reply};
use crate::host::{ProxyRequest, RequestProxy, SITE_GROUP_ID_KEY};
use crate::raster::RasterBlob;
use crate::transport::{BoxFuture, Endpoint, TransportResult, UploadForm};
use std::rc::Rc;

/// Same upload as [`RemoteCollectionUpload`](super::RemoteCollectionUpload),
/// but issued by the host on behalf of a sandboxed frame.
///
/// The relayed call is awaited and its settlement mapped to a [`SaveOutcome`].
#[derive(Clone)]
pub struct RemoteProxyUpload {
    proxy: Rc<dyn RequestProxy>,
    endpoint: Endpoint,
}

impl RemoteProxyUpload {
    /// Upload to `group_id`'s documents, with URLs relative to the host page.
    pub fn new(proxy: Rc<dyn RequestProxy>, group_id: impl Into<String>) -> Self {
        Self {
            proxy,
            endpoint: Endpoint::relative(group_id),
        }
    }

    pub fn with_endpoint(proxy: Rc<dyn RequestProxy>, endpoint: Endpoint) -> Self {
        Self { proxy, endpoint }
    }

    /// Ask the host for the current site's group id.
    pub async fn discover(proxy: Rc<dyn RequestProxy>) -> TransportResult<Self> {
        let group_id = proxy.get(SITE_GROUP_ID_KEY).await?;
        log::info!("Host reported site group id {}", group_id);
        Ok(Self::new(proxy, group_id))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl PersistenceSink for RemoteProxyUpload {
    fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome> {
        let url = self.endpoint.documents_url();
        let request = ProxyRequest::post_form(UploadForm::for_raster(name, raster))
            .header("Accept", "application/json");
        Box::pin(async move {
            match self.proxy.fetch(&url, request).await {
                Ok(response) => interpret_upload_reply(response.status, &response.body),
                Err(e) => {
                    log::error!("Relayed upload to {} failed: {}", url, e);
                    SaveOutcome::Error(e.to_string())
                }
            }
        })
    }
}
