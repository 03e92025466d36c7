//! Upload straight to the document collection.

use super::{PersistenceSink, SaveOutcome, interpret_upload_reply};
use crate::collection::CollectionClient;
use crate::raster::RasterBlob;
use crate::transport::{BoxFuture, Endpoint, TransportResult, UploadForm};

/// Posts the raster as a multipart `file` to the site's documents.
#[derive(Clone)]
pub struct RemoteCollectionUpload {
    client: CollectionClient,
}

impl RemoteCollectionUpload {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            client: CollectionClient::new(endpoint),
        }
    }

    /// Share the HTTP client and credentials of an existing collection client.
    pub fn from_client(client: CollectionClient) -> Self {
        Self { client }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.client.endpoint()
    }

    async fn upload(&self, url: &str, form: UploadForm) -> TransportResult<(u16, Vec<u8>)> {
        let response = self
            .client
            .request(reqwest::Method::POST, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form.into_multipart()?)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}

impl PersistenceSink for RemoteCollectionUpload {
    fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome> {
        let url = self.endpoint().documents_url();
        let form = UploadForm::for_raster(name, raster);
        Box::pin(async move {
            log::info!("Uploading {} ({} bytes) to {}", form.file_name, form.bytes.len(), url);
            match self.upload(&url, form).await {
                Ok((status, body)) => interpret_upload_reply(status, &body),
                Err(e) => {
                    log::error!("Upload to {} failed: {}", url, e);
                    SaveOutcome::Error(e.to_string())
                }
            }
        })
    }
}
