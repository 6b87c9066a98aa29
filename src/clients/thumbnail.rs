use anyhow::{Context, Result, bail};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ThumbnailClient {
    client: Client,
}

impl ThumbnailClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vigga/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "Fetching thumbnail");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request thumbnail: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Thumbnail request failed with status {status}");
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read thumbnail body")?;
        Ok(bytes.to_vec())
    }

    /// Downloads the thumbnail to `path`, returning the number of bytes written.
    pub async fn save(&self, url: &str, path: &Path) -> Result<usize> {
        let bytes = self.fetch(url).await?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, &bytes)
            .await
            .with_context(|| format!("Failed to write thumbnail to {}", path.display()))?;

        info!(path = %path.display(), bytes = bytes.len(), "Thumbnail saved");
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single request with `status` and `body`, returning the URL to hit.
    async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();

            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/thumb.jpg")
    }

    #[tokio::test]
    async fn test_save_writes_body() {
        let url = serve_once("200 OK", b"\xff\xd8\xff\xe0jpeg-bytes").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covers").join("thumb.jpg");

        let client = ThumbnailClient::new().unwrap();
        let written = client.save(&url, &path).await.unwrap();

        assert_eq!(written, 14);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let url = serve_once("404 Not Found", b"missing").await;

        let client = ThumbnailClient::new().unwrap();
        let err = client.fetch(&url).await.unwrap_err();

        assert!(err.to_string().contains("404"), "unexpected error: {err}");
    }
}
