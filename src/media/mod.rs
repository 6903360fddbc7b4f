use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Fetches the media bytes at `url`, enforcing `max_bytes`. The declared
/// Content-Length is checked up front, but the streamed byte count is what
/// actually enforces the cap.
pub async fn download(url: &str, max_bytes: u64, timeout: Duration) -> Result<Vec<u8>> {
    info!("Downloading media from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch media URL")?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "Failed to download media: HTTP {}",
            response.status()
        ));
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return Err(anyhow::anyhow!(
                "Media is {} bytes, over the {} byte limit",
                length,
                max_bytes
            ));
        }
    }

    let mut data = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read media data")?
    {
        if (data.len() + chunk.len()) as u64 > max_bytes {
            return Err(anyhow::anyhow!(
                "Media exceeded the {} byte limit while downloading",
                max_bytes
            ));
        }
        data.extend_from_slice(&chunk);
    }

    debug!("Downloaded {} bytes", data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const TIMEOUT: Duration = Duration::from_secs(5);

    // Serves one connection with the given body; optionally omits the
    // Content-Length header so the client only learns the size by reading.
    async fn spawn_stub(body: Vec<u8>, declare_length: bool) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let header = if declare_length {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    )
                } else {
                    "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string()
                };

                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_download_within_cap() {
        let url = spawn_stub(vec![0x42; 1024], true).await;
        let data = download(&url, 4096, TIMEOUT).await.unwrap();
        assert_eq!(data.len(), 1024);
        assert!(data.iter().all(|b| *b == 0x42));
    }

    #[tokio::test]
    async fn test_declared_length_over_cap_is_rejected() {
        let url = spawn_stub(vec![0x42; 2048], true).await;
        let err = download(&url, 1024, TIMEOUT).await.unwrap_err();
        assert!(err.to_string().contains("over the 1024 byte limit"));
    }

    #[tokio::test]
    async fn test_streamed_overflow_is_rejected_without_declared_length() {
        let url = spawn_stub(vec![0x42; 2048], false).await;
        let err = download(&url, 1024, TIMEOUT).await.unwrap_err();
        assert!(err.to_string().contains("exceeded the 1024 byte limit"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    )
                    .await;
            }
        });

        let err = download(&format!("http://{}", addr), 1024, TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
