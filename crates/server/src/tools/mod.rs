//! MCP tool implementations.
//!
//! This module contains all tools exposed by the roost server.

pub mod cache_clear;
pub mod cache_stats;
pub mod offline_mode;
pub mod search;

pub use cache_clear::{CacheClearParams, clear_impl};
pub use cache_stats::{CacheStatsParams, stats_impl};
pub use offline_mode::{OfflineModeParams, offline_impl};
pub use search::{SearchParams, search_impl};

#[cfg(test)]
pub(crate) mod test_support {
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Decode the JSON text of a tool's first content block.
    pub(crate) fn output_json<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }

    /// Serves `body` as an image to a single GET request after `delay`. Returns the image URL.
    pub(crate) async fn serve_image_after(body: &'static [u8], delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            tokio::time::sleep(delay).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}/pictures/1.jpg")
    }
}
