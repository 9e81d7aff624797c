use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use replygen_common::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One decoded unit of the server's newline-delimited JSON output. An
/// absent `response` field is an empty fragment, not an error.
#[derive(Debug, Deserialize)]
pub struct ResponseChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Decode one line of the stream. Blank lines decode to `None` and do not
/// affect the aggregate; a malformed line fails the whole call.
pub fn decode_line(line: &[u8]) -> Result<Option<ResponseChunk>> {
    let trimmed = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| {
            let end = line.iter().rposition(|b| !b.is_ascii_whitespace()).unwrap() + 1;
            &line[start..end]
        });

    let Some(trimmed) = trimmed else {
        return Ok(None);
    };

    let chunk = serde_json::from_slice(trimmed)
        .map_err(|e| Error::StreamDecode(format!("invalid chunk: {}", e)))?;
    Ok(Some(chunk))
}

/// Issues the generation call to the inference server's streaming endpoint
/// and reassembles the chunked output into one string.
pub struct GenerationProxy {
    client: Client,
    base_url: String,
    model: String,
}

impl GenerationProxy {
    pub fn new(base_url: String, model: String, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe the server's model-list endpoint; used to await readiness
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Stream a generation and return the aggregated text: the exact
    /// in-order concatenation of every chunk's fragment. Returns only after
    /// the stream is fully consumed; on any failure the partial aggregate is
    /// discarded and never surfaced.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateBody {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut aggregated = String::new();
        let mut chunk_count = 0u64;
        let mut done = false;

        'read: while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;
            buffer.extend_from_slice(&bytes);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(chunk) = decode_line(&line)? {
                    aggregated.push_str(&chunk.response);
                    chunk_count += 1;
                    if chunk.done {
                        done = true;
                        break 'read;
                    }
                }
            }
        }

        // A final chunk may arrive without a trailing newline
        if !done {
            if let Some(chunk) = decode_line(&buffer)? {
                aggregated.push_str(&chunk.response);
                chunk_count += 1;
            }
        }

        debug!("Aggregated {} chunks into {} bytes", chunk_count, aggregated.len());
        Ok(aggregated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_with_fragment() {
        let chunk = decode_line(br#"{"response":"Hello","done":false}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.response, "Hello");
        assert!(!chunk.done);
    }

    #[test]
    fn test_decode_line_missing_response_field() {
        let chunk = decode_line(br#"{"done":true}"#).unwrap().unwrap();
        assert_eq!(chunk.response, "");
        assert!(chunk.done);
    }

    #[test]
    fn test_decode_line_empty_object() {
        let chunk = decode_line(b"{}").unwrap().unwrap();
        assert_eq!(chunk.response, "");
        assert!(!chunk.done);
    }

    #[test]
    fn test_decode_blank_lines_skipped() {
        assert!(decode_line(b"").unwrap().is_none());
        assert!(decode_line(b"\n").unwrap().is_none());
        assert!(decode_line(b"  \r\n").unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_line_fails() {
        let result = decode_line(b"not json\n");
        assert!(matches!(result, Err(Error::StreamDecode(_))));
    }

    #[test]
    fn test_fold_preserves_order_and_empty_fragments() {
        let lines: [&[u8]; 4] = [
            br#"{"response":"Hello"}"#,
            b"",
            br#"{"response":" world"}"#,
            b"{}",
        ];

        let mut aggregated = String::new();
        for line in lines {
            if let Some(chunk) = decode_line(line).unwrap() {
                aggregated.push_str(&chunk.response);
            }
        }
        assert_eq!(aggregated, "Hello world");
    }

    #[tokio::test]
    async fn test_generate_unreachable_server() {
        // Bind then drop a listener so the port is closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy = GenerationProxy::new(
            format!("http://127.0.0.1:{}", port),
            "mistral".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let result = proxy.generate("hello").await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_is_reachable_false_when_closed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy = GenerationProxy::new(
            format!("http://127.0.0.1:{}", port),
            "mistral".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!proxy.is_reachable().await);
    }
}
