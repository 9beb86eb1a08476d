//! Blocking HTTP transport for the OMDb API.

use super::{MetadataRetrievalError, Transport};
use std::time::Duration;
use tracing::debug;

/// Transport backed by a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with the given per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MetadataRetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataRetrievalError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, params: &[(&str, String)]) -> Result<String, MetadataRetrievalError> {
        // Never log the key
        debug!(
            params = ?params.iter().filter(|(k, _)| *k != "apikey").collect::<Vec<_>>(),
            "GET {}",
            self.base_url
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .map_err(|e| MetadataRetrievalError::Transport(e.without_url().to_string()))?;

        // Ensure request was successful
        if !response.status().is_success() {
            return Err(MetadataRetrievalError::Transport(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .text()
            .map_err(|e| MetadataRetrievalError::Transport(e.without_url().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const SECRET_KEY: &str = "s3cr3t-key";

    /// Serves one canned HTTP response on a local port and returns the
    /// base URL plus a handle yielding the raw request head.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buffer).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    fn params() -> Vec<(&'static str, String)> {
        vec![
            ("apikey", SECRET_KEY.to_string()),
            ("i", "tt0903747".to_string()),
            ("Season", "1".to_string()),
        ]
    }

    #[test]
    fn test_get_returns_body_and_sends_params() {
        let (base_url, server) = serve_once(concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 19\r\n",
            "Connection: close\r\n\r\n",
            "{\"Response\":\"True\"}",
        ));
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5)).unwrap();

        let body = transport.get(&params()).unwrap();
        let request = server.join().unwrap();

        assert_eq!(body, "{\"Response\":\"True\"}");
        assert!(request.starts_with("GET /?"));
        assert!(request.contains("i=tt0903747"));
        assert!(request.contains("Season=1"));
    }

    #[test]
    fn test_non_success_status_is_transport_error() {
        let (base_url, server) = serve_once(concat!(
            "HTTP/1.1 503 Service Unavailable\r\n",
            "Content-Length: 0\r\n",
            "Connection: close\r\n\r\n",
        ));
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5)).unwrap();

        let result = transport.get(&params());
        server.join().unwrap();

        match result {
            Err(MetadataRetrievalError::Transport(message)) => {
                assert_eq!(message, "HTTP 503 Service Unavailable");
            }
            other => panic!("Expected a transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_error_does_not_leak_api_key() {
        // Bind and release a port so nothing listens on it
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(&base_url, Duration::from_secs(5)).unwrap();

        match transport.get(&params()) {
            Err(MetadataRetrievalError::Transport(message)) => {
                assert!(!message.contains(SECRET_KEY), "key leaked: {}", message);
                assert!(!message.contains("apikey"), "url leaked: {}", message);
            }
            other => panic!("Expected a transport error, got {:?}", other),
        }
    }
}
