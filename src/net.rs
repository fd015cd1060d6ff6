//! Blocking HTTP client shared by the source adapters

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::config::AppConfig;
use crate::error::{EpgError, Result};

/// Read chunk size (bytes)
const CHUNK_SIZE: usize = 64 * 1024;

/// ureq agent plus the user agent string sent with every request.
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(read_timeout))
            .timeout_connect(Some(connect_timeout))
            .max_idle_connections(4)
            .max_idle_connections_per_host(2)
            .build()
            .new_agent();

        Self {
            agent,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.connect_timeout(), config.read_timeout(), &config.user_agent)
    }

    /// GET a URL and return the whole body
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| call_error(url, e))?;

        let mut reader = response.into_body().into_reader();
        let mut body = Vec::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break, // EOF
                Ok(n) => body.extend_from_slice(&buffer[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(EpgError::timeout(format!("reading {}", url)));
                }
                Err(e) => return Err(EpgError::fetch(url, format!("Read failed: {}", e))),
            }
        }

        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body)
    }

    /// GET a URL as text (invalid UTF-8 is replaced)
    pub fn get_text(&self, url: &str) -> Result<String> {
        let body = self.get_bytes(url)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn call_error(url: &str, e: ureq::Error) -> EpgError {
    match e {
        ureq::Error::Timeout(_) => EpgError::timeout(format!("GET {}", url)),
        ureq::Error::StatusCode(status) => EpgError::fetch(url, format!("HTTP error: {}", status)),
        other => EpgError::fetch(url, format!("Request failed: {}", other)),
    }
}
