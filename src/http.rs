//! Blocking HTTP seam shared by the Nightscout poller and the Pixoo interface

use anyhow::Result;

/// Status and body of a finished request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Minimal blocking HTTP client
pub trait HttpClient {
    /// `GET url`, asking for JSON
    fn get(&mut self, url: &str) -> Result<Response>;

    /// `POST url` with a JSON body
    fn post(&mut self, url: &str, body: &[u8]) -> Result<Response>;
}

impl<C: HttpClient + ?Sized> HttpClient for &mut C {
    fn get(&mut self, url: &str) -> Result<Response> {
        (**self).get(url)
    }

    fn post(&mut self, url: &str, body: &[u8]) -> Result<Response> {
        (**self).post(url, body)
    }
}

#[cfg(feature = "esp32")]
pub use esp::EspHttpClient;

#[cfg(feature = "esp32")]
mod esp {
    use anyhow::{Context, Result};
    use embedded_svc::http::client::Client;
    use embedded_svc::http::{Method, Status};
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

    use super::{HttpClient, Response};

    const READ_CHUNK: usize = 1024;

    /// [`HttpClient`] over the ESP-IDF HTTP client.
    ///
    /// No CA bundle is attached; with `CONFIG_ESP_TLS_INSECURE` and
    /// `CONFIG_ESP_TLS_SKIP_SERVER_CERT_VERIFY` from `sdkconfig.defaults`
    /// HTTPS servers are accepted without certificate validation.
    pub struct EspHttpClient {
        client: Client<EspHttpConnection>,
    }

    impl EspHttpClient {
        pub fn new() -> Result<Self> {
            let connection = EspHttpConnection::new(&Configuration {
                use_global_ca_store: false,
                crt_bundle_attach: None,
                ..Default::default()
            })
            .context("Could not create HTTP connection")?;

            Ok(Self {
                client: Client::wrap(connection),
            })
        }
    }

    fn read_body<R: Read>(response: &mut R) -> Result<Vec<u8>>
    where
        R::Error: std::error::Error + Send + Sync + 'static,
    {
        let mut body = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let read = response.read(&mut chunk)?;
            if read == 0 {
                return Ok(body);
            }
            body.extend_from_slice(&chunk[..read]);
        }
    }

    impl HttpClient for EspHttpClient {
        fn get(&mut self, url: &str) -> Result<Response> {
            let headers = [("accept", "application/json")];
            let request = self
                .client
                .request(Method::Get, url, &headers)
                .with_context(|| format!("GET {}", url))?;
            let mut response = request.submit()?;
            let status = response.status();
            let body = read_body(&mut response)?;
            Ok(Response { status, body })
        }

        fn post(&mut self, url: &str, body: &[u8]) -> Result<Response> {
            let content_length = body.len().to_string();
            let headers = [
                ("content-type", "application/json"),
                ("content-length", content_length.as_str()),
            ];
            let mut request = self
                .client
                .post(url, &headers)
                .with_context(|| format!("POST {}", url))?;
            request.write_all(body)?;
            request.flush()?;
            let mut response = request.submit()?;
            let status = response.status();
            let body = read_body(&mut response)?;
            Ok(Response { status, body })
        }
    }
}
