//! Display interface over the Pixoo's local HTTP API
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};

use crate::http::HttpClient;

/// JSON command transport to one Pixoo
pub struct DisplayInterface<C> {
    client: C,
    /// `http://{host}`
    base_url: String,
}

impl<C> DisplayInterface<C> {
    /// `host` is an address with optional port, e.g. `192.168.1.50`
    pub fn new(client: C, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        let base_url = if host.contains("://") {
            host.to_owned()
        } else {
            format!("http://{}", host)
        };
        DisplayInterface { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl<C> DisplayInterface<C>
where
    C: HttpClient,
{
    /// Liveness probe, `GET /get` must answer 200
    pub(crate) fn probe(&mut self) -> Result<()> {
        let url = format!("{}/get", self.base_url);
        let response = self
            .client
            .get(&url)
            .with_context(|| format!("Pixoo at {} unreachable", self.base_url))?;
        if !response.is_ok() {
            bail!("Pixoo liveness probe answered {}", response.status);
        }
        Ok(())
    }

    /// Send one command envelope, `params` must be a JSON object or null.
    ///
    /// Returns the reply object; a non-zero `error_code` is an error.
    pub(crate) fn cmd(&mut self, command: &str, params: Value) -> Result<Value> {
        let mut envelope = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => bail!("{} parameters must be an object, got {}", command, other),
        };
        envelope.insert("Command".to_owned(), Value::from(command));
        let body = serde_json::to_vec(&envelope)?;

        let url = format!("{}/post", self.base_url);
        let response = self
            .client
            .post(&url, &body)
            .with_context(|| format!("{} to {}", command, self.base_url))?;
        if !response.is_ok() {
            bail!("{} answered HTTP {}", command, response.status);
        }

        let reply: Value = serde_json::from_slice(&response.body)
            .with_context(|| format!("{} reply is not JSON", command))?;
        match reply.get("error_code").and_then(Value::as_i64) {
            None | Some(0) => Ok(reply),
            Some(code) => Err(anyhow!("{} rejected with error_code {}", command, code)),
        }
    }
}
