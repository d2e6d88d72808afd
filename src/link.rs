use panelforge_common::{Error, Result, Transport};
use reqwest::{
    Url,
    blocking::{Client as RequestClient, Response},
    header::CACHE_CONTROL,
};
use std::{io::Read, time::Duration};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A `/state` body for a 128x128 panel is ~65 KiB of base64.
const MAX_BODY: u64 = 1 << 20;

fn transport(error: reqwest::Error) -> Error {
    match error.status() {
        Some(status) => Error::Status(status.as_u16()),
        None => Error::Transport(Box::new(error)),
    }
}

/// Parse a device address, defaulting to `http://` when no scheme is given.
pub fn parse_base(raw: &str) -> Result<Url> {
    let invalid = || Error::InvalidAddress(raw.to_owned());

    let trimmed = raw.trim();
    let url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    }
    .map_err(|_| invalid())?;

    if url.scheme() != "http" || url.host_str().is_none() {
        return Err(invalid());
    }

    Ok(url)
}

/// Blocking client, so a request holds the runtime thread until it completes
/// or times out. Playback is a single task and waits on each frame anyway.
pub struct HttpLink {
    client: RequestClient,
    base: String,
}

impl HttpLink {
    pub fn new(base: &Url) -> Result<Self> {
        let client = RequestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_owned(),
        })
    }

    /// Address without a trailing slash; request paths are appended to it.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn read_body(response: Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        response
            .take(MAX_BODY + 1)
            .read_to_end(&mut body)
            .map_err(|error| Error::Transport(Box::new(error)))?;

        if body.len() as u64 > MAX_BODY {
            return Err(Error::malformed(format!("body exceeds {MAX_BODY} bytes")));
        }

        Ok(body)
    }
}

impl Transport for HttpLink {
    async fn get(&mut self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{path}", self.base);
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .and_then(Response::error_for_status)
            .map_err(transport)?;

        let body = Self::read_body(response)?;
        trace!(path, bytes = body.len(), "response received");
        Ok(body)
    }
}
