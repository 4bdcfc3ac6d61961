// HTTP session
//
// Wraps `reqwest::Client` with a private cookie jar and the anti-forgery
// headers harvested before login. One session lives between a login and
// the matching close; dropping it discards every cookie it collected.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Anti-forgery cookies the web tier may set, and the header each is echoed in.
const ANTI_FORGERY: [(&str, &str); 2] = [("XSRF-TOKEN", "X-XSRF-TOKEN"), ("_csrf", "X-CSRFToken")];

const BODY_PREVIEW: usize = 200;

/// A cookie-backed HTTP session against one server.
pub struct HttpSession {
    http: reqwest::Client,
    jar: Arc<Jar>,
    /// Header name → token, applied to every POST once harvested.
    anti_forgery: Vec<(&'static str, String)>,
}

impl HttpSession {
    /// Open a fresh session with an empty cookie jar.
    pub fn open(transport: &TransportConfig) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let http = transport.build_client(Arc::clone(&jar))?;
        Ok(Self {
            http,
            jar,
            anti_forgery: Vec::new(),
        })
    }

    /// Issue an unauthenticated GET against the web tier root so the server
    /// hands out its anti-forgery cookies, then remember them as headers.
    ///
    /// The status of the GET is irrelevant; only the cookies matter.
    pub async fn harvest_anti_forgery(&mut self, base_url: &str) -> Result<(), Error> {
        let url = Url::parse(base_url)?;
        debug!("priming session at {}", url);

        let resp = self.http.get(url.clone()).send().await?;
        trace!(status = %resp.status(), "priming response");

        self.anti_forgery = self
            .cookie_header(&url)
            .map(|header| anti_forgery_headers(&header))
            .unwrap_or_default();

        if !self.anti_forgery.is_empty() {
            debug!(
                headers = ?self.anti_forgery.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
                "anti-forgery tokens harvested"
            );
        }
        Ok(())
    }

    /// The `Cookie` header value this session would send to `url`.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.jar.cookies(url)?;
        cookies.to_str().ok().map(String::from)
    }

    /// Names of the anti-forgery headers currently applied to requests.
    pub fn anti_forgery_header_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.anti_forgery.iter().map(|(name, _)| *name)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a JSON body and decode the JSON response.
    ///
    /// Non-success statuses become [`Error::Status`]; nothing is retried.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, Error> {
        let url = Url::parse(url)?;
        debug!("POST {}", url);

        let mut builder = self
            .http
            .post(url.clone())
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .json(body);
        for (name, token) in &self.anti_forgery {
            builder = builder.header(*name, token.as_str());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: preview(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&text)),
            body: text,
        })
    }

    /// GET a binary payload (file service downloads).
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: preview(&text),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Pick the anti-forgery tokens out of a `Cookie` header value.
fn anti_forgery_headers(cookie_header: &str) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();
    for pair in cookie_header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if let Some((_, header)) = ANTI_FORGERY.iter().find(|(cookie, _)| *cookie == name) {
            headers.push((*header, value.to_owned()));
        }
    }
    headers
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW).collect()
}
