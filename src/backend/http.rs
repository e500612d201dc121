use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::scene::NodeId;

use super::{AnalyticsSource, BackendError, PathFinder, PathResponse, from_object};

pub struct HttpSource {
    base: Url,
    client: Client,
}

impl HttpSource {
    pub fn new(base: Url) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(format!("netgraph-lens/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| BackendError::Request {
                url: base.to_string(),
                source,
            })?;

        Ok(Self { base, client })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, BackendError> {
        self.base
            .join(endpoint)
            .map_err(|error| BackendError::InvalidUrl {
                url: format!("{}{endpoint}", self.base),
                reason: error.to_string(),
            })
    }

    fn get_json(&self, url: Url) -> Result<Value, BackendError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| BackendError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| BackendError::Request {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| BackendError::MalformedPayload {
            origin: url.to_string(),
            source,
        })
    }
}

impl PathFinder for HttpSource {
    fn find_path(&self, start: &NodeId, end: &NodeId) -> Result<PathResponse, BackendError> {
        let mut url = self.endpoint_url("path")?;
        url.query_pairs_mut()
            .append_pair("start", start.as_str())
            .append_pair("end", end.as_str());

        let origin = url.to_string();
        let value = self.get_json(url)?;
        from_object(value).map_err(|source| BackendError::MalformedPayload { origin, source })
    }
}

impl AnalyticsSource for HttpSource {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    fn fetch_json(&self, endpoint: &str) -> Result<Value, BackendError> {
        let url = self.endpoint_url(endpoint)?;
        self.get_json(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> HttpSource {
        HttpSource::new(Url::parse(base).expect("url")).expect("client")
    }

    #[test]
    fn endpoints_resolve_against_the_base() {
        let source = source("http://127.0.0.1:5000/");
        assert_eq!(
            source.endpoint_url("api/messages_pagerank").expect("url").as_str(),
            "http://127.0.0.1:5000/api/messages_pagerank"
        );
    }

    #[test]
    fn nested_base_paths_are_kept() {
        let source = source("http://example.test/netgraph/");
        assert_eq!(
            source.endpoint_url("api/hits").expect("url").as_str(),
            "http://example.test/netgraph/api/hits"
        );
    }
}
