use std::future::Future;

use serde_json::Value;

use crate::{auth::Session, filter::QueryFilter, record::Record, Error, Result};

/// Executes one search query. Implementations perform a single round trip,
/// don't retry and don't interpret how many records came back.
pub trait SearchExecutor: Send + Sync {
    fn search(&self, filter: &QueryFilter) -> impl Future<Output = Result<Vec<Record>>> + Send;
}

/// Fetches the full document of a single record.
pub trait DetailFetcher: Send + Sync {
    fn fetch(&self, id: u64) -> impl Future<Output = Result<Value>> + Send;
}

/// Search and detail endpoints of the live service.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    session: Session,
    id_field: String,
}

impl HttpExecutor {
    pub fn new(session: Session, id_field: impl Into<String>) -> Self {
        Self {
            session,
            id_field: id_field.into(),
        }
    }

    /// Sends the request and turns a non-success status into an error.
    async fn send(&self, req: reqwest::RequestBuilder, url: String) -> Result<reqwest::Response> {
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status { status, url });
        }
        Ok(res)
    }
}

impl SearchExecutor for HttpExecutor {
    async fn search(&self, filter: &QueryFilter) -> Result<Vec<Record>> {
        let url = format!("{}/pflichtenheft/search", self.session.endpoint);
        let req = self.session.client.post(&url).json(&filter.to_body());
        let values: Vec<Value> = self.send(req, url).await?.json().await?;
        values
            .into_iter()
            .map(|value| Record::from_value(value, &self.id_field))
            .collect()
    }
}

impl DetailFetcher for HttpExecutor {
    async fn fetch(&self, id: u64) -> Result<Value> {
        let url = format!("{}/pflichtenheft/{id}", self.session.endpoint);
        let req = self.session.client.get(&url);
        Ok(self.send(req, url).await?.json().await?)
    }
}
