use crate::domain::model::{
    AnalyticsOverview, DisciplineCount, DisciplineRead, ProgramDetailRead, ProgramFilter,
    ProgramRead, SchoolCount, SchoolRead,
};
use crate::utils::error::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin JSON client for the REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn overview(&self) -> Result<AnalyticsOverview> {
        self.get_json("analytics/overview", &[]).await
    }

    pub async fn discipline_counts(&self) -> Result<Vec<DisciplineCount>> {
        self.get_json("analytics/counts/disciplines", &[]).await
    }

    pub async fn school_counts(&self) -> Result<Vec<SchoolCount>> {
        self.get_json("analytics/counts/schools", &[]).await
    }

    pub async fn disciplines(&self) -> Result<Vec<DisciplineRead>> {
        self.get_json("disciplines", &[]).await
    }

    pub async fn schools(&self) -> Result<Vec<SchoolRead>> {
        self.get_json("schools", &[]).await
    }

    pub async fn programs(&self, filter: &ProgramFilter) -> Result<Vec<ProgramRead>> {
        let mut params = vec![("limit", filter.limit.to_string())];
        if filter.offset > 0 {
            params.push(("offset", filter.offset.to_string()));
        }
        if let Some(id) = filter.school_id {
            params.push(("school_id", id.to_string()));
        }
        if let Some(id) = filter.discipline_id {
            params.push(("discipline_id", id.to_string()));
        }
        if let Some(search) = filter.search_term() {
            params.push(("search", search.to_string()));
        }
        self.get_json("programs", &params).await
    }

    pub async fn program(&self, program_id: i64) -> Result<ProgramDetailRead> {
        self.get_json(&format!("programs/{}", program_id), &[]).await
    }
}
