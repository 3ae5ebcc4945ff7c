use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, ClientBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::base::{RecordStore, StoreError, StoreResult};
use super::types::{BatchUnit, PlayerRecord};

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0/";
pub const MAX_RECORDS_PER_UPDATE: usize = 10;

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_url: Url,
    pub token: String,
    pub base_id: String,
    pub table_id: String,
    pub view: Option<String>,
    pub link_field: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRecord<'a> {
    id: &'a str,
    fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    records: Vec<UpdateRecord<'a>>,
}

#[derive(Clone)]
pub struct AirtableStore {
    client: Client,
    config: AirtableConfig,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig) -> StoreResult<Self> {
        let client = ClientBuilder::new().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AirtableConfig {
        &self.config
    }

    /// Formula selecting records whose profile link column is set.
    pub fn filter_formula(&self) -> String {
        let field = &self.config.link_field;
        format!("AND({{{field}}} != '', {{{field}}} != BLANK())")
    }

    fn table_url(&self, table_id: &str) -> StoreResult<Url> {
        self.config
            .api_url
            .join(&format!("{}/{}", self.config.base_id, table_id))
            .map_err(|e| StoreError::Operation(format!("invalid table URL: {e}")))
    }

    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn list_page(&self, offset: Option<&str>) -> StoreResult<ListResponse> {
        let mut query: Vec<(&str, String)> = vec![("filterByFormula", self.filter_formula())];
        if let Some(view) = &self.config.view {
            query.push(("view", view.clone()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.table_url(&self.config.table_id)?)
            .bearer_auth(&self.config.token)
            .query(&query)
            .send()
            .await?;

        Self::check(response)
            .await?
            .json::<ListResponse>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn record_url(&self, table_id: &str, record_id: &str) -> StoreResult<Url> {
        let url = self.table_url(table_id)?;
        Url::parse(&format!("{}/{}", url.as_str().trim_end_matches('/'), record_id))
            .map_err(|e| StoreError::Operation(format!("invalid record URL: {e}")))
    }

    pub async fn get_record(&self, table_id: &str, record_id: &str) -> StoreResult<AirtableRecord> {
        let response = self
            .client
            .get(self.record_url(table_id, record_id)?)
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        Self::check(response)
            .await?
            .json::<AirtableRecord>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn update_record(
        &self,
        table_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<()> {
        let response = self
            .client
            .patch(self.record_url(table_id, record_id)?)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn update_records(
        &self,
        table_id: &str,
        records: Vec<(&str, Map<String, Value>)>,
    ) -> StoreResult<()> {
        let body = UpdateRequest {
            records: records
                .into_iter()
                .map(|(id, fields)| UpdateRecord { id, fields })
                .collect(),
        };

        let response = self
            .client
            .patch(self.table_url(table_id)?)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn eligible_records(&self) -> StoreResult<Vec<PlayerRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.list_page(offset.as_deref()).await?;
            debug!(
                "Fetched page of {} records (more: {})",
                page.records.len(),
                page.offset.is_some()
            );

            records.extend(page.records.iter().map(|record| {
                PlayerRecord::from_store_fields(&record.id, &record.fields, &self.config.link_field)
            }));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        info!("Loaded {} records from table {}", records.len(), self.config.table_id);
        Ok(records)
    }

    async fn update_batch(&self, units: &[BatchUnit]) -> StoreResult<()> {
        if units.is_empty() {
            return Ok(());
        }
        if units.len() > MAX_RECORDS_PER_UPDATE {
            return Err(StoreError::Operation(format!(
                "batch of {} exceeds the {} record limit",
                units.len(),
                MAX_RECORDS_PER_UPDATE
            )));
        }

        let records = units
            .iter()
            .map(|unit| (unit.record_id.as_str(), unit.fields.to_store_fields()))
            .collect();
        self.update_records(&self.config.table_id, records).await
    }

    fn max_batch_size(&self) -> usize {
        MAX_RECORDS_PER_UPDATE
    }
}
