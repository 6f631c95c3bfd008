use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{info, warn};

use crate::common::errors::Error;
use crate::common::Ping;

type Item = HashMap<String, AttributeValue>;

/// Append-only access to recorded pings.
#[async_trait]
pub trait PingStore: Send + Sync {
    async fn put_ping(&self, ping: &Ping) -> Result<(), Error>;

    async fn list_pings(&self) -> Result<Vec<Ping>, Error>;
}

pub struct DynamoPingStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoPingStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl PingStore for DynamoPingStore {
    async fn put_ping(&self, ping: &Ping) -> Result<(), Error> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(ping.clone().into()))
            .send()
            .await
            .map_err(|err| Error::storage("put_item", err))?;

        Ok(())
    }

    async fn list_pings(&self) -> Result<Vec<Ping>, Error> {
        let client = &self.client;
        let table_name = self.table_name.as_str();

        scan_all(table_name, |start_key| async move {
            client
                .scan()
                .table_name(table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|err| Error::storage("scan", err))
        })
        .await
    }
}

/// Walks scan pages until `LastEvaluatedKey` runs out. Malformed items are kept, zero-valued
/// where they don't decode.
async fn scan_all<F, Fut>(table_name: &str, mut fetch_page: F) -> Result<Vec<Ping>, Error>
where
    F: FnMut(Option<Item>) -> Fut,
    Fut: Future<Output = Result<ScanOutput, Error>>,
{
    let mut pings = Vec::new();
    let mut start_key = None;

    loop {
        let output = fetch_page(start_key.take()).await?;

        for item in output.items.unwrap_or_default() {
            if !Ping::is_complete_item(&item) {
                warn!("Malformed item in {}: {:?}", table_name, item);
            }
            pings.push(Ping::from_item(&item));
        }

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    info!("Scanned {} pings from {}", pings.len(), table_name);
    Ok(pings)
}
