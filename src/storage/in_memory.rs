use super::{
    address_from_index_key, check_range, record_key, time_bound, time_index_key, RecordStore,
    StoreError,
};
use crate::{types::VerificationRecord, Error};
use async_trait::async_trait;
use ethers_core::types::Address;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Keeps records in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, address: Address) -> Result<Option<VerificationRecord>, StoreError> {
        let entries = self.entries.lock();
        entries
            .get(&record_key(&address))
            .map(|value| serde_json::from_str(value))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, record: &VerificationRecord) -> Result<bool, StoreError> {
        let address = record.context.contract_address;
        let value = serde_json::to_string(record)?;

        let mut entries = self.entries.lock();
        let key = record_key(&address);
        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, value);
        entries.insert(
            time_index_key(record.first_verified_time, &address),
            String::new(),
        );
        Ok(true)
    }

    async fn range_by_time(&self, start: u64, end: u64) -> Result<Vec<Address>, Error> {
        check_range(start, end)?;
        let entries = self.entries.lock();
        entries
            .range(time_bound(start)..time_bound(end))
            .map(|(key, _)| address_from_index_key(key).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;

    #[tokio::test]
    async fn get_and_put() {
        conformance::get_and_put(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn first_writer_wins() {
        conformance::first_writer_wins(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn range_query() {
        conformance::range_query(&InMemoryStore::new()).await;
    }
}
