//! Durable verified records.
//!
//! Everything lives in one key-value namespace: the record itself under
//! `contract:<address>` and an empty marker under
//! `verified_at:<time>:<address>`, where the time is zero padded so that
//! lexicographic key order is chronological order.

mod database;
mod in_memory;
mod kv_storage;

pub use database::DatabaseStore;
pub use in_memory::InMemoryStore;

use crate::{types::VerificationRecord, ClientError, Error};
use async_trait::async_trait;
use ethers_core::types::Address;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("stored record is corrupted: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid index key: {0}")]
    CorruptedKey(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `Ok(None)` if the address was never verified.
    async fn get(&self, address: Address) -> Result<Option<VerificationRecord>, StoreError>;

    /// Stores the record together with its time index entry, atomically.
    /// Returns `false` and writes nothing if the address already has a
    /// record.
    async fn put(&self, record: &VerificationRecord) -> Result<bool, StoreError>;

    /// Addresses first verified within `[start, end)`, oldest first.
    async fn range_by_time(&self, start: u64, end: u64) -> Result<Vec<Address>, Error>;
}

const RECORD_PREFIX: &str = "contract:";
const TIME_INDEX_PREFIX: &str = "verified_at:";

fn record_key(address: &Address) -> String {
    format!("{RECORD_PREFIX}{address:?}")
}

fn time_bound(time: u64) -> String {
    format!("{TIME_INDEX_PREFIX}{time:020}")
}

fn time_index_key(time: u64, address: &Address) -> String {
    format!("{}:{address:?}", time_bound(time))
}

fn address_from_index_key(key: &str) -> Result<Address, StoreError> {
    let corrupted = || StoreError::CorruptedKey(key.to_string());
    let address = key
        .strip_prefix(TIME_INDEX_PREFIX)
        .and_then(|rest| rest.get(21..))
        .ok_or_else(corrupted)?;
    Address::from_str(address).map_err(|_| corrupted())
}

fn check_range(start: u64, end: u64) -> Result<(), Error> {
    if start > end {
        return Err(ClientError::InvalidTimeRange { start, end }.into());
    }
    Ok(())
}


/// Store behavior shared by every backend.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use crate::types::VerificationContext;
    use pretty_assertions::assert_eq;

    pub fn record(address_byte: u8, time: u64) -> VerificationRecord {
        VerificationRecord {
            context: VerificationContext {
                contract_address: Address::repeat_byte(address_byte),
                contract_name: "Storage".to_string(),
                flattened_source: "contract Storage {}".to_string(),
                compiler_version: "v0.8.10+commit.fc410830".to_string(),
                optimization_used: true,
                runs: Some(200),
                constructor_signature: String::new(),
                constructor_arguments: vec![],
                evm_version: None,
            },
            abi: "[]".to_string(),
            first_verified_time: time,
        }
    }

    pub async fn get_and_put(store: &dyn RecordStore) {
        let record = record(1, 100);
        let address = record.context.contract_address;

        assert_eq!(store.get(address).await.unwrap(), None);
        assert!(store.put(&record).await.unwrap());
        assert_eq!(store.get(address).await.unwrap(), Some(record));
    }

    pub async fn first_writer_wins(store: &dyn RecordStore) {
        let first = record(2, 100);
        let mut second = record(2, 200);
        second.context.flattened_source = "contract Other {}".to_string();

        assert!(store.put(&first).await.unwrap());
        assert!(!store.put(&second).await.unwrap());

        let address = first.context.contract_address;
        assert_eq!(store.get(address).await.unwrap(), Some(first));
        // the rejected record must not leave an index entry behind
        assert_eq!(store.range_by_time(150, 300).await.unwrap(), vec![]);
    }

    pub async fn range_query(store: &dyn RecordStore) {
        for (byte, time) in [(0x30, 30), (0x10, 10), (0x20, 20)] {
            assert!(store.put(&record(byte, time)).await.unwrap());
        }

        assert_eq!(
            store.range_by_time(10, 30).await.unwrap(),
            vec![Address::repeat_byte(0x10), Address::repeat_byte(0x20)]
        );
        assert_eq!(
            store.range_by_time(0, u64::MAX).await.unwrap(),
            vec![
                Address::repeat_byte(0x10),
                Address::repeat_byte(0x20),
                Address::repeat_byte(0x30)
            ]
        );
        assert_eq!(store.range_by_time(20, 20).await.unwrap(), vec![]);

        let err = store.range_by_time(5, 1).await.unwrap_err();
        assert!(err.is_client(), "{err:?}");
    }
}
