use super::{
    address_from_index_key, check_range, kv_storage, record_key, time_bound, time_index_key,
    RecordStore, StoreError,
};
use crate::{types::VerificationRecord, Error};
use async_trait::async_trait;
use ethers_core::types::Address;
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, ConnectionTrait, Database,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Schema,
    TransactionTrait,
};

/// Records kept in the `kv_storage` table of a SQLite or PostgreSQL database.
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(url).await?;
        Self::new(db).await
    }

    /// Creates the table if it does not exist yet.
    pub async fn new(db: DatabaseConnection) -> Result<Self, StoreError> {
        let backend = db.get_database_backend();
        let mut create_table = Schema::new(backend).create_table_from_entity(kv_storage::Entity);
        create_table.if_not_exists();
        db.execute(backend.build(&create_table)).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl RecordStore for DatabaseStore {
    async fn get(&self, address: Address) -> Result<Option<VerificationRecord>, StoreError> {
        let model = kv_storage::Entity::find_by_id(record_key(&address))
            .one(&self.db)
            .await?;
        model
            .map(|model| serde_json::from_str(&model.value))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, record: &VerificationRecord) -> Result<bool, StoreError> {
        let address = record.context.contract_address;
        let value = serde_json::to_string(record)?;

        let txn = self.db.begin().await?;
        let inserted = kv_storage::Entity::insert(kv_storage::ActiveModel {
            key: Set(record_key(&address)),
            value: Set(value),
        })
        .on_conflict(
            OnConflict::column(kv_storage::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        kv_storage::Entity::insert(kv_storage::ActiveModel {
            key: Set(time_index_key(record.first_verified_time, &address)),
            value: Set(String::new()),
        })
        .exec_without_returning(&txn)
        .await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn range_by_time(&self, start: u64, end: u64) -> Result<Vec<Address>, Error> {
        check_range(start, end)?;
        let keys: Vec<String> = kv_storage::Entity::find()
            .select_only()
            .column(kv_storage::Column::Key)
            .filter(kv_storage::Column::Key.gte(time_bound(start)))
            .filter(kv_storage::Column::Key.lt(time_bound(end)))
            .order_by_asc(kv_storage::Column::Key)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(StoreError::from)?;

        keys.iter()
            .map(|key| address_from_index_key(key).map_err(Error::from))
            .collect()
    }
}
