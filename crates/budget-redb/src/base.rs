use std::sync::Arc;

use budget_core::{Entity, StoreError};
use redb::{Database, ReadOnlyTable, ReadableTable, Table, TableDefinition};
use uuid::Uuid;

type Bucket = TableDefinition<'static, &'static [u8], &'static [u8]>;

pub type EncodeFn<T> = fn(&T) -> Result<Vec<u8>, serde_json::Error>;
pub type DecodeFn<T> = fn(&[u8]) -> Result<T, serde_json::Error>;

/// Generic entity store over one redb table.
///
/// Entities are keyed by the 16 raw bytes of their id. Every call runs inside
/// exactly one redb transaction, so a failed write leaves the table untouched.
pub struct BaseStore<T> {
    db: Arc<Database>,
    name: &'static str,
    bucket: Bucket,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T: Entity> BaseStore<T> {
    pub fn new(db: Arc<Database>, name: &'static str, encode: EncodeFn<T>, decode: DecodeFn<T>) -> Self {
        Self {
            db,
            name,
            bucket: TableDefinition::new(name),
            encode,
            decode,
        }
    }

    /// Creates the table if needed. Safe to call on every start.
    pub fn init(&self) -> Result<(), StoreError> {
        self.write(|_| Ok(()))?;
        tracing::debug!(table = self.name, "Table initialized");
        Ok(())
    }

    /// Returns the entity stored under `id`, including soft-deleted ones.
    pub fn get_by_id(&self, id: Uuid) -> Result<T, StoreError> {
        self.read(|table| {
            let value = table
                .get(id.as_bytes().as_slice())
                .map_err(|e| StoreError::engine(format!("couldn't read from table {:?}", self.name), e))?;
            match value {
                Some(value) => self.decode(value.value()),
                None => Err(StoreError::not_found::<T>(id)),
            }
        })
    }

    /// Scans the whole table. Entities for which `skip` returns true are
    /// dropped, the rest are passed to `sort`: the key order of the scan is
    /// not meaningful to callers.
    pub fn get_all<S, O>(&self, skip: S, sort: O) -> Result<Vec<T>, StoreError>
    where
        S: Fn(&T) -> bool,
        O: FnOnce(&mut [T]),
    {
        let mut res = self.read(|table| {
            let mut res = Vec::new();
            let rows = table
                .iter()
                .map_err(|e| StoreError::engine(format!("couldn't scan table {:?}", self.name), e))?;
            for row in rows {
                let (_, value) =
                    row.map_err(|e| StoreError::engine(format!("couldn't scan table {:?}", self.name), e))?;
                let entity = self.decode(value.value())?;
                if !skip(&entity) {
                    res.push(entity);
                }
            }
            Ok(res)
        })?;

        sort(&mut res);
        Ok(res)
    }

    /// Inserts all entities or none. Fails with `AlreadyExists` if any id is
    /// taken, including by an earlier entity of the same batch.
    pub fn create(&self, entities: &[T]) -> Result<(), StoreError> {
        self.write(|table| {
            for entity in entities {
                let id = entity.id();
                let exists = table
                    .get(id.as_bytes().as_slice())
                    .map_err(|e| StoreError::engine(format!("couldn't read from table {:?}", self.name), e))?
                    .is_some();
                if exists {
                    return Err(StoreError::already_exists::<T>(id));
                }
                self.put(table, entity)?;
            }
            Ok(())
        })?;
        tracing::debug!(table = self.name, count = entities.len(), "Entities created");
        Ok(())
    }

    /// Overwrites the stored entity. There is no upsert: a missing id is `NotFound`.
    pub fn update(&self, entity: &T) -> Result<(), StoreError> {
        let id = entity.id();
        self.write(|table| {
            let exists = table
                .get(id.as_bytes().as_slice())
                .map_err(|e| StoreError::engine(format!("couldn't read from table {:?}", self.name), e))?
                .is_some();
            if !exists {
                return Err(StoreError::not_found::<T>(id));
            }
            self.put(table, entity)
        })?;
        tracing::debug!(table = self.name, %id, "Entity updated");
        Ok(())
    }

    fn put(&self, table: &mut Table<'_, &'static [u8], &'static [u8]>, entity: &T) -> Result<(), StoreError> {
        let data = (self.encode)(entity).map_err(|source| StoreError::Encode {
            entity: T::ENTITY_NAME,
            source,
        })?;
        table
            .insert(entity.id().as_bytes().as_slice(), data.as_slice())
            .map_err(|e| StoreError::engine(format!("couldn't write to table {:?}", self.name), e))?;
        Ok(())
    }

    fn decode(&self, data: &[u8]) -> Result<T, StoreError> {
        (self.decode)(data).map_err(|source| StoreError::Decode {
            entity: T::ENTITY_NAME,
            source,
        })
    }

    fn read<R>(
        &self,
        f: impl FnOnce(&ReadOnlyTable<&'static [u8], &'static [u8]>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::engine("couldn't begin read transaction", e))?;
        let table = tx
            .open_table(self.bucket)
            .map_err(|e| StoreError::engine(format!("couldn't open table {:?}", self.name), e))?;
        f(&table)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut Table<'_, &'static [u8], &'static [u8]>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::engine("couldn't begin write transaction", e))?;
        tracing::debug!(table = self.name, "Write transaction started");

        let result = {
            let mut table = tx
                .open_table(self.bucket)
                .map_err(|e| StoreError::engine(format!("couldn't open table {:?}", self.name), e))?;
            f(&mut table)
        };

        match result {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| StoreError::engine("couldn't commit write transaction", e))?;
                tracing::debug!(table = self.name, "Write transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = tx.abort() {
                    tracing::warn!(table = self.name, error = %abort_err, "Couldn't abort write transaction");
                }
                tracing::debug!(table = self.name, error = %err, "Write transaction rolled back");
                Err(err)
            }
        }
    }
}
