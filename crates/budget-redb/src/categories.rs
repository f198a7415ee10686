use std::{cmp::Ordering, sync::Arc};

use budget_core::{Category, CategoryStore, Entity, StoreError};
use redb::Database;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::base::BaseStore;

pub const TABLE_NAME: &str = "categories";

pub struct RedbCategoryStore {
    base: BaseStore<Category>,
}

impl RedbCategoryStore {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let base = BaseStore::new(db, TABLE_NAME, encode_category, decode_category);
        base.init()?;
        Ok(Self { base })
    }
}

impl CategoryStore for RedbCategoryStore {
    fn get_by_id(&self, id: Uuid) -> Result<Category, StoreError> {
        self.base.get_by_id(id)
    }

    fn get_all(&self, include_deleted: bool) -> Result<Vec<Category>, StoreError> {
        self.base.get_all(
            |c| !include_deleted && c.is_deleted(),
            |categories| categories.sort_by(compare_categories),
        )
    }

    fn create(&self, category: &Category) -> Result<(), StoreError> {
        self.base.create(std::slice::from_ref(category))
    }

    fn update(&self, category: &Category) -> Result<(), StoreError> {
        self.base.update(category)
    }
}

/// Groups siblings together, then orders them by name. Ties are broken by id
/// so the order is total.
fn compare_categories(a: &Category, b: &Category) -> Ordering {
    a.parent_id
        .cmp(&b.parent_id)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Serialize, Deserialize)]
struct RedbCategory {
    id: Uuid,
    #[serde(default)]
    parent_id: Uuid,
    name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    deleted_at: Option<OffsetDateTime>,
}

fn encode_category(category: &Category) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&RedbCategory {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name.clone(),
        deleted_at: category.deleted_at,
    })
}

fn decode_category(data: &[u8]) -> Result<Category, serde_json::Error> {
    let category: RedbCategory = serde_json::from_slice(data)?;
    Ok(Category {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name,
        deleted_at: category.deleted_at,
    })
}
