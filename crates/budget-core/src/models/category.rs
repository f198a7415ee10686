use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::storage::Entity;

/// Node of the category forest. A nil `parent_id` marks a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_nil()
    }
}

impl Entity for Category {
    const ENTITY_NAME: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCategoryArgs {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
}
