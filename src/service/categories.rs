use std::collections::{HashMap, HashSet};

use budget_core::{Category, Entity, GetTransactionsArgs, StoreError, UpdateCategoryArgs};
use uuid::Uuid;

use super::{now, Service};
use crate::error::{Result, ServiceError, StoreResultExt};

impl Service {
    pub fn create_category(&self, name: &str, parent_id: Uuid) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid_input("category name can't be empty"));
        }
        self.check_category_usable(parent_id)?;

        let category = Category {
            id: Uuid::new_v4(),
            parent_id,
            name: name.to_string(),
            deleted_at: None,
        };
        self.categories
            .create(&category)
            .context("couldn't save new category")?;

        tracing::info!(id = %category.id, parent_id = %parent_id, "Category created");
        Ok(category)
    }

    /// Deleted categories are reported as not found.
    pub fn get_category(&self, id: Uuid) -> Result<Category> {
        let category = self.categories.get_by_id(id).context("couldn't get category")?;
        if category.is_deleted() {
            return Err(StoreError::not_found::<Category>(id)).context("couldn't get category");
        }
        Ok(category)
    }

    pub fn get_categories(&self) -> Result<Vec<Category>> {
        self.categories
            .get_all(false)
            .context("couldn't get all categories")
    }

    pub fn update_category(&self, id: Uuid, args: UpdateCategoryArgs) -> Result<Category> {
        let mut category = self.get_category(id)?;

        if let Some(name) = args.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ServiceError::invalid_input("category name can't be empty"));
            }
            category.name = name.to_string();
        }

        if let Some(parent_id) = args.parent_id {
            if parent_id == id {
                return Err(ServiceError::invalid_input("category can't be its own parent"));
            }
            self.check_category_usable(parent_id)?;
            if self.is_descendant(parent_id, id)? {
                return Err(ServiceError::invalid_input(format!(
                    "category {} is a descendant of {}",
                    parent_id, id
                )));
            }
            category.parent_id = parent_id;
        }

        self.categories
            .update(&category)
            .context("couldn't update category")?;

        tracing::info!(%id, parent_id = %category.parent_id, "Category updated");
        Ok(category)
    }

    /// Soft-deletes a category that no live transaction refers to.
    pub fn delete_category(&self, id: Uuid) -> Result<()> {
        let mut category = self.get_category(id)?;

        let used = self.get_transactions(&GetTransactionsArgs {
            include_deleted: false,
            account_ids: Vec::new(),
            category_ids: vec![id],
        })?;
        if !used.is_empty() {
            return Err(ServiceError::invalid_input(format!(
                "category {} is used by {} transaction(s)",
                id,
                used.len()
            )));
        }

        category.deleted_at = Some(now());
        self.categories
            .update(&category)
            .context("couldn't update category for deletion")?;

        tracing::info!(%id, "Category deleted");
        Ok(())
    }

    /// The nil id means "no category" and is always usable. Any other id must
    /// point to a live category.
    pub(super) fn check_category_usable(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Ok(());
        }
        self.get_category(id).map(|_| ())
    }

    /// Reports whether `id` lies in the subtree rooted at `ancestor`.
    fn is_descendant(&self, id: Uuid, ancestor: Uuid) -> Result<bool> {
        let parents: HashMap<Uuid, Uuid> = self
            .categories
            .get_all(true)
            .context("couldn't get all categories")?
            .into_iter()
            .map(|c| (c.id, c.parent_id))
            .collect();

        let mut seen = HashSet::new();
        let mut current = id;
        while !current.is_nil() && seen.insert(current) {
            if current == ancestor {
                return Ok(true);
            }
            current = match parents.get(&current) {
                Some(parent) => *parent,
                None => break,
            };
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_utils::*;
    use budget_core::{CreateTransactionArgs, ErrorKind, Money, TransactionType};

    #[test]
    fn test_create_category() {
        let service = service();

        let food = service.create_category(" Food ", root()).unwrap();
        assert_eq!(food.name, "Food");
        assert!(food.is_root());

        let cafe = service.create_category("Cafe", food.id).unwrap();
        assert_eq!(cafe.parent_id, food.id);
        assert_eq!(service.get_category(cafe.id).unwrap(), cafe);

        let err = service.create_category("  ", root()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service.create_category("Orphan", Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_categories_order() {
        let service = service();
        let food = service.create_category("Food", root()).unwrap();
        let car = service.create_category("Car", root()).unwrap();
        service.create_category("Groceries", food.id).unwrap();
        service.create_category("Cafe", food.id).unwrap();

        let names: Vec<_> = service
            .get_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Car", "Food", "Cafe", "Groceries"]);
        assert!(car.is_root());
    }

    #[test]
    fn test_update_category() {
        let service = service();
        let food = service.create_category("Food", root()).unwrap();
        let home = service.create_category("Home", root()).unwrap();
        let cafe = service.create_category("Cafe", food.id).unwrap();

        let renamed = service
            .update_category(
                cafe.id,
                UpdateCategoryArgs {
                    name: Some(" Restaurants ".to_string()),
                    parent_id: None,
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Restaurants");
        assert_eq!(renamed.parent_id, food.id);

        let moved = service
            .update_category(
                cafe.id,
                UpdateCategoryArgs {
                    name: None,
                    parent_id: Some(home.id),
                },
            )
            .unwrap();
        assert_eq!(moved.parent_id, home.id);
        assert_eq!(moved.name, "Restaurants");

        let to_root = service
            .update_category(
                cafe.id,
                UpdateCategoryArgs {
                    parent_id: Some(root()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(to_root.is_root());
        assert_eq!(service.get_category(cafe.id).unwrap(), to_root);
    }

    #[test]
    fn test_update_category_rejects_cycles() {
        let service = service();
        let a = service.create_category("A", root()).unwrap();
        let b = service.create_category("B", a.id).unwrap();
        let c = service.create_category("C", b.id).unwrap();

        let move_under = |id, parent_id| {
            service.update_category(
                id,
                UpdateCategoryArgs {
                    parent_id: Some(parent_id),
                    ..Default::default()
                },
            )
        };

        let err = move_under(a.id, a.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = move_under(a.id, c.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = move_under(a.id, b.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // moving a leaf to another branch is fine
        assert_eq!(move_under(c.id, a.id).unwrap().parent_id, a.id);
        assert!(service.get_category(a.id).unwrap().is_root());
    }

    #[test]
    fn test_update_category_validation() {
        let service = service();
        let a = service.create_category("A", root()).unwrap();

        let err = service
            .update_category(
                a.id,
                UpdateCategoryArgs {
                    name: Some("".to_string()),
                    parent_id: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service
            .update_category(
                a.id,
                UpdateCategoryArgs {
                    parent_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .update_category(Uuid::new_v4(), UpdateCategoryArgs::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_category() {
        let service = service();
        let food = service.create_category("Food", root()).unwrap();

        service.delete_category(food.id).unwrap();
        assert!(service.get_category(food.id).unwrap_err().is_not_found());
        assert!(service.get_categories().unwrap().is_empty());
        assert!(service.delete_category(food.id).unwrap_err().is_not_found());

        // deleted categories can't be used as parents
        let err = service.create_category("Cafe", food.id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_used_category_refused() {
        let service = service();
        let acc = open_account(&service, "USD");
        let food = service.create_category("Food", root()).unwrap();

        let t = service
            .create_transaction(CreateTransactionArgs {
                account_id: acc.id,
                transaction_type: TransactionType::Withdraw,
                name: "Lunch".to_string(),
                description: String::new(),
                amount: Money::from_minor(900),
                category_id: food.id,
            })
            .unwrap();

        let err = service.delete_category(food.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        service.delete_transaction(t.id).unwrap();
        service.delete_category(food.id).unwrap();
    }
}
