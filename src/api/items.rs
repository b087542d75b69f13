//! Item accessors

use crate::error::Result;
use crate::models::{Item, ItemChanges, ItemType, NewItem, Owned, TaskStatus};
use crate::postgrest::SelectBuilder;

use super::{logged, Db};

const TABLE: &str = "items";

/// Accessors for the `items` table
pub struct Items<'a> {
    db: &'a Db,
}

impl<'a> Items<'a> {
    pub(crate) fn new(db: &'a Db) -> Self {
        Self { db }
    }

    fn select(&self) -> SelectBuilder {
        self.db.table(TABLE).select("*")
    }

    /// All items, most recently updated first
    pub async fn list(&self) -> Result<Vec<Item>> {
        let result = self.select().order("updated_at", false).execute().await;
        logged("fetching items", result)
    }

    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<Item>> {
        let result = self
            .select()
            .eq("project_id", project_id)
            .order("updated_at", false)
            .execute()
            .await;
        logged("fetching items by project", result)
    }

    pub async fn list_by_type(&self, item_type: ItemType) -> Result<Vec<Item>> {
        let result = self
            .select()
            .eq("type", item_type)
            .order("updated_at", false)
            .execute()
            .await;
        logged("fetching items by type", result)
    }

    pub async fn list_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Item>> {
        let result = self
            .select()
            .eq("type", ItemType::Task)
            .eq("status", status)
            .order("updated_at", false)
            .execute()
            .await;
        logged("fetching tasks by status", result)
    }

    /// An item by id; lookup failures read as absent
    pub async fn get(&self, id: &str) -> Option<Item> {
        let result = self.select().eq("id", id).maybe_single().await;
        logged("fetching item", result).ok().flatten()
    }

    pub async fn create(&self, item: &NewItem) -> Result<Item> {
        item.validate()?;
        let user = self.db.require_user()?;

        let row = Owned {
            user_id: &user.id,
            row: item,
        };
        let result = self.db.table(TABLE).insert(&row).single().await;
        logged("creating item", result)
    }

    pub async fn update(&self, id: &str, changes: &ItemChanges) -> Result<Item> {
        self.update_scoped(id, None, changes).await
    }

    /// Update an item only when it belongs to `project_id`
    pub async fn update_in_project(
        &self,
        project_id: &str,
        id: &str,
        changes: &ItemChanges,
    ) -> Result<Item> {
        self.update_scoped(id, Some(project_id), changes).await
    }

    async fn update_scoped(
        &self,
        id: &str,
        project_id: Option<&str>,
        changes: &ItemChanges,
    ) -> Result<Item> {
        changes.validate()?;
        let user = self.db.require_user()?;

        let mut query = self.db.table(TABLE).update(changes);
        query.eq("id", id).eq("user_id", &user.id);
        if let Some(project_id) = project_id {
            query.eq("project_id", project_id);
        }
        logged("updating item", query.single().await)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.db.require_user()?;

        let result = self
            .db
            .table(TABLE)
            .delete()
            .eq("id", id)
            .eq("user_id", &user.id)
            .execute_no_return()
            .await;
        logged("deleting item", result)
    }

    pub async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Item> {
        self.update(id, &ItemChanges::status(status)).await
    }

    /// Full-text search over titles; a blank query lists everything
    pub async fn search(&self, query: &str) -> Result<Vec<Item>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }

        let result = self
            .select()
            .text_search("title", query)
            .order("updated_at", false)
            .execute()
            .await;
        logged("searching items", result)
    }
}
