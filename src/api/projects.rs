//! Project accessors

use crate::error::Result;
use crate::models::{NewProject, Owned, Project, ProjectChanges};

use super::{logged, Db};

const TABLE: &str = "projects";

/// Accessors for the `projects` table
pub struct Projects<'a> {
    db: &'a Db,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(db: &'a Db) -> Self {
        Self { db }
    }

    async fn by_archived(&self, archived: bool) -> Result<Vec<Project>> {
        self.db
            .table(TABLE)
            .select("*")
            .eq("is_archived", archived)
            .order("updated_at", false)
            .execute()
            .await
    }

    /// Active projects, most recently updated first
    pub async fn list(&self) -> Result<Vec<Project>> {
        logged("fetching projects", self.by_archived(false).await)
    }

    /// Archived projects, most recently updated first
    pub async fn list_archived(&self) -> Result<Vec<Project>> {
        logged("fetching archived projects", self.by_archived(true).await)
    }

    /// A project by id; lookup failures read as absent
    pub async fn get(&self, id: &str) -> Option<Project> {
        let result = self
            .db
            .table(TABLE)
            .select("*")
            .eq("id", id)
            .maybe_single()
            .await;
        logged("fetching project", result).ok().flatten()
    }

    pub async fn create(&self, project: &NewProject) -> Result<Project> {
        project.validate()?;
        let user = self.db.require_user()?;

        let row = Owned {
            user_id: &user.id,
            row: project,
        };
        let result = self.db.table(TABLE).insert(&row).single().await;
        logged("creating project", result)
    }

    pub async fn update(&self, id: &str, changes: &ProjectChanges) -> Result<Project> {
        changes.validate()?;
        let user = self.db.require_user()?;

        let result = self
            .db
            .table(TABLE)
            .update(changes)
            .eq("id", id)
            .eq("user_id", &user.id)
            .single()
            .await;
        logged("updating project", result)
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
        logged("deleting project", result)
    }

    pub async fn archive(&self, id: &str) -> Result<Project> {
        self.set_archived(id, true).await
    }

    pub async fn unarchive(&self, id: &str) -> Result<Project> {
        self.set_archived(id, false).await
    }

    async fn set_archived(&self, id: &str, is_archived: bool) -> Result<Project> {
        let changes = ProjectChanges {
            is_archived: Some(is_archived),
            ..Default::default()
        };
        self.update(id, &changes).await
    }
}
