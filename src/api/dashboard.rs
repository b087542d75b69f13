//! Read models assembled from several accessor calls

use serde::Serialize;

use crate::error::Result;
use crate::models::{Item, ItemType, Project, TaskStatus};
use crate::postgrest::CountOption;

use super::{logged, Db};

const DASHBOARD_PROJECTS: i32 = 6;
const DASHBOARD_ITEMS: i32 = 10;

/// Number of tasks per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
}

impl TaskCounts {
    pub fn get(&self, status: TaskStatus) -> i64 {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
        }
    }

    fn slot(&mut self, status: TaskStatus) -> &mut i64 {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Done => &mut self.done,
        }
    }

    /// Count the tasks among `items`
    pub fn tally<'i>(items: impl IntoIterator<Item = &'i Item>) -> Self {
        let mut counts = Self::default();
        for status in items.into_iter().filter_map(Item::effective_status) {
            *counts.slot(status) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub projects: Vec<Project>,
    pub recent_items: Vec<Item>,
    pub tasks: TaskCounts,
    pub documents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsOverview {
    pub active: Vec<Project>,
    pub archived: Vec<Project>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub project: Project,
    pub tasks: Vec<Item>,
    pub documents: Vec<Item>,
    pub counts: TaskCounts,
}

impl ProjectView {
    /// Split a project's items into tasks and documents
    pub fn new(project: Project, items: Vec<Item>) -> Self {
        let (tasks, documents): (Vec<Item>, Vec<Item>) =
            items.into_iter().partition(Item::is_task);
        let counts = TaskCounts::tally(&tasks);

        Self {
            project,
            tasks,
            documents,
            counts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub item: Item,
    pub project: Option<Project>,
}

/// Page-level queries
pub struct Dashboard<'a> {
    db: &'a Db,
}

impl<'a> Dashboard<'a> {
    pub(crate) fn new(db: &'a Db) -> Self {
        Self { db }
    }

    async fn count_items(&self, item_type: ItemType, status: Option<TaskStatus>) -> Result<i64> {
        let mut query = self.db.table("items").select("id");
        query.eq("type", item_type).count(CountOption::Exact);
        if let Some(status) = status {
            query.eq("status", status);
        }

        let (rows, total) = query.execute_with_count::<serde_json::Value>().await?;
        Ok(total.unwrap_or(rows.len() as i64))
    }

    /// The dashboard: recent projects and items plus task and document counts
    pub async fn summary(&self) -> Result<DashboardSummary> {
        self.db.require_user()?;

        let projects = self
            .db
            .table("projects")
            .select("*")
            .eq("is_archived", false)
            .order("updated_at", false)
            .limit(DASHBOARD_PROJECTS)
            .execute()
            .await;
        let projects = logged("fetching dashboard projects", projects)?;

        let recent_items = self
            .db
            .table("items")
            .select("*")
            .order("updated_at", false)
            .limit(DASHBOARD_ITEMS)
            .execute()
            .await;
        let recent_items = logged("fetching recent items", recent_items)?;

        let mut tasks = TaskCounts::default();
        for status in TaskStatus::ALL {
            let count = self.count_items(ItemType::Task, Some(status)).await;
            *tasks.slot(status) = logged("counting tasks", count)?;
        }
        let documents = logged(
            "counting documents",
            self.count_items(ItemType::Document, None).await,
        )?;

        Ok(DashboardSummary {
            projects,
            recent_items,
            tasks,
            documents,
        })
    }

    /// Active and archived projects
    pub async fn projects_overview(&self) -> Result<ProjectsOverview> {
        self.db.require_user()?;
        let projects = self.db.projects();

        Ok(ProjectsOverview {
            active: projects.list().await?,
            archived: projects.list_archived().await?,
        })
    }

    /// A project with its items; `None` when the project does not exist
    pub async fn project_view(&self, project_id: &str) -> Result<Option<ProjectView>> {
        self.db.require_user()?;

        let project = match self.db.projects().get(project_id).await {
            Some(project) => project,
            None => return Ok(None),
        };
        let items = self.db.items().list_by_project(project_id).await?;

        Ok(Some(ProjectView::new(project, items)))
    }

    /// An item with its project; `None` unless the item belongs to `project_id`
    pub async fn item_view(&self, project_id: &str, item_id: &str) -> Result<Option<ItemView>> {
        self.db.require_user()?;

        let item = match self.db.items().get(item_id).await {
            Some(item) if item.project_id == project_id => item,
            _ => return Ok(None),
        };
        let project = self.db.projects().get(project_id).await;

        Ok(Some(ItemView { item, project }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, item_type: &str, status: Option<&str>) -> Item {
        serde_json::from_value(json!({
            "id": id,
            "user_id": "u1",
            "project_id": "p1",
            "title": id,
            "type": item_type,
            "status": status
        }))
        .unwrap()
    }

    fn project() -> Project {
        serde_json::from_value(json!({"id": "p1", "user_id": "u1", "name": "P"})).unwrap()
    }

    #[test]
    fn project_view_splits_items() {
        let view = ProjectView::new(
            project(),
            vec![
                item("t1", "task", Some("todo")),
                item("d1", "document", None),
                item("t2", "task", Some("done")),
                item("t3", "task", None),
                item("t4", "task", Some("in_progress")),
            ],
        );

        assert_eq!(view.tasks.len(), 4);
        assert_eq!(view.documents.len(), 1);
        assert_eq!(
            view.counts,
            TaskCounts {
                todo: 2,
                in_progress: 1,
                done: 1
            }
        );
        assert_eq!(view.counts.get(TaskStatus::Done), 1);
    }
}
