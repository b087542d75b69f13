//! Per-session cache of the user's projects

use crate::models::{Project, ProjectChanges};

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectAction {
    Set(Vec<Project>),
    Add(Project),
    Update { id: String, changes: ProjectChanges },
    Delete(String),
    SetActive(Option<String>),
    SetLoading(bool),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectStore {
    pub projects: Vec<Project>,
    pub active_project_id: Option<String>,
    pub is_loading: bool,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: ProjectAction) {
        match action {
            ProjectAction::Set(projects) => self.projects = projects,
            ProjectAction::Add(project) => self.projects.push(project),
            ProjectAction::Update { id, changes } => {
                if let Some(project) = self.projects.iter_mut().find(|p| p.id == id) {
                    changes.apply(project);
                }
            }
            ProjectAction::Delete(id) => {
                self.projects.retain(|p| p.id != id);
                if self.active_project_id.as_deref() == Some(id.as_str()) {
                    self.active_project_id = None;
                }
            }
            ProjectAction::SetActive(id) => self.active_project_id = id,
            ProjectAction::SetLoading(loading) => self.is_loading = loading,
        }
    }

    /// The active project, if it is still cached
    pub fn active_project(&self) -> Option<&Project> {
        let id = self.active_project_id.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(id: &str) -> Project {
        serde_json::from_value(json!({"id": id, "user_id": "u1", "name": id})).unwrap()
    }

    #[test]
    fn delete_clears_active() {
        let mut store = ProjectStore::new();
        store.dispatch(ProjectAction::Set(vec![project("p1"), project("p2")]));
        store.dispatch(ProjectAction::SetActive(Some("p2".into())));
        assert_eq!(store.active_project().map(|p| p.id.as_str()), Some("p2"));

        store.dispatch(ProjectAction::Delete("p1".into()));
        assert_eq!(store.active_project_id.as_deref(), Some("p2"));

        store.dispatch(ProjectAction::Delete("p2".into()));
        assert_eq!(store.active_project_id, None);
        assert!(store.projects.is_empty());
    }

    #[test]
    fn update_merges_changes() {
        let mut store = ProjectStore::new();
        store.dispatch(ProjectAction::Add(project("p1")));
        store.dispatch(ProjectAction::Update {
            id: "p1".into(),
            changes: ProjectChanges {
                name: Some("Renamed".into()),
                is_archived: Some(true),
                ..Default::default()
            },
        });

        let p = &store.projects[0];
        assert_eq!(p.name, "Renamed");
        assert!(p.is_archived);
        assert_eq!(p.user_id, "u1");
    }

    #[test]
    fn active_id_without_project() {
        let mut store = ProjectStore::new();
        store.dispatch(ProjectAction::SetActive(Some("gone".into())));
        store.dispatch(ProjectAction::SetLoading(true));
        assert!(store.active_project().is_none());
        assert!(store.is_loading);
    }
}
