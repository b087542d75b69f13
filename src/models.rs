//! Rows of the `profiles`, `projects` and `items` tables and their payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::User;
use crate::error::{Error, Result};

/// Application profile of a user, keyed by the user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

impl NewProfile {
    /// Derive the profile of a freshly seen user
    ///
    /// `username` is the email local-part (empty without an email).
    /// `full_name` is "first last" when both names were given at signup,
    /// otherwise the username.
    pub fn for_user(user: &User) -> Self {
        let username = user.email_local_part().unwrap_or_default().to_string();
        let full_name = match (user.metadata_str("first_name"), user.metadata_str("last_name")) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => username.clone(),
        };

        Self {
            id: user.id.clone(),
            username,
            full_name,
        }
    }
}

/// A project row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields of a project to create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewProject {
    /// Reject a blank name
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Project name is required"));
        }
        Ok(())
    }
}

/// Partial update of a project; `None` leaves a column alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
}

impl ProjectChanges {
    /// Reject a name that is present but blank
    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) if name.trim().is_empty() => {
                Err(Error::validation("Project name is required"))
            }
            _ => Ok(()),
        }
    }

    /// Apply the changes to a local copy of the row and touch `updated_at`
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if let Some(is_archived) = self.is_archived {
            project.is_archived = is_archived;
        }
        project.updated_at = Some(Utc::now());
    }
}

/// Kind of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Task,
    Document,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Task => "task",
            ItemType::Document => "document",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// The status a checkbox click moves to: done becomes todo, anything else done
    pub fn toggled(&self) -> TaskStatus {
        match self {
            TaskStatus::Done => TaskStatus::Todo,
            _ => TaskStatus::Done,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item row: a task or a document inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_task(&self) -> bool {
        self.item_type == ItemType::Task
    }

    /// Status of a task, reading a missing one as todo; `None` for documents
    pub fn effective_status(&self) -> Option<TaskStatus> {
        match self.item_type {
            ItemType::Task => Some(self.status.unwrap_or(TaskStatus::Todo)),
            ItemType::Document => None,
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Fields of an item to create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItem {
    pub project_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub status: Option<TaskStatus>,
}

impl NewItem {
    /// A new item; tasks start as todo, documents carry no status
    pub fn new(project_id: &str, title: &str, content: &str, item_type: ItemType) -> Self {
        let status = match item_type {
            ItemType::Task => Some(TaskStatus::Todo),
            ItemType::Document => None,
        };

        Self {
            project_id: project_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            item_type,
            status,
        }
    }

    /// Reject a blank title
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("Item name is required"));
        }
        Ok(())
    }
}

/// Partial update of an item; `None` leaves a column alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<TaskStatus>>,
}

impl ItemChanges {
    /// Change only the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(Some(status)),
            ..Default::default()
        }
    }

    /// Change the type; turning an item into a document clears its status
    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        if item_type == ItemType::Document {
            self.status = Some(None);
        }
        self
    }

    /// Reject a title that is present but blank
    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) if title.trim().is_empty() => Err(Error::validation("Item name is required")),
            _ => Ok(()),
        }
    }

    /// Apply the changes to a local copy of the row and touch `updated_at`
    pub fn apply(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(content) = &self.content {
            item.content = Some(content.clone());
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        item.updated_at = Some(Utc::now());
    }
}

/// An insert payload stamped with its owner
#[derive(Debug, Clone, Serialize)]
pub struct Owned<'a, T> {
    pub user_id: &'a str,
    #[serde(flatten)]
    pub row: &'a T,
}
