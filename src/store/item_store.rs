//! Per-session cache of items plus the list filters

use crate::models::{Item, ItemChanges, ItemType, TaskStatus};

/// A filter value: everything, or one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    fn accepts(&self, value: Option<&T>) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => value == Some(wanted),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilters {
    pub item_type: Filter<ItemType>,
    pub status: Filter<TaskStatus>,
    pub project_id: Filter<String>,
    pub search_query: String,
}

/// Filter fields to overwrite; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub item_type: Option<Filter<ItemType>>,
    pub status: Option<Filter<TaskStatus>>,
    pub project_id: Option<Filter<String>>,
    pub search_query: Option<String>,
}

impl ItemFilters {
    fn merge(&mut self, update: FilterUpdate) {
        if let Some(item_type) = update.item_type {
            self.item_type = item_type;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(project_id) = update.project_id {
            self.project_id = project_id;
        }
        if let Some(query) = update.search_query {
            self.search_query = query;
        }
    }

    fn matches(&self, item: &Item) -> bool {
        self.item_type.accepts(Some(&item.item_type))
            && self.status.accepts(item.status.as_ref())
            && self.project_id.accepts(Some(&item.project_id))
            && self.matches_search(item)
    }

    fn matches_search(&self, item: &Item) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        let query = self.search_query.to_lowercase();
        item.title.to_lowercase().contains(&query)
            || item.content_str().to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemAction {
    Set(Vec<Item>),
    Add(Item),
    Update { id: String, changes: ItemChanges },
    Delete(String),
    Select(Option<String>),
    SetLoading(bool),
    SetFilters(FilterUpdate),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStore {
    pub items: Vec<Item>,
    pub selected_item_id: Option<String>,
    pub is_loading: bool,
    pub filters: ItemFilters,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: ItemAction) {
        match action {
            ItemAction::Set(items) => self.items = items,
            ItemAction::Add(item) => self.items.push(item),
            ItemAction::Update { id, changes } => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
                    changes.apply(item);
                }
            }
            ItemAction::Delete(id) => {
                self.items.retain(|i| i.id != id);
                if self.selected_item_id.as_deref() == Some(id.as_str()) {
                    self.selected_item_id = None;
                }
            }
            ItemAction::Select(id) => self.selected_item_id = id,
            ItemAction::SetLoading(loading) => self.is_loading = loading,
            ItemAction::SetFilters(update) => self.filters.merge(update),
        }
    }

    pub fn selected_item(&self) -> Option<&Item> {
        let id = self.selected_item_id.as_deref()?;
        self.items.iter().find(|i| i.id == id)
    }

    /// Items passing every active filter
    pub fn filtered(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| self.filters.matches(item))
            .collect()
    }

    pub fn by_project(&self, project_id: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.project_id == project_id)
            .collect()
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.is_task() && item.status == Some(status))
            .collect()
    }
}
