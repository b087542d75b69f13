//! Form actions
//!
//! Actions never fail with an error: they return an [`ActionOutcome`] the web
//! layer turns into a redirect or an `{"error": ...}` payload.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::form_urlencoded;

use crate::api::Db;
use crate::auth::{IdentityProvider, SignUpMetadata};
use crate::error::Error;
use crate::models::{ItemChanges, ItemType, NewItem, NewProject, ProjectChanges};
use crate::profile::{ProfileProvisioner, Provisioning};

/// Result of a form action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    /// The action succeeded; the caller shows the affected page
    Completed,
    /// The action was rejected; `error` is shown to the user
    Failed { error: String },
    /// The action ends on another page
    Redirect(String),
}

impl ActionOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        ActionOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        ActionOutcome::Redirect(to.into())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

const LOGIN_FAILED: &str = "Could not authenticate user";
const SIGNUP_FAILED: &str = "Could not create account";
const SIGNUP_DONE: &str = "Check email to continue sign in process";

/// Redirect to `page` with a form-encoded `message` query parameter
fn with_message(page: &str, message: &str) -> ActionOutcome {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .finish();
    ActionOutcome::redirect(format!("{}?{}", page, query))
}

fn login_redirect() -> ActionOutcome {
    ActionOutcome::redirect("/login")
}

/// Map an accessor error; validation messages reach the user verbatim
fn failure(e: Error, message: &str) -> ActionOutcome {
    match e {
        Error::Validation(msg) => ActionOutcome::failed(msg),
        Error::NotAuthenticated => login_redirect(),
        _ => ActionOutcome::failed(message),
    }
}

/// A blank form field counts as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ProjectForm {
    pub fn to_new_project(&self) -> NewProject {
        NewProject {
            name: self.name.trim().to_string(),
            description: non_blank(self.description.clone()),
            color: non_blank(self.color.clone()),
        }
    }

    pub fn to_changes(&self) -> ProjectChanges {
        ProjectChanges {
            name: Some(self.name.trim().to_string()),
            description: Some(non_blank(self.description.clone())),
            color: non_blank(self.color.clone()).map(Some),
            is_archived: None,
        }
    }
}

/// Item form; `title`/`content` are accepted for `name`/`description`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemForm {
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default, alias = "content")]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<ItemType>,
}

impl ItemForm {
    pub fn to_new_item(&self, project_id: &str) -> NewItem {
        NewItem::new(
            project_id,
            self.name.trim(),
            self.description.as_deref().unwrap_or_default(),
            self.item_type.unwrap_or(ItemType::Task),
        )
    }

    pub fn to_changes(&self) -> ItemChanges {
        let changes = ItemChanges {
            title: Some(self.name.trim().to_string()),
            content: Some(self.description.clone().unwrap_or_default()),
            ..Default::default()
        };
        match self.item_type {
            Some(item_type) => changes.with_type(item_type),
            None => changes,
        }
    }
}

/// The actions available to one request
pub struct Actions<'a> {
    identity: &'a dyn IdentityProvider,
    db: &'a Db,
}

impl<'a> Actions<'a> {
    pub fn new(identity: &'a dyn IdentityProvider, db: &'a Db) -> Self {
        Self { identity, db }
    }

    pub async fn login(&self, form: &LoginForm) -> ActionOutcome {
        match self
            .identity
            .sign_in_with_password(&form.email, &form.password)
            .await
        {
            Ok(_) => ActionOutcome::redirect("/dashboard"),
            Err(e) => {
                warn!("Sign in failed for {}: {}", form.email, e);
                with_message("/login", LOGIN_FAILED)
            }
        }
    }

    /// Create the account, then its profile on a best-effort basis
    pub async fn signup(&self, form: &SignupForm) -> ActionOutcome {
        let metadata = SignUpMetadata {
            first_name: non_blank(form.first_name.clone()),
            last_name: non_blank(form.last_name.clone()),
        };

        let result = match self
            .identity
            .sign_up(&form.email, &form.password, &metadata)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Sign up failed for {}: {}", form.email, e);
                return with_message("/signup", SIGNUP_FAILED);
            }
        };

        if let Some(user) = result.user {
            let db = self
                .db
                .with_session(self.identity.access_token(), Some(user.clone()));
            let profiles = db.profiles();
            let provisioner = ProfileProvisioner::new(self.identity, &profiles);
            match provisioner.create_user_profile(&user).await {
                Provisioning::Failed(e) => {
                    warn!("Signed up {} without a profile: {}", user.id, e)
                }
                _ => info!("Signed up {}", user.id),
            }
        }

        with_message("/login", SIGNUP_DONE)
    }

    pub async fn logout(&self) -> ActionOutcome {
        if let Err(e) = self.identity.sign_out().await {
            warn!("Sign out failed: {}", e);
        }
        login_redirect()
    }

    pub async fn create_project(&self, form: &ProjectForm) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.projects().create(&form.to_new_project()).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not create project."),
        }
    }

    pub async fn update_project(&self, project_id: &str, form: &ProjectForm) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.projects().update(project_id, &form.to_changes()).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not update project."),
        }
    }

    pub async fn delete_project(&self, project_id: &str) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.projects().delete(project_id).await {
            Ok(()) => ActionOutcome::redirect("/projects"),
            Err(e) => failure(e, "Database error: Could not delete project."),
        }
    }

    pub async fn archive_project(&self, project_id: &str) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.projects().archive(project_id).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not archive project."),
        }
    }

    pub async fn unarchive_project(&self, project_id: &str) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.projects().unarchive(project_id).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not unarchive project."),
        }
    }

    pub async fn create_item(&self, project_id: &str, form: &ItemForm) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        match self.db.items().create(&form.to_new_item(project_id)).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not create item."),
        }
    }

    pub async fn update_item(
        &self,
        project_id: &str,
        item_id: &str,
        form: &ItemForm,
    ) -> ActionOutcome {
        if self.db.user().is_none() {
            return login_redirect();
        }
        let changes = form.to_changes();
        match self
            .db
            .items()
            .update_in_project(project_id, item_id, &changes)
            .await
        {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, "Database error: Could not update item."),
        }
    }

    /// Flip a task between todo and done
    pub async fn toggle_item_status(&self, project_id: &str, item_id: &str) -> ActionOutcome {
        const FAILED: &str = "Database error: Could not update item status.";

        if self.db.user().is_none() {
            return login_redirect();
        }
        let current = match self.db.items().get(item_id).await {
            Some(item) if item.project_id == project_id => item.effective_status(),
            _ => return ActionOutcome::failed(FAILED),
        };
        let next = match current {
            Some(status) => status.toggled(),
            None => return ActionOutcome::failed("Only tasks have a status"),
        };

        match self.db.items().update_task_status(item_id, next).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => failure(e, FAILED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn outcome_payloads() {
        assert_eq!(
            serde_json::to_value(ActionOutcome::failed("Item name is required")).unwrap(),
            serde_json::json!({"error": "Item name is required"})
        );
        assert!(ActionOutcome::Completed.is_completed());
    }

    #[test]
    fn redirect_messages_are_encoded() {
        assert_eq!(
            with_message("/login", LOGIN_FAILED),
            ActionOutcome::redirect("/login?message=Could+not+authenticate+user")
        );
        assert_eq!(
            with_message("/signup", "50% & more"),
            ActionOutcome::redirect("/signup?message=50%25+%26+more")
        );
    }

    #[test]
    fn failure_mapping() {
        assert_eq!(
            failure(Error::validation("Project name is required"), "x"),
            ActionOutcome::failed("Project name is required")
        );
        assert_eq!(failure(Error::NotAuthenticated, "x"), login_redirect());
        assert_eq!(
            failure(Error::database("boom"), "Database error: Could not create project."),
            ActionOutcome::failed("Database error: Could not create project.")
        );
    }

    #[test]
    fn project_form_blank_description_is_null() {
        let form = ProjectForm {
            name: "  Site  ".into(),
            description: Some("".into()),
            color: None,
        };
        let new = form.to_new_project();
        assert_eq!(new.name, "Site");
        assert_eq!(new.description, None);
        assert_eq!(form.to_changes().description, Some(None));
    }

    #[test]
    fn item_form_aliases() {
        let form: ItemForm =
            serde_json::from_value(serde_json::json!({"title": "Plan", "content": "notes", "type": "document"}))
                .unwrap();
        let new = form.to_new_item("p1");
        assert_eq!(new.title, "Plan");
        assert_eq!(new.content, "notes");
        assert_eq!(new.item_type, ItemType::Document);
        assert_eq!(new.status, None);

        let form: ItemForm = serde_json::from_value(serde_json::json!({"name": "Fix"})).unwrap();
        let new = form.to_new_item("p1");
        assert_eq!(new.item_type, ItemType::Task);
        assert_eq!(new.status, Some(TaskStatus::Todo));
        assert_eq!(new.content, "");
    }
}
