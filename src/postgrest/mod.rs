//! Database operations through the PostgREST API

mod filter;
mod query;
mod types;

use reqwest::Client;
use serde::Serialize;

pub use filter::*;
pub use query::*;
pub use types::*;

/// Client for one table
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    /// The base URL for the backend
    url: String,

    /// The anonymous API key
    key: String,

    /// The table or view name
    table: String,

    /// HTTP client
    client: Client,

    /// Access token of the signed-in user; row-level security applies to it
    token: Option<String>,

    schema: String,
}

impl PostgrestClient {
    /// Create a new PostgrestClient
    pub(crate) fn new(url: &str, key: &str, table: &str, client: Client, schema: &str) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            client,
            token: None,
            schema: schema.to_string(),
        }
    }

    /// Send requests with a user's access token instead of the anon key
    pub fn with_auth(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    /// Table this client targets
    pub fn table(&self) -> &str {
        &self.table
    }

    fn target(&self) -> Target {
        Target {
            url: format!("{}/rest/v1/{}", self.url, self.table),
            key: self.key.clone(),
            token: self.token.clone(),
            schema: self.schema.clone(),
            client: self.client.clone(),
        }
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target(), columns)
    }

    /// Insert data into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target(), values)
    }

    /// Update data in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.target(), values)
    }

    /// Delete data from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.target())
    }
}
