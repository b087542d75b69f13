//! Query builder for PostgrestClient

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::fetch::FetchBuilder;
use crate::postgrest::filter::*;
use crate::postgrest::types::*;

/// Base query builder
///
/// Parameters keep their insertion order; PostgREST accepts repeated keys.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    /// Query parameters
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter to the query
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Add a filter on a column
    pub fn add_filter(&mut self, column: &str, op: FilterOperator, value: &str) {
        self.add_param(column, &op.apply(value));
    }

    /// Replace a parameter, adding it when absent
    pub fn set_param(&mut self, key: &str, value: &str) {
        self.params.retain(|(k, _)| k != key);
        self.add_param(key, value);
    }

    /// Get the query parameters
    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Where a table request goes and how it authenticates
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) token: Option<String>,
    pub(crate) schema: String,
    pub(crate) client: Client,
}

impl Target {
    fn request(&self, method: Method) -> FetchBuilder<'_> {
        let profile_header = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };

        let mut fetch = FetchBuilder::new(&self.client, &self.url, method)
            .api_key(&self.key)
            .bearer_auth(self.token.as_deref().unwrap_or(&self.key));

        if self.schema != "public" {
            fetch = fetch.header(profile_header, &self.schema);
        }
        fetch
    }
}

fn exactly_one<T>(rows: Vec<T>) -> Result<T> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        _ => Err(Error::database(format!(
            "Expected exactly one row, got {}",
            count
        ))),
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    target: Target,

    /// Query builder
    query: QueryBuilder,

    count: Option<CountOption>,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub(crate) fn new(target: Target, columns: &str) -> Self {
        let mut query = QueryBuilder::new();
        query.add_param("select", columns);

        Self {
            target,
            query,
            count: None,
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(&mut self, column: &str, value: T) -> &mut Self {
        self.query
            .add_filter(column, FilterOperator::Eq, &value.to_string());
        self
    }

    /// Full-text search on a column
    pub fn text_search(&mut self, column: &str, query: &str) -> &mut Self {
        self.query.add_filter(column, FilterOperator::Fts, query);
        self
    }

    /// Limit the number of rows returned
    pub fn limit(&mut self, count: i32) -> &mut Self {
        self.query.set_param("limit", &count.to_string());
        self
    }

    /// Order the results by a column
    pub fn order(&mut self, column: &str, ascending: bool) -> &mut Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query
            .set_param("order", &format!("{}.{}", column, direction));
        self
    }

    /// Ask for the total row count alongside the rows
    pub fn count(&mut self, option: CountOption) -> &mut Self {
        self.count = Some(option);
        self
    }

    fn fetch(&self) -> FetchBuilder<'_> {
        let mut fetch = self
            .target
            .request(Method::GET)
            .query(self.query.get_params());
        if let Some(count) = self.count {
            fetch = fetch.header("Prefer", &format!("count={}", count.as_str()));
        }
        fetch
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.fetch().execute::<Vec<T>>().await
    }

    /// Execute the query, returning the rows and the total count
    ///
    /// The count comes from the `Content-Range` header and is `None` when
    /// no count was requested.
    pub async fn execute_with_count<T: DeserializeOwned>(&self) -> Result<(Vec<T>, Option<i64>)> {
        let (rows, headers) = self.fetch().execute_with_headers::<Vec<T>>().await?;
        let total = headers
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        Ok((rows, total))
    }

    /// Execute the query, expecting exactly one row
    pub async fn single<T: DeserializeOwned>(&self) -> Result<T> {
        exactly_one(self.execute::<T>().await?)
    }

    /// Execute the query, expecting at most one row
    pub async fn maybe_single<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let rows = self.execute::<T>().await?;
        if rows.len() > 1 {
            return Err(Error::database(format!(
                "Expected at most one row, got {}",
                rows.len()
            )));
        }
        Ok(rows.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    target: Target,

    /// The values to insert
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Create a new InsertBuilder
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self { target, values }
    }

    fn fetch(&self, returning: ReturnOption) -> Result<FetchBuilder<'_>> {
        self.target
            .request(Method::POST)
            .header("Prefer", &returning.prefer())
            .json(&self.values)
    }

    /// Execute the query and return the inserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        self.fetch(ReturnOption::Representation)?
            .execute::<Vec<R>>()
            .await
    }

    /// Execute the query and return the single inserted row
    pub async fn single<R: DeserializeOwned>(&self) -> Result<R> {
        exactly_one(self.execute::<R>().await?)
    }

    /// Execute the query without returning the inserted data
    pub async fn execute_no_return(&self) -> Result<()> {
        self.fetch(ReturnOption::Minimal)?.execute_empty().await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    target: Target,

    /// The values to update
    values: T,

    /// Query builder
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Create a new UpdateBuilder
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(&mut self, column: &str, value: V) -> &mut Self {
        self.query
            .add_filter(column, FilterOperator::Eq, &value.to_string());
        self
    }

    /// Execute the query and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        self.target
            .request(Method::PATCH)
            .header("Prefer", &ReturnOption::Representation.prefer())
            .query(self.query.get_params())
            .json(&self.values)?
            .execute::<Vec<R>>()
            .await
    }

    /// Execute the query, expecting exactly one row to change
    pub async fn single<R: DeserializeOwned>(&self) -> Result<R> {
        exactly_one(self.execute::<R>().await?)
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    target: Target,

    /// Query builder
    query: QueryBuilder,
}

impl DeleteBuilder {
    /// Create a new DeleteBuilder
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(&mut self, column: &str, value: V) -> &mut Self {
        self.query
            .add_filter(column, FilterOperator::Eq, &value.to_string());
        self
    }

    /// Execute the query without returning the deleted data
    pub async fn execute_no_return(&self) -> Result<()> {
        self.target
            .request(Method::DELETE)
            .header("Prefer", &ReturnOption::Minimal.prefer())
            .query(self.query.get_params())
            .execute_empty()
            .await
    }
}
