//! HTTP client abstraction for requests to the backend

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Value of the `X-Client-Info` header sent with every request
pub const CLIENT_INFO: &str = concat!("taskflow/", env!("CARGO_PKG_VERSION"));

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("x-client-info", HeaderValue::from_static(CLIENT_INFO));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request, replacing any previous value
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add the project API key
    pub fn api_key(self, key: &str) -> Self {
        self.header("apikey", key)
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append query parameters, keeping their order
    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query_params.extend_from_slice(params);
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let (result, _) = self.execute_with_headers().await?;
        Ok(result)
    }

    /// Execute the request, returning the parsed body and the response headers
    pub async fn execute_with_headers<T: DeserializeOwned>(&self) -> Result<(T, HeaderMap), Error> {
        let response = self.execute_checked().await?;
        let headers = response.headers().clone();
        let result = response.json::<T>().await?;
        Ok((result, headers))
    }

    /// Execute the request and discard a successful body
    pub async fn execute_empty(&self) -> Result<(), Error> {
        self.execute_checked().await?;
        Ok(())
    }

    /// Execute the request and return the raw response, whatever its status
    pub async fn execute_raw(&self) -> Result<Response, Error> {
        let req = self.build()?;
        let response = req.send().await?;
        Ok(response)
    }

    async fn execute_checked(&self) -> Result<Response, Error> {
        let response = self.execute_raw().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await?;
            return Err(api_error(status, &text));
        }

        Ok(response)
    }
}

/// Error body shapes returned by PostgREST and GoTrue
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Map a non-success response body to `Error::Api`
pub(crate) fn api_error(status: u16, text: &str) -> Error {
    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();

    let code = body.code.and_then(|code| match code {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let message = body
        .message
        .or(body.msg)
        .or(body.error_description)
        .or(body.error)
        .unwrap_or_else(|| text.to_string());

    Error::Api {
        status,
        message,
        code,
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_error_body() {
        let err = api_error(
            409,
            r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"profiles_pkey\""}"#,
        );
        match err {
            Error::Api {
                status,
                message,
                code,
            } => {
                assert_eq!(status, 409);
                assert!(message.starts_with("duplicate key"));
                assert_eq!(code.as_deref(), Some("23505"));
            }
            e => panic!("Expected Api error, got {:?}", e),
        }
    }

    #[test]
    fn gotrue_error_body() {
        let err = api_error(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#);
        assert_eq!(err.to_string(), "Request failed with status 400: Invalid login credentials");

        let err = api_error(422, r#"{"code":422,"msg":"User already registered"}"#);
        match err {
            Error::Api { message, code, .. } => {
                assert_eq!(message, "User already registered");
                assert_eq!(code.as_deref(), Some("422"));
            }
            e => panic!("Expected Api error, got {:?}", e),
        }
    }

    #[test]
    fn plain_text_error_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "Request failed with status 502: Bad Gateway");
    }
}
