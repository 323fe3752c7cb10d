//! Account API client

use openapi_client::models::{Account, ListQuery, MessageResponse, Page};

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::validate::AccountForm;

impl HttpClient {
    /// List accounts matching the query
    pub async fn list_accounts(&self, query: &ListQuery) -> Result<Page<Account>, ConsoleError> {
        self.get_query("/accounts", query).await
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, ConsoleError> {
        self.get(&format!("/accounts/{}", id)).await
    }

    /// Validate the form locally, then create the account
    pub async fn create_account(&self, form: &AccountForm) -> Result<Account, ConsoleError> {
        let body = form.to_create()?;
        self.post("/accounts", &body).await
    }

    /// Validate the form locally, then update the account
    pub async fn update_account(&self, id: &str, form: &AccountForm) -> Result<Account, ConsoleError> {
        let body = form.to_update()?;
        self.put(&format!("/accounts/{}", id), &body).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<MessageResponse, ConsoleError> {
        self.delete(&format!("/accounts/{}", id)).await
    }
}
