//! Transport seams of the list client and their HTTP implementation

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::ClientError;
use crate::domain::UserRecord;
use crate::interfaces::http::common::ApiResponse;
use crate::shared::{Page, UserForm};

/// Loads one page of users for a list URL.
#[async_trait]
pub trait ListFetcher: Send + Sync + 'static {
    /// `url` carries the canonical list parameters plus any unrelated ones.
    async fn fetch_page(&self, url: &Url) -> Result<Page<UserRecord>, ClientError>;
}

/// Write operations behind the create/edit/delete dialogs.
#[async_trait]
pub trait UserMutations: Send + Sync + 'static {
    async fn create_user(&self, form: &UserForm) -> Result<UserRecord, ClientError>;
    async fn update_user(&self, id: i32, form: &UserForm) -> Result<UserRecord, ClientError>;
    async fn delete_user(&self, id: i32) -> Result<(), ClientError>;
}

/// Browser-history stand-in; the list only ever replaces the current entry.
pub trait Navigator: Send + Sync + 'static {
    fn replace(&self, url: &Url);
}

/// In-memory history stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Arc<Mutex<Vec<Url>>>,
}

impl MemoryHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: Arc::new(Mutex::new(vec![initial])),
        }
    }

    pub fn current(&self) -> Option<Url> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Url>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for MemoryHistory {
    fn replace(&self, url: &Url) {
        let mut entries = self.lock();
        match entries.last_mut() {
            Some(last) => *last = url.clone(),
            None => entries.push(url.clone()),
        }
    }
}

/// JSON client for the users API.
#[derive(Debug, Clone)]
pub struct HttpUserClient {
    client: Client,
    users_url: Url,
}

impl HttpUserClient {
    /// `base_url` is the service root, e.g. `http://localhost:8080` or
    /// `http://host/admin` behind a path prefix.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut root = Url::parse(base_url)?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let users_url = root.join("api/v1/users")?;
        Ok(Self {
            client: Client::new(),
            users_url,
        })
    }

    fn user_url(&self, id: i32) -> Result<Url, ClientError> {
        Ok(self.users_url.join(&format!("users/{}", id))?)
    }
}

#[async_trait]
impl ListFetcher for HttpUserClient {
    async fn fetch_page(&self, url: &Url) -> Result<Page<UserRecord>, ClientError> {
        let mut request_url = self.users_url.clone();
        request_url.set_query(url.query());
        debug!(url = %request_url, "Fetching user page");

        let response = self.client.get(request_url).send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(error_from(response).await)
    }
}

#[async_trait]
impl UserMutations for HttpUserClient {
    async fn create_user(&self, form: &UserForm) -> Result<UserRecord, ClientError> {
        let response = self
            .client
            .post(self.users_url.clone())
            .json(form)
            .send()
            .await?;
        enveloped(response).await
    }

    async fn update_user(&self, id: i32, form: &UserForm) -> Result<UserRecord, ClientError> {
        let response = self.client.put(self.user_url(id)?).json(form).send().await?;
        enveloped(response).await
    }

    async fn delete_user(&self, id: i32) -> Result<(), ClientError> {
        let response = self.client.delete(self.user_url(id)?).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(error_from(response).await)
    }
}

async fn enveloped<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }

    let status = response.status().as_u16();
    let body: ApiResponse<T> = response.json().await?;
    body.data.ok_or_else(|| ClientError::Unexpected {
        status,
        message: body.message.unwrap_or_else(|| "response carried no data".into()),
    })
}

async fn error_from(response: Response) -> ClientError {
    let status = response.status();
    let body = response
        .json::<ApiResponse<serde_json::Value>>()
        .await
        .ok();

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(body.and_then(|b| b.errors).unwrap_or_default())
        }
        _ => ClientError::Unexpected {
            status: status.as_u16(),
            message: body
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::memory_database;
    use crate::interfaces::http::{create_api_router, AppState};
    use crate::shared::ListLimits;

    async fn serve() -> HttpUserClient {
        let db = memory_database().await.unwrap();
        let app = create_api_router(AppState::new(db, ListLimits::default()), None);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        HttpUserClient::new(&format!("http://{}", addr)).unwrap()
    }

    fn form(email: &str) -> UserForm {
        UserForm {
            name: "Jane Doe".into(),
            email: email.into(),
            phone_number: "+1 650 253 0000".into(),
            role: "cashier".into(),
            password: "secret123".into(),
            password_confirmation: "secret123".into(),
        }
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let client = HttpUserClient::new("http://host/admin").unwrap();
        assert_eq!(client.users_url.as_str(), "http://host/admin/api/v1/users");
        assert_eq!(client.user_url(7).unwrap().as_str(), "http://host/admin/api/v1/users/7");

        let client = HttpUserClient::new("http://host:8080/").unwrap();
        assert_eq!(client.users_url.as_str(), "http://host:8080/api/v1/users");
    }

    #[tokio::test]
    async fn create_list_update_delete_over_http() {
        let client = serve().await;

        let created = client.create_user(&form("jane@example.com")).await.unwrap();
        assert_eq!(created.email, "jane@example.com");

        let page_url = Url::parse("http://app.local/admin/users?tab=all&page=1&per_page=10").unwrap();
        let page = client.fetch_page(&page_url).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id, created.id);

        let mut edit = UserForm::for_edit(&created);
        edit.name = "Jane Roe".into();
        let updated = client.update_user(created.id, &edit).await.unwrap();
        assert_eq!(updated.name, "Jane Roe");

        client.delete_user(created.id).await.unwrap();
        assert_eq!(client.delete_user(created.id).await, Err(ClientError::NotFound));
    }

    #[tokio::test]
    async fn validation_errors_come_back_by_field() {
        let client = serve().await;
        client.create_user(&form("jane@example.com")).await.unwrap();

        let err = client.create_user(&form("jane@example.com")).await.unwrap_err();
        assert_eq!(
            err.field_errors().unwrap()["email"],
            vec!["The email has already been taken."]
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let client = HttpUserClient::new("http://127.0.0.1:9").unwrap();
        let url = Url::parse("http://app.local/users?page=1&per_page=10").unwrap();
        assert!(matches!(
            client.fetch_page(&url).await,
            Err(ClientError::Network(_))
        ));
    }

    #[test]
    fn history_replace_never_grows_the_stack() {
        let history = MemoryHistory::new(Url::parse("http://app.local/users").unwrap());
        history.replace(&Url::parse("http://app.local/users?page=2").unwrap());
        history.replace(&Url::parse("http://app.local/users?page=3").unwrap());
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().query(), Some("page=3"));
    }
}
