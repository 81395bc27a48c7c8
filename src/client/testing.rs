//! In-memory fakes for client tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use url::Url;

use super::{ClientError, ListFetcher, UserMutations};
use crate::domain::{UserRecord, UserRole, UserStatus};
use crate::shared::{ListLimits, ListParams, Page, UserForm};

pub fn record(id: i32) -> UserRecord {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(id.into());
    UserRecord {
        id,
        name: format!("User {:03}", id),
        email: format!("user{:03}@example.com", id),
        phone_number: format!("+1650253{:04}", id),
        role: UserRole::Cashier,
        status: UserStatus::Active,
        created_at: created,
        updated_at: created,
    }
}

/// Serves pages out of a fixed user list and records every URL it was asked for.
pub struct FakeFetcher {
    users: Vec<UserRecord>,
    calls: Mutex<Vec<Url>>,
    slow_page: Option<(u32, Duration)>,
    fail_next: Mutex<Option<ClientError>>,
}

impl FakeFetcher {
    pub fn with_users(count: i32) -> Self {
        Self {
            users: (1..=count).map(record).collect(),
            calls: Mutex::new(Vec::new()),
            slow_page: None,
            fail_next: Mutex::new(None),
        }
    }

    /// Delay responses for one page number.
    pub fn slow_on_page(mut self, page: u32, delay: Duration) -> Self {
        self.slow_page = Some((page, delay));
        self
    }

    pub fn fail_next(&self, err: ClientError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListFetcher for FakeFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<Page<UserRecord>, ClientError> {
        self.calls.lock().unwrap().push(url.clone());
        let failure = self.fail_next.lock().unwrap().take();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let query = ListParams::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .resolve(ListLimits::default())
            .map_err(ClientError::Validation)?;

        if let Some((page, delay)) = self.slow_page {
            if page == query.page {
                tokio::time::sleep(delay).await;
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let start = ((query.page - 1) * query.per_page) as usize;
        let data: Vec<UserRecord> = self
            .users
            .iter()
            .skip(start)
            .take(query.per_page as usize)
            .cloned()
            .collect();
        Ok(Page::new(data, self.users.len() as u64, query.page, query.per_page))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationCall {
    Create(UserForm),
    Update(i32, UserForm),
    Delete(i32),
}

/// Records mutations and answers with a scripted result.
#[derive(Default)]
pub struct FakeMutations {
    calls: Mutex<Vec<MutationCall>>,
    fail_with: Mutex<Option<ClientError>>,
    delay: Option<Duration>,
}

impl FakeMutations {
    pub fn failing(err: ClientError) -> Self {
        Self {
            fail_with: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<MutationCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, call: MutationCall) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserMutations for FakeMutations {
    async fn create_user(&self, form: &UserForm) -> Result<UserRecord, ClientError> {
        self.respond(MutationCall::Create(form.clone())).await?;
        Ok(UserRecord {
            name: form.name.clone(),
            email: form.email.clone(),
            ..record(999)
        })
    }

    async fn update_user(&self, id: i32, form: &UserForm) -> Result<UserRecord, ClientError> {
        self.respond(MutationCall::Update(id, form.clone())).await?;
        Ok(UserRecord {
            name: form.name.clone(),
            email: form.email.clone(),
            ..record(id)
        })
    }

    async fn delete_user(&self, id: i32) -> Result<(), ClientError> {
        self.respond(MutationCall::Delete(id)).await
    }
}
