//! List synchronizer
//!
//! One task per list screen owns the table state and the current URL. Table
//! events arrive over a channel; every resulting request replaces the current
//! history entry and is tagged with a sequence number so that only the
//! newest response is ever shown. Filter edits are debounced, everything
//! else fires immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use url::Url;

use super::debounce::{until, Debouncer};
use super::fetcher::{ListFetcher, Navigator};
use super::translator::{request_url, Pagination, TableState};
use super::ClientError;
use crate::domain::UserRecord;
use crate::shared::{Filter, ListQuery, Page, Sort};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period before a filter edit is sent
    pub debounce: Duration,
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            channel_capacity: 32,
        }
    }
}

/// Changes reported by the table widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// 0-based page index
    SetPage(u32),
    SetPageSize(u32),
    SetSorting(Vec<Sort>),
    SetFiltering(Vec<Filter>),
    /// Re-fetch the current parameters unchanged
    Refresh,
}

/// What the list screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    /// URL of the latest request
    pub url: Url,
    pub query: ListQuery,
    /// Last page received; kept while a newer request is in flight
    pub page: Option<Page<UserRecord>>,
    pub loading: bool,
    pub error: Option<ClientError>,
    /// Sequence number of the latest issued request
    pub requests: u64,
}

type FetchResult = (u64, Result<Page<UserRecord>, ClientError>);

pub struct ListSynchronizer<F: ListFetcher, N: Navigator> {
    state: TableState,
    url: Url,
    fetcher: Arc<F>,
    navigator: Arc<N>,
    debounce: Debouncer<()>,
    seq: u64,
    results_tx: mpsc::UnboundedSender<FetchResult>,
    view_tx: watch::Sender<ListView>,
}

impl<F: ListFetcher, N: Navigator> ListSynchronizer<F, N> {
    /// Start the synchronizer for the screen at `url` and load its first page.
    ///
    /// The task runs until every [`ListHandle`] is dropped.
    pub fn spawn(url: Url, fetcher: Arc<F>, navigator: Arc<N>, config: SyncConfig) -> ListHandle {
        let state = TableState::from_url(&url);
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(ListView {
            url: url.clone(),
            query: state.to_query(),
            page: None,
            loading: false,
            error: None,
            requests: 0,
        });

        let synchronizer = Self {
            state,
            url,
            fetcher,
            navigator,
            debounce: Debouncer::new(config.debounce),
            seq: 0,
            results_tx,
            view_tx,
        };
        tokio::spawn(synchronizer.run(events_rx, results_rx));

        ListHandle {
            events: events_tx,
            view: view_rx,
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<TableEvent>,
        mut results: mpsc::UnboundedReceiver<FetchResult>,
    ) {
        self.issue();

        loop {
            let deadline = self.debounce.deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some((seq, result)) = results.recv() => self.apply(seq, result),
                _ = until(deadline) => {
                    if self.debounce.take_due().is_some() {
                        self.issue();
                    }
                }
            }
        }

        debug!("List synchronizer stopped");
    }

    fn handle(&mut self, event: TableEvent) {
        match event {
            TableEvent::SetPage(page_index) => {
                self.state.set_page_index(page_index);
                self.issue();
            }
            TableEvent::SetPageSize(page_size) => {
                self.state.set_page_size(page_size);
                self.issue();
            }
            TableEvent::SetSorting(sorting) => {
                self.state.set_sorting(sorting);
                self.issue();
            }
            TableEvent::SetFiltering(filters) => {
                self.state.set_filtering(filters);
                self.debounce.push(());
            }
            TableEvent::Refresh => self.issue(),
        }
    }

    /// Send the current state; any pending debounced filter rides along.
    fn issue(&mut self) {
        self.debounce.cancel();
        self.seq += 1;
        let seq = self.seq;

        let query = self.state.to_query();
        let url = request_url(&self.url, &query);
        self.navigator.replace(&url);
        self.url = url.clone();

        self.view_tx.send_modify(|view| {
            view.url = url.clone();
            view.query = query;
            view.loading = true;
            view.requests = seq;
        });

        let fetcher = Arc::clone(&self.fetcher);
        let results = self.results_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_page(&url).await;
            // The synchronizer may already be gone.
            let _ = results.send((seq, result));
        });
    }

    fn apply(&mut self, seq: u64, result: Result<Page<UserRecord>, ClientError>) {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "Discarding stale list response");
            return;
        }

        match result {
            Ok(page) => {
                // The server's page and page size win over what was asked,
                // and the history entry follows them.
                self.state.pagination = Pagination {
                    page_index: page.current_page.saturating_sub(1),
                    page_size: page.per_page.max(1),
                };
                let query = self.state.to_query();
                let url = request_url(&self.url, &query);
                if url != self.url {
                    debug!(requested = %self.url, resolved = %url, "Server adjusted list parameters");
                    self.navigator.replace(&url);
                    self.url = url.clone();
                }
                self.view_tx.send_modify(|view| {
                    view.url = url;
                    view.query = query;
                    view.page = Some(page);
                    view.loading = false;
                    view.error = None;
                });
            }
            Err(err) => {
                warn!(error = %err, "Failed to load users");
                self.view_tx.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(err);
                });
            }
        }
    }
}

/// Cloneable handle to a running synchronizer
#[derive(Debug, Clone)]
pub struct ListHandle {
    events: mpsc::Sender<TableEvent>,
    view: watch::Receiver<ListView>,
}

impl ListHandle {
    pub async fn send(&self, event: TableEvent) -> Result<(), ClientError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ClientError::Disconnected)
    }

    pub async fn set_page(&self, page_index: u32) -> Result<(), ClientError> {
        self.send(TableEvent::SetPage(page_index)).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<(), ClientError> {
        self.send(TableEvent::SetPageSize(page_size)).await
    }

    pub async fn set_sorting(&self, sorting: Vec<Sort>) -> Result<(), ClientError> {
        self.send(TableEvent::SetSorting(sorting)).await
    }

    pub async fn set_filtering(&self, filters: Vec<Filter>) -> Result<(), ClientError> {
        self.send(TableEvent::SetFiltering(filters)).await
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.send(TableEvent::Refresh).await
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView> {
        self.view.clone()
    }

    /// Wait until the view satisfies `condition` and return it.
    pub async fn wait_for(
        &self,
        condition: impl FnMut(&ListView) -> bool,
    ) -> Result<ListView, ClientError> {
        let mut view = self.view.clone();
        let matched = view
            .wait_for(condition)
            .await
            .map_err(|_| ClientError::Disconnected)?;
        Ok(matched.clone())
    }

    /// Wait for the latest issued request to settle.
    pub async fn settled(&self) -> Result<ListView, ClientError> {
        self.wait_for(|view| view.requests > 0 && !view.loading).await
    }
}
