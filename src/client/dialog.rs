//! Create / edit / delete dialogs
//!
//! `DialogState` is the pure state machine; `UserDialogs` drives it with
//! form data, client-side validation, the mutation calls and the list
//! refresh that follows every successful write.

use std::sync::Arc;

use tracing::{info, warn};

use super::fetcher::UserMutations;
use super::sync::ListHandle;
use super::ClientError;
use crate::domain::UserRecord;
use crate::shared::validations::to_field_errors;
use crate::shared::{FieldErrors, FormMode, UserForm};

pub const CONFIRMATION_FIELD: &str = "confirmation";

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Closed,
    Creating { submitting: bool },
    Editing { record: UserRecord, submitting: bool },
    Deleting { record: UserRecord, submitting: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    OpenCreate,
    OpenEdit(UserRecord),
    OpenDelete(UserRecord),
    Close,
    Submit,
    Succeeded,
    Failed,
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        match self {
            Self::Closed => false,
            Self::Creating { submitting }
            | Self::Editing { submitting, .. }
            | Self::Deleting { submitting, .. } => *submitting,
        }
    }

    /// Next state, or `None` when `event` is not allowed here.
    ///
    /// Dialogs only open from `Closed`, cannot be closed or re-submitted
    /// while a submission is in flight, and only a submitting dialog can
    /// succeed or fail.
    pub fn next(&self, event: DialogEvent) -> Option<Self> {
        match (self, event) {
            (Self::Closed, DialogEvent::OpenCreate) => Some(Self::Creating { submitting: false }),
            (Self::Closed, DialogEvent::OpenEdit(record)) => Some(Self::Editing {
                record,
                submitting: false,
            }),
            (Self::Closed, DialogEvent::OpenDelete(record)) => Some(Self::Deleting {
                record,
                submitting: false,
            }),
            (Self::Closed, _) => None,

            (open, DialogEvent::Close) if !open.is_submitting() => Some(Self::Closed),
            (open, DialogEvent::Submit) if !open.is_submitting() => Some(open.with_submitting(true)),
            (open, DialogEvent::Succeeded) if open.is_submitting() => Some(Self::Closed),
            (open, DialogEvent::Failed) if open.is_submitting() => Some(open.with_submitting(false)),
            _ => None,
        }
    }

    /// Apply `event` in place; returns whether it was accepted.
    pub fn transition(&mut self, event: DialogEvent) -> bool {
        match self.next(event) {
            Some(next) => {
                *self = next;
                true
            }
            None => false,
        }
    }

    fn with_submitting(&self, submitting: bool) -> Self {
        match self {
            Self::Closed => Self::Closed,
            Self::Creating { .. } => Self::Creating { submitting },
            Self::Editing { record, .. } => Self::Editing {
                record: record.clone(),
                submitting,
            },
            Self::Deleting { record, .. } => Self::Deleting {
                record: record.clone(),
                submitting,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style message shown after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            kind: NoticeKind::Error,
            message,
        }
    }
}

/// A validated write, ready to send
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(UserForm),
    Update(i32, UserForm),
    Delete(i32),
}

impl Submission {
    pub async fn send<M: UserMutations + ?Sized>(&self, mutations: &M) -> Result<(), ClientError> {
        match self {
            Self::Create(form) => mutations.create_user(form).await.map(|_| ()),
            Self::Update(id, form) => mutations.update_user(*id, form).await.map(|_| ()),
            Self::Delete(id) => mutations.delete_user(*id).await,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Self::Create(_) => "User created successfully.",
            Self::Update(..) => "User updated successfully.",
            Self::Delete(_) => "User deleted successfully.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; the dialog closed and the list is re-fetching
    Saved,
    /// Field errors, from the form itself or from the server
    Invalid,
    /// Any other failure; see the notice
    Failed,
    /// No open dialog, or a submission already in flight
    Ignored,
}

enum Target {
    Create,
    Update(i32),
    Delete(i32, String),
}

pub struct UserDialogs<M: UserMutations> {
    state: DialogState,
    form: UserForm,
    confirmation: String,
    errors: FieldErrors,
    notice: Option<Notice>,
    in_flight: Option<Submission>,
    mutations: Arc<M>,
    list: ListHandle,
}

impl<M: UserMutations> UserDialogs<M> {
    pub fn new(mutations: Arc<M>, list: ListHandle) -> Self {
        Self {
            state: DialogState::Closed,
            form: UserForm::default(),
            confirmation: String::new(),
            errors: FieldErrors::new(),
            notice: None,
            in_flight: None,
            mutations,
            list,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn form(&self) -> &UserForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut UserForm {
        &mut self.form
    }

    pub fn set_confirmation(&mut self, text: impl Into<String>) {
        self.confirmation = text.into();
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn open_create(&mut self) -> bool {
        self.open(DialogEvent::OpenCreate, UserForm::default())
    }

    /// Open the edit dialog pre-filled from `record`, passwords empty.
    pub fn open_edit(&mut self, record: UserRecord) -> bool {
        let form = UserForm::for_edit(&record);
        self.open(DialogEvent::OpenEdit(record), form)
    }

    pub fn open_delete(&mut self, record: UserRecord) -> bool {
        self.open(DialogEvent::OpenDelete(record), UserForm::default())
    }

    pub fn close(&mut self) -> bool {
        self.state.transition(DialogEvent::Close)
    }

    fn open(&mut self, event: DialogEvent, form: UserForm) -> bool {
        if !self.state.transition(event) {
            return false;
        }
        self.form = form;
        self.confirmation.clear();
        self.errors.clear();
        true
    }

    /// Validate the open dialog and mark it submitting.
    ///
    /// Returns `None` with `errors()` filled when the input is invalid, and
    /// `None` without touching anything when there is nothing to submit or
    /// a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.state.is_open() || self.state.is_submitting() {
            return None;
        }

        let target = match &self.state {
            DialogState::Closed => return None,
            DialogState::Creating { .. } => Target::Create,
            DialogState::Editing { record, .. } => Target::Update(record.id),
            DialogState::Deleting { record, .. } => Target::Delete(record.id, record.email.clone()),
        };

        let submission = match target {
            Target::Create => self.checked_form(FormMode::Create).map(Submission::Create),
            Target::Update(id) => self
                .checked_form(FormMode::Edit)
                .map(|form| Submission::Update(id, form)),
            Target::Delete(id, email) => {
                if self.confirmation.trim() == email {
                    Some(Submission::Delete(id))
                } else {
                    self.errors = FieldErrors::from([(
                        CONFIRMATION_FIELD.to_string(),
                        vec!["The email address does not match.".to_string()],
                    )]);
                    None
                }
            }
        }?;

        self.errors.clear();
        self.state.transition(DialogEvent::Submit);
        self.in_flight = Some(submission.clone());
        Some(submission)
    }

    fn checked_form(&mut self, mode: FormMode) -> Option<UserForm> {
        let form = self.form.normalized();
        match form.check(mode) {
            Ok(()) => Some(form),
            Err(errors) => {
                self.errors = to_field_errors(&errors);
                None
            }
        }
    }

    /// Settle the in-flight submission with its result.
    pub async fn finish(&mut self, result: Result<(), ClientError>) -> SubmitOutcome {
        let Some(submission) = self.in_flight.take() else {
            return SubmitOutcome::Ignored;
        };

        match result {
            Ok(()) => {
                self.state.transition(DialogEvent::Succeeded);
                self.form = UserForm::default();
                self.confirmation.clear();
                self.notice = Some(Notice::success(submission.success_message()));
                info!(action = submission.action(), "User mutation saved");

                if let Err(err) = self.list.refresh().await {
                    warn!(error = %err, "Could not refresh user list");
                }
                SubmitOutcome::Saved
            }
            Err(ClientError::Validation(errors)) => {
                self.state.transition(DialogEvent::Failed);
                self.errors = errors;
                SubmitOutcome::Invalid
            }
            Err(err) => {
                self.state.transition(DialogEvent::Failed);
                warn!(error = %err, "User mutation failed");
                self.notice = Some(Notice::error(err.to_string()));
                SubmitOutcome::Failed
            }
        }
    }

    /// Validate, send and settle the open dialog.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.state.is_open() || self.state.is_submitting() {
            return SubmitOutcome::Ignored;
        }
        let Some(submission) = self.begin_submit() else {
            return SubmitOutcome::Invalid;
        };
        let result = submission.send(self.mutations.as_ref()).await;
        self.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::client::testing::{record, FakeFetcher, FakeMutations, MutationCall};
    use crate::client::{ListSynchronizer, MemoryHistory, SyncConfig};

    async fn list(fetcher: &Arc<FakeFetcher>) -> ListHandle {
        let url = Url::parse("http://app.local/users?page=2&sort=name&direction=asc").unwrap();
        let history = Arc::new(MemoryHistory::new(url.clone()));
        let handle = ListSynchronizer::spawn(url, Arc::clone(fetcher), history, SyncConfig::default());
        handle.settled().await.unwrap();
        handle
    }

    fn filled_form() -> UserForm {
        UserForm {
            name: " Jane Doe ".into(),
            email: "jane@example.com".into(),
            phone_number: "+1 650 253 0000".into(),
            role: "Manager".into(),
            password: "secret123".into(),
            password_confirmation: "secret123".into(),
        }
    }

    #[test]
    fn dialogs_only_open_from_closed() {
        let mut state = DialogState::Closed;
        assert!(state.transition(DialogEvent::OpenCreate));
        assert!(!state.transition(DialogEvent::OpenEdit(record(1))));
        assert!(state.transition(DialogEvent::Close));
        assert!(state.transition(DialogEvent::OpenDelete(record(1))));
        assert_eq!(
            state,
            DialogState::Deleting {
                record: record(1),
                submitting: false
            }
        );
    }

    #[test]
    fn submitting_dialog_cannot_close_or_resubmit() {
        let mut state = DialogState::Closed;
        state.transition(DialogEvent::OpenEdit(record(3)));
        assert!(state.transition(DialogEvent::Submit));
        assert!(state.is_submitting());
        assert!(!state.transition(DialogEvent::Submit));
        assert!(!state.transition(DialogEvent::Close));

        assert!(state.transition(DialogEvent::Failed));
        assert!(!state.is_submitting());
        assert!(state.is_open());
        assert!(!state.transition(DialogEvent::Succeeded));
    }

    #[test]
    fn closed_dialog_ignores_results() {
        let state = DialogState::Closed;
        assert_eq!(state.next(DialogEvent::Succeeded), None);
        assert_eq!(state.next(DialogEvent::Submit), None);
    }

    #[tokio::test]
    async fn successful_create_closes_and_refetches_same_params() {
        let fetcher = Arc::new(FakeFetcher::with_users(25));
        let list = list(&fetcher).await;
        let mutations = Arc::new(FakeMutations::default());
        let mut dialogs = UserDialogs::new(Arc::clone(&mutations), list.clone());

        assert!(dialogs.open_create());
        *dialogs.form_mut() = filled_form();
        assert_eq!(dialogs.submit().await, SubmitOutcome::Saved);

        assert_eq!(dialogs.state(), &DialogState::Closed);
        assert_eq!(dialogs.notice().unwrap().message, "User created successfully.");
        assert_eq!(
            mutations.calls(),
            vec![MutationCall::Create(filled_form().normalized())]
        );

        list.wait_for(|v| v.requests == 2 && !v.loading).await.unwrap();
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_server() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let mutations = Arc::new(FakeMutations::default());
        let mut dialogs = UserDialogs::new(Arc::clone(&mutations), list(&fetcher).await);

        dialogs.open_create();
        dialogs.form_mut().email = "jane@".into();
        assert_eq!(dialogs.submit().await, SubmitOutcome::Invalid);

        assert!(mutations.calls().is_empty());
        assert_eq!(dialogs.errors()["name"], vec!["Name is required."]);
        assert_eq!(dialogs.errors()["email"], vec!["Email is invalid."]);
        assert_eq!(dialogs.state(), &DialogState::Creating { submitting: false });
    }

    #[tokio::test]
    async fn server_field_errors_keep_dialog_open() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let taken = FieldErrors::from([(
            "email".to_string(),
            vec!["The email has already been taken.".to_string()],
        )]);
        let mutations = Arc::new(FakeMutations::failing(ClientError::Validation(taken.clone())));
        let mut dialogs = UserDialogs::new(mutations, list(&fetcher).await);

        dialogs.open_create();
        *dialogs.form_mut() = filled_form();
        assert_eq!(dialogs.submit().await, SubmitOutcome::Invalid);

        assert_eq!(dialogs.errors(), &taken);
        assert_eq!(dialogs.state(), &DialogState::Creating { submitting: false });
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn edit_prefills_and_keeps_password_when_blank() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let mutations = Arc::new(FakeMutations::default());
        let mut dialogs = UserDialogs::new(Arc::clone(&mutations), list(&fetcher).await);

        let user = record(4);
        dialogs.open_edit(user.clone());
        assert_eq!(dialogs.form(), &UserForm::for_edit(&user));
        assert!(dialogs.form().password.is_empty());

        dialogs.form_mut().name = "Renamed".into();
        assert_eq!(dialogs.submit().await, SubmitOutcome::Saved);

        let MutationCall::Update(id, form) = &mutations.calls()[0] else {
            panic!("expected an update");
        };
        assert_eq!(*id, 4);
        assert_eq!(form.name, "Renamed");
        assert!(serde_json::to_value(form).unwrap().get("password").is_none());
    }

    #[tokio::test]
    async fn delete_requires_matching_email() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let mutations = Arc::new(FakeMutations::default());
        let mut dialogs = UserDialogs::new(Arc::clone(&mutations), list(&fetcher).await);

        let user = record(2);
        dialogs.open_delete(user.clone());
        dialogs.set_confirmation("someone@else.com");
        assert_eq!(dialogs.submit().await, SubmitOutcome::Invalid);
        assert!(dialogs.errors().contains_key(CONFIRMATION_FIELD));
        assert!(mutations.calls().is_empty());

        dialogs.set_confirmation(format!("  {}  ", user.email));
        assert_eq!(dialogs.submit().await, SubmitOutcome::Saved);
        assert_eq!(mutations.calls(), vec![MutationCall::Delete(2)]);
        assert_eq!(dialogs.notice().unwrap().message, "User deleted successfully.");
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let mutations = Arc::new(FakeMutations::slow(Duration::from_millis(10)));
        let mut dialogs = UserDialogs::new(Arc::clone(&mutations), list(&fetcher).await);

        dialogs.open_delete(record(1));
        dialogs.set_confirmation(record(1).email);

        let first = dialogs.begin_submit().unwrap();
        assert!(dialogs.begin_submit().is_none());
        assert_eq!(dialogs.submit().await, SubmitOutcome::Ignored);
        assert!(!dialogs.close());

        let result = first.send(mutations.as_ref()).await;
        assert_eq!(dialogs.finish(result).await, SubmitOutcome::Saved);
        assert_eq!(mutations.calls().len(), 1);
    }

    #[tokio::test]
    async fn network_failure_reports_and_stays_open() {
        let fetcher = Arc::new(FakeFetcher::with_users(5));
        let mutations = Arc::new(FakeMutations::failing(ClientError::Network("timed out".into())));
        let mut dialogs = UserDialogs::new(mutations, list(&fetcher).await);

        dialogs.open_create();
        *dialogs.form_mut() = filled_form();
        assert_eq!(dialogs.submit().await, SubmitOutcome::Failed);

        let notice = dialogs.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("timed out"));
        assert!(dialogs.state().is_open());
        assert!(!dialogs.state().is_submitting());
    }
}
