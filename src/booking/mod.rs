//! Submitting a single time entry. A booking is only ever attempted once per user action; on
//! success the last booking timestamp moves forward and the reminder is told to calm down.

pub mod form;
pub mod hours;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    catalog::{Catalog, ProjectId, TaskId},
    config::{ConfigError, Credentials},
    moco::{endpoint::MocoEndpoint, entities::ActivityEntity, MocoTransport, TransportError},
    storage::LastBookingStore,
    utils::clock::Clock,
};

pub use form::BookingForm;
pub use hours::Hours;

/// A single time entry. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Always the day of submission.
    pub date: NaiveDate,
    pub hours: Hours,
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub description: String,
}

impl BookingRequest {
    pub fn new(
        date: NaiveDate,
        hours: Hours,
        project_id: ProjectId,
        task_id: TaskId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            hours,
            project_id,
            task_id,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingOutcome {
    pub booked_at: DateTime<Utc>,
}

/// Client side preconditions. These never reach the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Hours must be greater than 0")]
    NonPositiveHours,
    #[error("Invalid project or task ID")]
    InvalidSelection,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{}", rejection_message(*status, body.as_deref()))]
    Rejected { status: u16, body: Option<String> },
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("Error creating booking data")]
    Encode(String),
}

fn rejection_message(status: u16, body: Option<&str>) -> String {
    match body {
        Some(body) => format!("Booking failed: {status} - {body}"),
        None => format!("Booking failed: {status}"),
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Whoever drives the reminder indicator. Called once per successful booking.
#[cfg_attr(test, mockall::automock)]
pub trait BookingListener: Send + Sync {
    fn on_booking_completed(&self, booked_at: DateTime<Utc>);
}

/// For one-shot bookings where nothing in this process is reminding anyone.
pub struct NoListener;

impl BookingListener for NoListener {
    fn on_booking_completed(&self, _booked_at: DateTime<Utc>) {}
}

pub struct BookingSubmitter<T> {
    transport: Arc<T>,
    store: Arc<dyn LastBookingStore>,
    listener: Arc<dyn BookingListener>,
    clock: Arc<dyn Clock>,
}

impl<T: MocoTransport> BookingSubmitter<T> {
    pub fn new(
        transport: Arc<T>,
        store: Arc<dyn LastBookingStore>,
        listener: Arc<dyn BookingListener>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            store,
            listener,
            clock,
        }
    }

    /// Validates and posts `request`. Checks run in a fixed order and stop at the first
    /// failure: hours, domain, api key, endpoint, then the selection against `catalog`.
    /// Nothing is retried; a failed submission leaves every piece of state untouched.
    pub async fn submit(
        &self,
        request: &BookingRequest,
        catalog: &Catalog,
        credentials: &Credentials,
    ) -> Result<BookingOutcome, BookingError> {
        let endpoint = preflight(request.hours, credentials)?;
        self.post(endpoint, request, catalog, credentials).await
    }

    /// Submits what's in the form and clears it once the booking went through. The form is kept
    /// as is on failure so the user can fix it and try again.
    pub async fn submit_form(
        &self,
        form: &mut BookingForm,
        catalog: &Catalog,
        credentials: &Credentials,
    ) -> Result<BookingOutcome, BookingError> {
        let endpoint = preflight(form.hours, credentials)?;
        let request = form
            .to_request(self.clock.today())
            .ok_or(ValidationError::InvalidSelection)?;

        let outcome = self.post(endpoint, &request, catalog, credentials).await?;
        form.reset();
        Ok(outcome)
    }

    #[instrument(skip_all, fields(project_id = %request.project_id, task_id = %request.task_id))]
    async fn post(
        &self,
        endpoint: MocoEndpoint,
        request: &BookingRequest,
        catalog: &Catalog,
        credentials: &Credentials,
    ) -> Result<BookingOutcome, BookingError> {
        if !catalog.contains(request.project_id, request.task_id) {
            warn!("Selection is not part of the current catalog");
            return Err(ValidationError::InvalidSelection.into());
        }

        let body = serde_json::to_value(ActivityEntity::from(request))
            .map_err(|e| SubmitError::Encode(e.to_string()))?;

        let response = self
            .transport
            .post_json(endpoint.activities(), credentials.api_key(), body)
            .await
            .map_err(|e| {
                warn!("Error booking time: {e}");
                SubmitError::from(e)
            })?;

        if !matches!(response.status, 200 | 201) {
            warn!(status = response.status, body = %response.body, "Booking rejected");
            let body = Some(response.body).filter(|b| !b.is_empty());
            return Err(SubmitError::Rejected {
                status: response.status,
                body,
            }
            .into());
        }

        let booked_at = self.clock.time();
        info!(%booked_at, hours = %request.hours, "Booking successful");

        // MOCO already has the entry at this point, a failed write must not turn it into an error.
        if let Err(e) = self.store.record(booked_at).await {
            error!("Failed to persist last booking time: {e:?}");
        }
        self.listener.on_booking_completed(booked_at);

        Ok(BookingOutcome { booked_at })
    }
}

fn preflight(hours: Hours, credentials: &Credentials) -> Result<MocoEndpoint, BookingError> {
    if !hours.is_positive() {
        return Err(ValidationError::NonPositiveHours.into());
    }
    Ok(credentials.endpoint()?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use mockall::predicate::eq;
    use serde_json::json;

    use crate::{
        catalog::{Catalog, Project, ProjectId, Task, TaskId},
        config::{ConfigError, Credentials},
        moco::{MockMocoTransport, RawResponse, TransportError},
        storage::MockLastBookingStore,
        utils::clock::ManualClock,
    };

    use super::{
        BookingError, BookingForm, BookingRequest, BookingSubmitter, Hours, MockBookingListener,
        SubmitError, ValidationError,
    };

    fn catalog() -> Catalog {
        Catalog::from_projects(vec![Project {
            id: ProjectId::new(10),
            name: "Website".into(),
            tasks: vec![Task {
                id: TaskId::new(100),
                name: "Design".into(),
            }],
        }])
    }

    fn request(hours: Hours) -> BookingRequest {
        BookingRequest::new(
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            hours,
            ProjectId::new(10),
            TaskId::new(100),
            "work",
        )
    }

    fn clock() -> ManualClock {
        ManualClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap())
    }

    fn untouched_store() -> MockLastBookingStore {
        let mut store = MockLastBookingStore::new();
        store.expect_record().never();
        store
    }

    fn silent_listener() -> MockBookingListener {
        let mut listener = MockBookingListener::new();
        listener.expect_on_booking_completed().never();
        listener
    }

    fn offline_transport() -> MockMocoTransport {
        let mut transport = MockMocoTransport::new();
        transport.expect_post_json().never();
        transport
    }

    fn submitter(
        transport: MockMocoTransport,
        store: MockLastBookingStore,
        listener: MockBookingListener,
        clock: ManualClock,
    ) -> BookingSubmitter<MockMocoTransport> {
        BookingSubmitter::new(
            Arc::new(transport),
            Arc::new(store),
            Arc::new(listener),
            Arc::new(clock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_booking_updates_timestamp_and_notifies() {
        let clock = clock();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap();

        let mut transport = MockMocoTransport::new();
        transport
            .expect_post_json()
            .withf(|url, key, body| {
                url.as_str() == "https://acme.mocoapp.com/api/v1/activities"
                    && key == "k"
                    && *body
                        == json!({
                            "date": "2024-05-02",
                            "hours": 1.5,
                            "project_id": 10,
                            "task_id": 100,
                            "description": "work",
                        })
            })
            .times(1)
            .returning(|_, _, _| Ok(RawResponse::new(201, "{}")));

        let mut store = MockLastBookingStore::new();
        store
            .expect_record()
            .with(eq(now))
            .times(1)
            .returning(|_| Ok(()));

        let mut listener = MockBookingListener::new();
        listener
            .expect_on_booking_completed()
            .with(eq(now))
            .times(1)
            .return_const(());

        let submitter = submitter(transport, store, listener, clock);
        let outcome = submitter
            .submit(&request(Hours::from_quarters(6)), &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap();

        assert_eq!(outcome.booked_at, now);
    }

    #[tokio::test]
    async fn test_zero_hours_never_reaches_network() {
        let submitter = submitter(offline_transport(), untouched_store(), silent_listener(), clock());

        let error = submitter
            .submit(&request(Hours::ZERO), &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();

        assert_eq!(error, BookingError::Validation(ValidationError::NonPositiveHours));
        assert_eq!(error.to_string(), "Hours must be greater than 0");
    }

    #[tokio::test]
    async fn test_validation_order() {
        let submitter = submitter(offline_transport(), untouched_store(), silent_listener(), clock());
        let hours = Hours::from_quarters(4);
        let unknown = BookingRequest {
            task_id: TaskId::new(999),
            ..request(hours)
        };

        let cases = [
            (Credentials::new("", ""), BookingError::Config(ConfigError::MissingDomain)),
            (Credentials::new("acme", ""), BookingError::Config(ConfigError::MissingApiKey)),
            (
                Credentials::new("a b", "k"),
                BookingError::Config(ConfigError::InvalidDomain("a b".into())),
            ),
            (
                Credentials::new("acme", "k"),
                BookingError::Validation(ValidationError::InvalidSelection),
            ),
        ];

        for (credentials, expected) in cases {
            let error = submitter
                .submit(&unknown, &catalog(), &credentials)
                .await
                .unwrap_err();
            assert_eq!(error, expected);
        }
    }

    #[tokio::test]
    async fn test_rejected_booking_keeps_state() {
        let mut transport = MockMocoTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_, _, _| {
                Ok(RawResponse::new(422, r#"{"message":"task is inactive"}"#))
            });

        let submitter = submitter(transport, untouched_store(), silent_listener(), clock());
        let error = submitter
            .submit(&request(Hours::from_quarters(2)), &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();

        assert_eq!(
            error,
            BookingError::Submit(SubmitError::Rejected {
                status: 422,
                body: Some(r#"{"message":"task is inactive"}"#.into()),
            })
        );
        assert_eq!(
            error.to_string(),
            r#"Booking failed: 422 - {"message":"task is inactive"}"#
        );
    }

    #[tokio::test]
    async fn test_other_success_statuses_are_failures() {
        let mut transport = MockMocoTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_, _, _| Ok(RawResponse::new(204, "")));

        let submitter = submitter(transport, untouched_store(), silent_listener(), clock());
        let error = submitter
            .submit(&request(Hours::from_quarters(2)), &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Booking failed: 204");
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let mut transport = MockMocoTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_, _, _| Err(TransportError("connection refused".into())));

        let submitter = submitter(transport, untouched_store(), silent_listener(), clock());
        let error = submitter
            .submit(&request(Hours::from_quarters(2)), &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_store_failure_still_counts_as_booked() {
        let mut transport = MockMocoTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _, _| Ok(RawResponse::new(200, "{}")));
        let mut store = MockLastBookingStore::new();
        store
            .expect_record()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        let mut listener = MockBookingListener::new();
        listener.expect_on_booking_completed().times(1).return_const(());

        let submitter = submitter(transport, store, listener, clock());

        assert!(submitter
            .submit(&request(Hours::from_quarters(2)), &catalog(), &Credentials::new("acme", "k"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_form_reset_only_after_success() {
        let mut transport = MockMocoTransport::new();
        let mut responses = vec![RawResponse::new(201, "{}"), RawResponse::new(500, "boom")];
        transport
            .expect_post_json()
            .times(2)
            .returning(move |_, _, _| Ok(responses.pop().unwrap()));
        let mut store = MockLastBookingStore::new();
        store.expect_record().times(1).returning(|_| Ok(()));
        let mut listener = MockBookingListener::new();
        listener.expect_on_booking_completed().times(1).return_const(());

        let submitter = submitter(transport, store, listener, clock());
        let catalog = catalog();
        let credentials = Credentials::new("acme", "k");

        let mut form = BookingForm::default();
        form.restore_selection(&catalog);
        form.select_task(TaskId::new(100));
        form.increment();
        form.description = "work".into();
        let filled = form.clone();

        let error = submitter
            .submit_form(&mut form, &catalog, &credentials)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Booking failed: 500 - boom");
        assert_eq!(form, filled);

        submitter
            .submit_form(&mut form, &catalog, &credentials)
            .await
            .unwrap();
        assert_eq!(form, BookingForm::default());
    }

    #[tokio::test]
    async fn test_form_without_selection() {
        let submitter = submitter(offline_transport(), untouched_store(), silent_listener(), clock());
        let mut form = BookingForm::default();

        let error = submitter
            .submit_form(&mut form, &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();
        assert_eq!(error, BookingError::Validation(ValidationError::NonPositiveHours));

        form.increment();
        let error = submitter
            .submit_form(&mut form, &catalog(), &Credentials::new("acme", "k"))
            .await
            .unwrap_err();
        assert_eq!(error, BookingError::Validation(ValidationError::InvalidSelection));
    }
}
