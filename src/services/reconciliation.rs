//! Day-closing reconciliation.
//!
//! Past dates still holding `active` bookings are walked oldest first. Each
//! date whose business day is over is presented to the operator, who may mark
//! no-shows before finalizing the rest as `completed`. Finalizing a date moves
//! on to the next one until nothing is left.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use super::bookings::apply_status;
use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingFilter, BookingStatus},
    repository::{BookingRepository, Repository},
    scheduling::{has_schedule_on_date, is_day_over},
};

/// A past date with bookings waiting for an operator decision
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PendingDay {
    pub date: NaiveDate,
    pub pending_bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    ScanningPastDates,
    PresentingPendingDay(PendingDay),
    AwaitingOperatorDecision(PendingDay),
    Finalizing(NaiveDate),
}

/// Outcome of finalizing one date
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FinalizeReport {
    pub date: NaiveDate,
    /// Bookings moved to `completed`
    pub completed: Vec<Uuid>,
    /// Bookings whose update failed; the date stays pending for the next scan
    pub failed: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FinalizeOutcome {
    pub report: FinalizeReport,
    /// Next date to reconcile, if the chain goes on
    pub next: Option<PendingDay>,
}

/// Oldest past date with `active` bookings whose business day had a schedule
/// and is over at `now`
pub async fn find_pending_day(
    repository: &dyn BookingRepository,
    company_id: &str,
    now: NaiveDateTime,
) -> AppResult<Option<PendingDay>> {
    let filter = BookingFilter::before(now.date()).with_statuses(&[BookingStatus::Active]);
    let stale = repository.list_bookings(company_id, &filter).await?;
    if stale.is_empty() {
        return Ok(None);
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<Booking>> = BTreeMap::new();
    for booking in stale {
        by_date.entry(booking.date).or_default().push(booking);
    }

    let team = repository.list_working_hours(company_id).await?;
    let all_hours = || team.iter().map(|p| &p.hours);

    for (date, pending_bookings) in by_date {
        if !has_schedule_on_date(date, all_hours()) {
            tracing::debug!(company_id, %date, "Skipping date without schedule");
            continue;
        }
        if !is_day_over(date, all_hours(), now)? {
            tracing::debug!(company_id, %date, "Skipping date whose shift is not over");
            continue;
        }
        return Ok(Some(PendingDay { date, pending_bookings }));
    }
    Ok(None)
}

/// Move every booking still `active` on `date` to `completed`.
///
/// Statuses are re-read first, so bookings marked meanwhile are left alone and
/// running this twice changes nothing the second time. Failed updates are
/// collected, not rolled back.
pub async fn finalize_day(
    repository: &dyn BookingRepository,
    company_id: &str,
    date: NaiveDate,
) -> AppResult<FinalizeReport> {
    let filter = BookingFilter::on(date).with_statuses(&[BookingStatus::Active]);
    let active = repository.list_bookings(company_id, &filter).await?;

    let mut report = FinalizeReport {
        date,
        completed: Vec::new(),
        failed: Vec::new(),
    };
    for booking in active {
        match repository
            .update_booking_status(company_id, booking.id, BookingStatus::Completed)
            .await
        {
            Ok(()) => report.completed.push(booking.id),
            Err(e) => {
                tracing::warn!(company_id, booking_id = %booking.id, %date, "Failed to complete booking: {}", e);
                report.failed.push(booking.id);
            }
        }
    }

    tracing::info!(
        company_id,
        %date,
        completed = report.completed.len(),
        failed = report.failed.len(),
        "Day finalized"
    );
    Ok(report)
}

/// One operator's reconciliation run for a company
#[derive(Debug)]
pub struct ReconciliationWorkflow {
    company_id: String,
    state: WorkflowState,
}

impl ReconciliationWorkflow {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    /// Begin a run. Refused while a previous run is still presenting a day.
    pub async fn start(
        &mut self,
        repository: &dyn BookingRepository,
        now: NaiveDateTime,
    ) -> AppResult<Option<PendingDay>> {
        if self.state != WorkflowState::Idle {
            return Err(AppError::Busy(format!(
                "Reconciliation already running for company {}",
                self.company_id
            )));
        }
        self.scan(repository, now).await
    }

    async fn scan(
        &mut self,
        repository: &dyn BookingRepository,
        now: NaiveDateTime,
    ) -> AppResult<Option<PendingDay>> {
        self.state = WorkflowState::ScanningPastDates;
        match find_pending_day(repository, &self.company_id, now).await {
            Ok(Some(day)) => {
                self.state = WorkflowState::PresentingPendingDay(day.clone());
                Ok(Some(day))
            }
            Ok(None) => {
                self.state = WorkflowState::Idle;
                Ok(None)
            }
            Err(e) => {
                self.state = WorkflowState::Idle;
                Err(e)
            }
        }
    }

    /// The day currently in front of the operator
    pub fn pending_day(&self) -> Option<&PendingDay> {
        match &self.state {
            WorkflowState::PresentingPendingDay(day)
            | WorkflowState::AwaitingOperatorDecision(day) => Some(day),
            _ => None,
        }
    }

    fn take_pending_day(&self) -> AppResult<PendingDay> {
        self.pending_day().cloned().ok_or_else(|| {
            AppError::BusinessRule("No pending day is being reconciled".to_string())
        })
    }

    /// Mark one pending booking as a no-show and drop it from the pending set
    pub async fn mark_no_show(
        &mut self,
        repository: &dyn BookingRepository,
        booking_id: Uuid,
    ) -> AppResult<PendingDay> {
        let mut day = self.take_pending_day()?;
        if !day.pending_bookings.iter().any(|b| b.id == booking_id) {
            return Err(AppError::BusinessRule(format!(
                "Booking {} is not pending on {}",
                booking_id, day.date
            )));
        }

        apply_status(repository, &self.company_id, booking_id, BookingStatus::NoShow).await?;

        day.pending_bookings.retain(|b| b.id != booking_id);
        self.state = WorkflowState::AwaitingOperatorDecision(day.clone());
        Ok(day)
    }

    /// Complete the remaining bookings of the pending day, then look for the
    /// next one. A partial failure stops the chain and reports what failed.
    pub async fn finalize(
        &mut self,
        repository: &dyn BookingRepository,
        now: NaiveDateTime,
    ) -> AppResult<FinalizeOutcome> {
        let day = self.take_pending_day()?;
        self.state = WorkflowState::Finalizing(day.date);

        let report = match finalize_day(repository, &self.company_id, day.date).await {
            Ok(report) => report,
            Err(e) => {
                self.state = WorkflowState::AwaitingOperatorDecision(day);
                return Err(e);
            }
        };

        if !report.failed.is_empty() {
            tracing::warn!(
                company_id = %self.company_id,
                date = %day.date,
                failed = report.failed.len(),
                "Reconciliation stopped on partial failure"
            );
            self.state = WorkflowState::Idle;
            return Ok(FinalizeOutcome { report, next: None });
        }

        let next = self.scan(repository, now).await?;
        Ok(FinalizeOutcome { report, next })
    }

    /// Abandon the run without writing anything
    pub fn dismiss(&mut self) {
        self.state = WorkflowState::Idle;
    }
}

/// Reply to a reconciliation start
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconciliationStart {
    /// Present only when there is something to reconcile
    pub session_id: Option<Uuid>,
    pub prompt: Option<PendingDay>,
}

type Session = Arc<Mutex<ReconciliationWorkflow>>;

struct SessionEntry {
    company_id: String,
    workflow: Session,
    touched: NaiveDateTime,
}

/// Open sessions, at most one per company
#[derive(Default)]
struct Registry {
    sessions: HashMap<Uuid, SessionEntry>,
    by_company: HashMap<String, Uuid>,
}

impl Registry {
    fn open(&mut self, company_id: &str, now: NaiveDateTime) -> (Uuid, Session) {
        if let Some(&id) = self.by_company.get(company_id) {
            if let Some(entry) = self.sessions.get(&id) {
                return (id, entry.workflow.clone());
            }
        }

        let id = Uuid::new_v4();
        let workflow = Arc::new(Mutex::new(ReconciliationWorkflow::new(company_id)));
        self.sessions.insert(
            id,
            SessionEntry {
                company_id: company_id.to_string(),
                workflow: workflow.clone(),
                touched: now,
            },
        );
        self.by_company.insert(company_id.to_string(), id);
        (id, workflow)
    }

    fn remove(&mut self, session_id: Uuid) {
        if let Some(entry) = self.sessions.remove(&session_id) {
            if self.by_company.get(&entry.company_id) == Some(&session_id) {
                self.by_company.remove(&entry.company_id);
            }
        }
    }

    /// Drop sessions untouched for longer than `ttl`. A session busy with a
    /// request is kept.
    fn evict_stale(&mut self, now: NaiveDateTime, ttl: Duration) -> usize {
        let stale: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|(_, entry)| now - entry.touched > ttl && entry.workflow.try_lock().is_ok())
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.remove(*id);
        }
        stale.len()
    }
}

/// Interactive reconciliation sessions.
///
/// A company has at most one open session; starting again while it presents a
/// day is refused with `Busy` until the session is finalized, dismissed or
/// evicted for inactivity.
#[derive(Clone)]
pub struct ReconciliationService {
    repository: Repository,
    session_ttl: Duration,
    registry: Arc<RwLock<Registry>>,
}

impl ReconciliationService {
    pub fn new(repository: Repository, session_ttl: Duration) -> Self {
        Self {
            repository,
            session_ttl,
            registry: Arc::new(RwLock::new(Registry::default())),
        }
    }

    /// Scan a company's past dates and open a session on the first pending one
    pub async fn start(&self, company_id: &str, now: NaiveDateTime) -> AppResult<ReconciliationStart> {
        let (session_id, session) = {
            let mut registry = self.registry.write().await;
            let evicted = registry.evict_stale(now, self.session_ttl);
            if evicted > 0 {
                tracing::info!(evicted, "Evicted stale reconciliation sessions");
            }
            registry.open(company_id, now)
        };

        let mut workflow = session.try_lock().map_err(|_| Self::busy(session_id))?;
        let result = workflow.start(self.repository.as_ref(), now).await;

        // Nothing found, or the scan failed
        if *workflow.state() == WorkflowState::Idle {
            self.registry.write().await.remove(session_id);
        }

        let prompt = result?;
        let session_id = match &prompt {
            Some(day) => {
                tracing::info!(company_id, %session_id, date = %day.date, "Reconciliation session started");
                Some(session_id)
            }
            None => None,
        };
        Ok(ReconciliationStart { session_id, prompt })
    }

    async fn session(&self, session_id: Uuid, now: NaiveDateTime) -> AppResult<Session> {
        let mut registry = self.registry.write().await;
        let entry = registry
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        entry.touched = now;
        Ok(entry.workflow.clone())
    }

    fn not_found(session_id: Uuid) -> AppError {
        AppError::NotFound(format!("Reconciliation session {} not found", session_id))
    }

    fn busy(session_id: Uuid) -> AppError {
        AppError::Busy(format!(
            "Reconciliation session {} is handling another request",
            session_id
        ))
    }

    pub async fn mark_no_show(
        &self,
        session_id: Uuid,
        booking_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<PendingDay> {
        let session = self.session(session_id, now).await?;
        let mut workflow = session.try_lock().map_err(|_| Self::busy(session_id))?;
        workflow.mark_no_show(self.repository.as_ref(), booking_id).await
    }

    /// Finalize the session's pending day; the session closes once the chain ends
    pub async fn finalize(&self, session_id: Uuid, now: NaiveDateTime) -> AppResult<FinalizeOutcome> {
        let session = self.session(session_id, now).await?;
        let mut workflow = session.try_lock().map_err(|_| Self::busy(session_id))?;
        let outcome = workflow.finalize(self.repository.as_ref(), now).await;

        if *workflow.state() == WorkflowState::Idle {
            self.registry.write().await.remove(session_id);
            tracing::info!(company_id = workflow.company_id(), %session_id, "Reconciliation session closed");
        }
        outcome
    }

    pub async fn dismiss(&self, session_id: Uuid) -> AppResult<()> {
        let session = {
            let registry = self.registry.read().await;
            registry
                .sessions
                .get(&session_id)
                .map(|entry| entry.workflow.clone())
                .ok_or_else(|| Self::not_found(session_id))?
        };
        let mut workflow = session.try_lock().map_err(|_| Self::busy(session_id))?;
        workflow.dismiss();
        self.registry.write().await.remove(session_id);
        tracing::info!(company_id = workflow.company_id(), %session_id, "Reconciliation dismissed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            booking::fixtures::booking, DaySchedule, ProfessionalHours, TimeBlock, WorkingHours,
            Weekday,
        },
        repository::{MemoryRepository, MockBookingRepository},
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    // Thursday 2025-03-06, 10:00
    fn thursday_morning() -> NaiveDateTime {
        day(6).and_hms_opt(10, 0, 0).unwrap()
    }

    async fn setup() -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        let block = || DaySchedule::open(vec![TimeBlock::new("09:00", "12:00")]);
        let hours = WorkingHours::default()
            .with_day(Weekday::Monday, block())
            .with_day(Weekday::Tuesday, block())
            .with_day(Weekday::Wednesday, block())
            .with_day(Weekday::Thursday, block());
        repo.save_working_hours("acme", "pro-1", &hours).await.unwrap();
        repo
    }

    async fn add(repo: &MemoryRepository, date: NaiveDate, time: &str) -> Uuid {
        let b = booking(date, time);
        let id = b.id;
        repo.insert_booking(b).await;
        id
    }

    async fn status_of(repo: &MemoryRepository, id: Uuid) -> BookingStatus {
        repo.get_booking("acme", id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_presents_oldest_date_first_and_chains() {
        let repo = setup().await;
        let tuesday = add(&repo, day(4), "09:00").await;
        let monday = add(&repo, day(3), "10:00").await;
        // Today's booking is not stale
        let today = add(&repo, day(6), "09:00").await;

        let mut workflow = ReconciliationWorkflow::new("acme");
        let first = workflow.start(repo.as_ref(), thursday_morning()).await.unwrap().unwrap();
        assert_eq!(first.date, day(3));
        assert!(matches!(workflow.state(), WorkflowState::PresentingPendingDay(_)));

        let outcome = workflow.finalize(repo.as_ref(), thursday_morning()).await.unwrap();
        assert_eq!(outcome.report.completed, vec![monday]);
        assert_eq!(outcome.next.as_ref().map(|d| d.date), Some(day(4)));

        let outcome = workflow.finalize(repo.as_ref(), thursday_morning()).await.unwrap();
        assert_eq!(outcome.report.completed, vec![tuesday]);
        assert!(outcome.next.is_none());
        assert_eq!(*workflow.state(), WorkflowState::Idle);

        assert_eq!(status_of(&repo, monday).await, BookingStatus::Completed);
        assert_eq!(status_of(&repo, today).await, BookingStatus::Active);
    }

    #[tokio::test]
    async fn test_skips_date_without_schedule() {
        let repo = setup().await;
        // 2025-03-02 is a Sunday, nobody works
        let sunday = add(&repo, day(2), "10:00").await;
        add(&repo, day(5), "09:00").await;

        let pending = find_pending_day(repo.as_ref(), "acme", thursday_morning())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.date, day(5));

        let mut workflow = ReconciliationWorkflow::new("acme");
        workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        let outcome = workflow.finalize(repo.as_ref(), thursday_morning()).await.unwrap();
        assert!(outcome.next.is_none());
        assert_eq!(status_of(&repo, sunday).await, BookingStatus::Active);
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let repo = setup().await;
        let mut workflow = ReconciliationWorkflow::new("acme");
        let prompt = workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        assert!(prompt.is_none());
        assert_eq!(*workflow.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_no_show_is_kept_out_of_finalize() {
        let repo = setup().await;
        let absent = add(&repo, day(4), "09:00").await;
        let present = add(&repo, day(4), "10:00").await;

        let mut workflow = ReconciliationWorkflow::new("acme");
        workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        let remaining = workflow.mark_no_show(repo.as_ref(), absent).await.unwrap();
        assert_eq!(remaining.pending_bookings.len(), 1);
        assert!(matches!(workflow.state(), WorkflowState::AwaitingOperatorDecision(_)));

        let outcome = workflow.finalize(repo.as_ref(), thursday_morning()).await.unwrap();
        assert_eq!(outcome.report.completed, vec![present]);
        assert_eq!(status_of(&repo, absent).await, BookingStatus::NoShow);
    }

    #[tokio::test]
    async fn test_no_show_requires_pending_booking() {
        let repo = setup().await;
        add(&repo, day(4), "09:00").await;
        let other_day = add(&repo, day(5), "09:00").await;

        let mut workflow = ReconciliationWorkflow::new("acme");
        let result = workflow.mark_no_show(repo.as_ref(), other_day).await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));

        workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        let result = workflow.mark_no_show(repo.as_ref(), other_day).await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
        assert!(matches!(workflow.state(), WorkflowState::PresentingPendingDay(_)));
    }

    #[tokio::test]
    async fn test_second_start_is_refused_while_presenting() {
        let repo = setup().await;
        add(&repo, day(4), "09:00").await;

        let mut workflow = ReconciliationWorkflow::new("acme");
        workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        let result = workflow.start(repo.as_ref(), thursday_morning()).await;
        assert!(matches!(result, Err(AppError::Busy(_))));

        workflow.dismiss();
        assert!(workflow.start(repo.as_ref(), thursday_morning()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dismiss_persists_nothing() {
        let repo = setup().await;
        let id = add(&repo, day(4), "09:00").await;

        let mut workflow = ReconciliationWorkflow::new("acme");
        workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        workflow.dismiss();
        assert_eq!(*workflow.state(), WorkflowState::Idle);
        assert_eq!(status_of(&repo, id).await, BookingStatus::Active);

        let again = workflow.start(repo.as_ref(), thursday_morning()).await.unwrap();
        assert_eq!(again.map(|d| d.date), Some(day(4)));
    }

    #[tokio::test]
    async fn test_finalize_day_is_idempotent() {
        let repo = setup().await;
        let id = add(&repo, day(4), "09:00").await;
        let mut cancelled = booking(day(4), "11:00");
        cancelled.status = BookingStatus::CancelledByManager;
        let cancelled_id = cancelled.id;
        repo.insert_booking(cancelled).await;

        let first = finalize_day(repo.as_ref(), "acme", day(4)).await.unwrap();
        assert_eq!(first.completed, vec![id]);

        let second = finalize_day(repo.as_ref(), "acme", day(4)).await.unwrap();
        assert!(second.completed.is_empty());
        assert!(second.failed.is_empty());
        assert_eq!(status_of(&repo, id).await, BookingStatus::Completed);
        assert_eq!(status_of(&repo, cancelled_id).await, BookingStatus::CancelledByManager);
    }

    #[tokio::test]
    async fn test_finalize_reports_partial_failure() {
        let ok = booking(day(4), "09:00");
        let broken = booking(day(4), "10:00");
        let (ok_id, broken_id) = (ok.id, broken.id);

        let mut mock = MockBookingRepository::new();
        mock.expect_list_bookings()
            .returning(move |_, _| Ok(vec![ok.clone(), broken.clone()]));
        mock.expect_update_booking_status()
            .times(2)
            .returning(move |_, id, _| {
                if id == broken_id {
                    Err(AppError::StoreUnavailable("connection reset".to_string()))
                } else {
                    Ok(())
                }
            });

        let report = finalize_day(&mock, "acme", day(4)).await.unwrap();
        assert_eq!(report.completed, vec![ok_id]);
        assert_eq!(report.failed, vec![broken_id]);
    }

    #[tokio::test]
    async fn test_service_sessions() {
        let repo = setup().await;
        add(&repo, day(3), "09:00").await;
        add(&repo, day(4), "09:00").await;
        let service = ReconciliationService::new(repo.clone(), Duration::minutes(30));

        let started = service.start("acme", thursday_morning()).await.unwrap();
        let session_id = started.session_id.unwrap();
        assert_eq!(started.prompt.map(|d| d.date), Some(day(3)));

        // A request arriving while the session is held is turned away
        let session = service.session(session_id, thursday_morning()).await.unwrap();
        let guard = session.lock().await;
        let result = service.finalize(session_id, thursday_morning()).await;
        assert!(matches!(result, Err(AppError::Busy(_))));
        drop(guard);

        let outcome = service.finalize(session_id, thursday_morning()).await.unwrap();
        assert_eq!(outcome.next.map(|d| d.date), Some(day(4)));
        let outcome = service.finalize(session_id, thursday_morning()).await.unwrap();
        assert!(outcome.next.is_none());

        // Chain done, session closed
        let result = service.dismiss(session_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let started = service.start("acme", thursday_morning()).await.unwrap();
        assert!(started.session_id.is_none());
        assert!(started.prompt.is_none());
    }

    /// A store where completing one of the two Tuesday bookings always fails.
    /// It keeps no state, so both bookings keep reading back as active.
    fn flaky_store() -> (MockBookingRepository, Uuid, Uuid) {
        let ok = booking(day(4), "09:00");
        let broken = booking(day(4), "10:00");
        let (ok_id, broken_id) = (ok.id, broken.id);

        let mut mock = MockBookingRepository::new();
        mock.expect_list_bookings()
            .returning(move |_, _| Ok(vec![ok.clone(), broken.clone()]));
        mock.expect_list_working_hours().returning(|_| {
            Ok(vec![ProfessionalHours {
                professional_id: "pro-1".to_string(),
                hours: WorkingHours::default().with_day(
                    Weekday::Tuesday,
                    DaySchedule::open(vec![TimeBlock::new("09:00", "12:00")]),
                ),
            }])
        });
        mock.expect_update_booking_status()
            .returning(move |_, id, _| {
                if id == broken_id {
                    Err(AppError::StoreUnavailable("connection reset".to_string()))
                } else {
                    Ok(())
                }
            });
        (mock, ok_id, broken_id)
    }

    #[tokio::test]
    async fn test_partial_failure_stops_chain_and_date_resurfaces() {
        let (mock, ok_id, broken_id) = flaky_store();

        let mut workflow = ReconciliationWorkflow::new("acme");
        let first = workflow.start(&mock, thursday_morning()).await.unwrap();
        assert_eq!(first.map(|d| d.date), Some(day(4)));

        let outcome = workflow.finalize(&mock, thursday_morning()).await.unwrap();
        assert_eq!(outcome.report.completed, vec![ok_id]);
        assert_eq!(outcome.report.failed, vec![broken_id]);
        assert!(outcome.next.is_none());
        assert_eq!(*workflow.state(), WorkflowState::Idle);

        let again = find_pending_day(&mock, "acme", thursday_morning()).await.unwrap();
        assert_eq!(again.map(|d| d.date), Some(day(4)));
    }

    #[tokio::test]
    async fn test_service_closes_session_on_partial_failure() {
        let (mock, _, broken_id) = flaky_store();
        let service = ReconciliationService::new(Arc::new(mock), Duration::minutes(30));

        let started = service.start("acme", thursday_morning()).await.unwrap();
        let session_id = started.session_id.unwrap();

        let outcome = service.finalize(session_id, thursday_morning()).await.unwrap();
        assert_eq!(outcome.report.failed, vec![broken_id]);
        assert!(outcome.next.is_none());

        let result = service.finalize(session_id, thursday_morning()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(service.registry.read().await.sessions.is_empty());

        let restarted = service.start("acme", thursday_morning()).await.unwrap();
        assert_eq!(restarted.prompt.map(|d| d.date), Some(day(4)));
    }

    #[tokio::test]
    async fn test_one_session_per_company() {
        let repo = setup().await;
        add(&repo, day(4), "09:00").await;
        let service = ReconciliationService::new(repo.clone(), Duration::minutes(30));

        let first = service.start("acme", thursday_morning()).await.unwrap();
        let session_id = first.session_id.unwrap();

        let second = service.start("acme", thursday_morning()).await;
        assert!(matches!(second, Err(AppError::Busy(_))));
        assert_eq!(service.registry.read().await.sessions.len(), 1);

        // Other tenants are unaffected
        let other = service.start("globex", thursday_morning()).await.unwrap();
        assert!(other.session_id.is_none());
        assert_eq!(service.registry.read().await.sessions.len(), 1);

        service.dismiss(session_id).await.unwrap();
        let again = service.start("acme", thursday_morning()).await.unwrap();
        assert!(again.session_id.is_some());
        assert_ne!(again.session_id, Some(session_id));
    }

    #[tokio::test]
    async fn test_stale_session_is_evicted() {
        let repo = setup().await;
        add(&repo, day(4), "09:00").await;
        let service = ReconciliationService::new(repo.clone(), Duration::minutes(30));

        let abandoned = service
            .start("acme", thursday_morning())
            .await
            .unwrap()
            .session_id
            .unwrap();

        let later = thursday_morning() + Duration::minutes(31);
        let restarted = service.start("acme", later).await.unwrap();
        let session_id = restarted.session_id.unwrap();
        assert_ne!(session_id, abandoned);
        assert_eq!(service.registry.read().await.sessions.len(), 1);

        let result = service.finalize(abandoned, later).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let repo = setup().await;
        let absent = add(&repo, day(4), "09:00").await;
        add(&repo, day(4), "10:00").await;
        let service = ReconciliationService::new(repo.clone(), Duration::minutes(30));

        let session_id = service
            .start("acme", thursday_morning())
            .await
            .unwrap()
            .session_id
            .unwrap();
        service
            .mark_no_show(session_id, absent, thursday_morning() + Duration::minutes(20))
            .await
            .unwrap();

        let result = service
            .start("acme", thursday_morning() + Duration::minutes(40))
            .await;
        assert!(matches!(result, Err(AppError::Busy(_))));
        assert!(service
            .finalize(session_id, thursday_morning() + Duration::minutes(45))
            .await
            .is_ok());
    }
}
