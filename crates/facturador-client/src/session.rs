//! # Invoice Session
//!
//! Shared handle on the comprobante being edited, plus its submission.
//!
//! ## Thread Safety
//! The engine is wrapped in a `Mutex` because UI commands may run
//! concurrently and only one of them may change the draft at a time. The
//! lock is never held across an `.await`.
//!
//! While a submission is in flight the draft is frozen: every edit fails
//! with `SubmissionInProgress`, so the draft cleared on success is exactly
//! the one the backend accepted.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          submit()                                       │
//! │                                                                         │
//! │  submitting? ──yes──► SubmissionInProgress                              │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  lock ► assemble() ──rejected──► Draft(reason), draft kept              │
//! │       │ payload + idempotency key                                       │
//! │       ▼                                                                 │
//! │  gateway.submit ──transient──► backoff, same key, retry                 │
//! │       │            ──permanent/exhausted──► error, draft kept           │
//! │       ▼ ok                                                              │
//! │  lock ► reset(today) ──► new empty draft, new key                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use chrono::NaiveDate;
use facturador_core::{
    Client, CoreError, DetraccionForm, InvoiceEngine, LineItemPatch, Money, Product,
    ReceiptView, Recomputation, RegimeSignal, RetencionForm,
};
use tracing::{debug, error, info, warn};

use crate::api::{ClientDirectory, InvoiceGateway, SubmissionReceipt};
use crate::catalogs::Catalogs;
use crate::config::{AppConfig, BackendSettings};
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry schedule for transient submission failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &BackendSettings) -> Self {
        RetryPolicy {
            max_retries: settings.max_retries,
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ClientResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::SubmissionInProgress)?;
        Ok(SubmitGuard(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Session
// =============================================================================

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub receipt: SubmissionReceipt,
    /// The submitted draft, ready for printing.
    pub printed: ReceiptView,
    /// State of the fresh draft that replaced it.
    pub next: Recomputation,
}

/// Source of the issue date for drafts started after a submission.
pub type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct InvoiceSession {
    engine: Mutex<InvoiceEngine>,
    gateway: Arc<dyn InvoiceGateway>,
    retry: RetryPolicy,
    submitting: AtomicBool,
    today: DateSource,
}

impl InvoiceSession {
    pub fn new(config: &AppConfig, gateway: Arc<dyn InvoiceGateway>, issue_date: NaiveDate) -> Self {
        let engine = InvoiceEngine::new(config.tax.clone(), config.company.profile(), issue_date);
        InvoiceSession {
            engine: Mutex::new(engine),
            gateway,
            retry: RetryPolicy::from_settings(&config.backend),
            submitting: AtomicBool::new(false),
            today: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replaces the local-clock date used when a fresh draft is started.
    pub fn with_date_source(mut self, today: DateSource) -> Self {
        self.today = today;
        self
    }

    fn lock(&self) -> MutexGuard<'_, InvoiceEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the engine for an edit, refusing while a submission is in flight.
    ///
    /// The flag is read under the lock: `submit` raises it before taking the
    /// lock, so an edit either lands before the payload is assembled or is
    /// refused.
    fn edit(&self) -> ClientResult<MutexGuard<'_, InvoiceEngine>> {
        let engine = self.lock();
        if self.is_submitting() {
            debug!("Edit refused, submission in flight");
            return Err(ClientError::SubmissionInProgress);
        }
        Ok(engine)
    }

    /// Executes a read-only function on the engine.
    pub fn with_engine<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&InvoiceEngine) -> R,
    {
        f(&self.lock())
    }

    /// Executes a mutating function on the engine.
    ///
    /// Fails with `SubmissionInProgress` while a submission is in flight.
    pub fn with_engine_mut<F, R>(&self, f: F) -> ClientResult<R>
    where
        F: FnOnce(&mut InvoiceEngine) -> R,
    {
        let mut engine = self.edit()?;
        Ok(f(&mut engine))
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn add_product(&self, product: &Product) -> ClientResult<Recomputation> {
        let result = self.edit()?.add_product(product);
        if let Err(CoreError::InsufficientStock {
            description,
            available,
            ..
        }) = &result
        {
            warn!(product_id = product.id, %description, available, "Insufficient stock");
        }
        let recomputation = result?;
        debug!(product_id = product.id, "Product added");
        Ok(logged(recomputation))
    }

    pub fn update_item(&self, index: usize, patch: LineItemPatch) -> ClientResult<Recomputation> {
        let recomputation = self.edit()?.update_item(index, patch)?;
        debug!(index, "Line updated");
        Ok(logged(recomputation))
    }

    pub fn remove_item(&self, line_id: &str) -> ClientResult<Recomputation> {
        let recomputation = self.edit()?.remove_item(line_id)?;
        debug!(line_id, "Line removed");
        Ok(logged(recomputation))
    }

    pub fn set_global_discount(&self, discount: Money) -> ClientResult<Recomputation> {
        let recomputation = self.edit()?.set_global_discount(discount)?;
        debug!(%discount, "Global discount set");
        Ok(logged(recomputation))
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Selects an operation type from the loaded catalog, or clears it.
    pub fn set_operation_type(
        &self,
        catalogs: &Catalogs,
        id: Option<i64>,
    ) -> ClientResult<Recomputation> {
        let operation = id.map(|id| catalogs.operation_type(id).cloned()).transpose()?;
        debug!(code = operation.as_ref().map(|op| op.codigo.as_str()), "Operation type set");
        Ok(logged(self.edit()?.set_operation_type(operation)))
    }

    /// Looks a client up by DNI/RUC and selects it when found.
    pub async fn select_client_by_document(
        &self,
        directory: &dyn ClientDirectory,
        document: &str,
    ) -> ClientResult<Option<Client>> {
        let client = directory.lookup_by_document(document).await?;
        match &client {
            Some(found) => {
                debug!(document = %found.document_number, "Client selected");
                self.edit()?.set_client(Some(found.clone()));
            }
            None => debug!(document, "No client for document"),
        }
        Ok(client)
    }

    // =========================================================================
    // Regime
    // =========================================================================

    pub fn select_tipo_detraccion(&self, catalogs: &Catalogs, id: i64) -> ClientResult<Recomputation> {
        let tipo = catalogs.tipo_detraccion(id)?;
        let recomputation = self.edit()?.select_tipo_detraccion(tipo)?;
        debug!(codigo = %tipo.codigo, percent = %tipo.porcentaje, "Detracción type selected");
        Ok(logged(recomputation))
    }

    /// Saves the detracción dialog.
    ///
    /// The percentage always comes from the catalog entry of the chosen type.
    pub fn save_detraccion(
        &self,
        catalogs: &Catalogs,
        mut form: DetraccionForm,
    ) -> ClientResult<Recomputation> {
        if let Some(id) = form.tipo_detraccion_id {
            form.percent = catalogs.tipo_detraccion(id)?.porcentaje;
        }
        if let Some(id) = form.medio_pago_detraccion_id {
            catalogs.medio_pago(id)?;
        }
        let recomputation = self.edit()?.save_detraccion(form)?;
        info!("Detracción configured");
        Ok(logged(recomputation))
    }

    pub fn save_retencion(&self, form: RetencionForm) -> ClientResult<Recomputation> {
        let recomputation = self.edit()?.save_retencion(form)?;
        info!("Retención configured");
        Ok(logged(recomputation))
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validates, submits and, on success, starts a fresh draft.
    ///
    /// Every attempt for the same draft carries the same idempotency key.
    /// On failure the draft is left exactly as it was. The fresh draft is
    /// dated by the session's date source.
    pub async fn submit(&self) -> ClientResult<SubmissionOutcome> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;

        let (payload, key, printed) = {
            let engine = self.lock();
            let payload = engine.assemble().map_err(|reason| {
                debug!(code = reason.code(), %reason, "Draft rejected");
                reason
            })?;
            (payload, engine.idempotency_key(), engine.receipt())
        };

        info!(%key, document_type = ?payload.document_type, total = %payload.total, "Submitting comprobante");

        let mut backoff = self.retry.backoff();
        let mut attempt = 0u32;
        let receipt = loop {
            match self.gateway.submit(&payload, key).await {
                Ok(receipt) => break receipt,
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let Some(delay) = backoff.next_backoff() else {
                        error!(%key, error = %e, "Backoff exhausted");
                        return Err(e);
                    };
                    warn!(%key, attempt, ?delay, error = %e, "Submission failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(%key, attempts = attempt + 1, error = %e, "Submission failed");
                    return Err(e);
                }
            }
        };

        info!(%key, number = %receipt.number(), "Comprobante accepted");

        let today = (self.today)();
        let next = self.lock().reset(today);

        Ok(SubmissionOutcome {
            receipt,
            printed,
            next,
        })
    }
}

/// Logs regime transitions and passes the recomputation through.
fn logged(recomputation: Recomputation) -> Recomputation {
    for signal in &recomputation.signals {
        match signal {
            RegimeSignal::PromptDetraccion => info!("Operation subject to detracción, configure it"),
            RegimeSignal::DetraccionCleared => warn!("Detracción cleared"),
            RegimeSignal::RetencionProposed => {
                info!(total = %recomputation.totals.adjusted_total.round2(), "Retención proposed")
            }
            RegimeSignal::RetencionCleared => warn!("Retención cleared"),
        }
    }
    recomputation
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use facturador_core::{
        DocumentKind, DraftRejection, MedioPagoDetraccion, OperationType, RegimeStatus,
        SubmissionPayload, TaxRegime, TipoDetraccion,
    };
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use tokio::sync::Notify;
    use uuid::Uuid;

    // =========================================================================
    // Fakes
    // =========================================================================

    #[derive(Default)]
    struct ScriptedGateway {
        responses: Mutex<VecDeque<ClientResult<SubmissionReceipt>>>,
        keys: Mutex<Vec<Uuid>>,
    }

    impl ScriptedGateway {
        fn with(responses: Vec<ClientResult<SubmissionReceipt>>) -> Arc<Self> {
            Arc::new(ScriptedGateway {
                responses: Mutex::new(responses.into()),
                keys: Mutex::default(),
            })
        }

        fn keys(&self) -> Vec<Uuid> {
            self.keys.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InvoiceGateway for ScriptedGateway {
        async fn submit(
            &self,
            _payload: &SubmissionPayload,
            idempotency_key: Uuid,
        ) -> ClientResult<SubmissionReceipt> {
            self.keys.lock().unwrap().push(idempotency_key);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(accepted(1)))
        }
    }

    struct BlockingGateway {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl InvoiceGateway for BlockingGateway {
        async fn submit(
            &self,
            _payload: &SubmissionPayload,
            _idempotency_key: Uuid,
        ) -> ClientResult<SubmissionReceipt> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(accepted(7))
        }
    }

    struct OneClientDirectory;

    #[async_trait]
    impl ClientDirectory for OneClientDirectory {
        async fn search_clients(&self, _query: &str) -> ClientResult<Vec<Client>> {
            Ok(Vec::new())
        }

        async fn find_by_document(
            &self,
            kind: DocumentKind,
            number: &str,
        ) -> ClientResult<Option<Client>> {
            Ok((kind == DocumentKind::Ruc && number == "20123456789").then(|| Client {
                name: "Constructora Andina SAC".to_string(),
                document_number: number.to_string(),
                ..Default::default()
            }))
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn accepted(correlativo: u64) -> SubmissionReceipt {
        SubmissionReceipt {
            serie: "B001".to_string(),
            correlativo,
            issue_date: None,
            sunat_status: None,
            pdf_url: None,
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Status {
            status: 503,
            body: "maintenance".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn product(units: i64, stock: i64) -> Product {
        Product {
            id: 10,
            description: "Cemento Sol 42.5kg".to_string(),
            unit_price: Money::from_units(units),
            stock,
            unit: Some("NIU".to_string()),
            category: None,
        }
    }

    fn session_with(gateway: Arc<dyn InvoiceGateway>, max_retries: u32) -> InvoiceSession {
        let mut config = AppConfig::default();
        config.backend.max_retries = max_retries;
        config.backend.initial_backoff_ms = 100;
        config.backend.max_backoff_secs = 1;
        InvoiceSession::new(&config, gateway, today())
    }

    fn ready_to_submit(session: &InvoiceSession) {
        session.add_product(&product(50, 10)).unwrap();
        session
            .with_engine_mut(|engine| {
                engine.set_client(Some(Client {
                    name: "Juan Pérez".to_string(),
                    document_number: "87654321".to_string(),
                    ..Default::default()
                }))
            })
            .unwrap();
    }

    fn catalogs() -> Catalogs {
        Catalogs {
            operation_types: vec![OperationType {
                id: 2,
                codigo: "0112".to_string(),
                descripcion: "Venta sujeta a detracción".to_string(),
                allows_global_discount: false,
            }],
            tipos_detraccion: vec![TipoDetraccion {
                id: 37,
                codigo: "037".to_string(),
                descripcion: "Demás servicios gravados con el IGV".to_string(),
                porcentaje: dec!(12),
            }],
            medios_pago: vec![MedioPagoDetraccion {
                id: 1,
                codigo: "001".to_string(),
                descripcion: "Depósito en cuenta".to_string(),
            }],
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    #[tokio::test]
    async fn test_successful_submission_resets_draft() {
        let gateway = ScriptedGateway::with(vec![Ok(accepted(42))]);
        let session = session_with(gateway.clone(), 3);
        ready_to_submit(&session);
        let key = session.with_engine(|e| e.idempotency_key());

        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome.receipt.number(), "B001-00000042");
        assert_eq!(outcome.printed.totals.adjusted_total, Money::from_units(50));
        assert_eq!(outcome.next.totals.adjusted_total, Money::zero());
        assert_eq!(gateway.keys(), vec![key]);
        session.with_engine(|e| {
            assert!(e.draft().cart.is_empty());
            assert_ne!(e.idempotency_key(), key);
        });
        assert!(!session.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_with_same_key() {
        let gateway = ScriptedGateway::with(vec![
            Err(unavailable()),
            Err(ClientError::Http("connection reset".into())),
            Ok(accepted(3)),
        ]);
        let session = session_with(gateway.clone(), 3);
        ready_to_submit(&session);
        let key = session.with_engine(|e| e.idempotency_key());

        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome.receipt.correlativo, 3);
        assert_eq!(gateway.keys(), vec![key, key, key]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_keep_draft() {
        let gateway = ScriptedGateway::with(vec![
            Err(unavailable()),
            Err(unavailable()),
            Err(unavailable()),
        ]);
        let session = session_with(gateway.clone(), 2);
        ready_to_submit(&session);
        let key = session.with_engine(|e| e.idempotency_key());

        let err = session.submit().await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(gateway.keys().len(), 3);
        session.with_engine(|e| {
            assert_eq!(e.draft().cart.item_count(), 1);
            assert_eq!(e.idempotency_key(), key);
        });
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let gateway = ScriptedGateway::with(vec![Err(ClientError::Rejected(
            "Serie no autorizada".into(),
        ))]);
        let session = session_with(gateway.clone(), 3);
        ready_to_submit(&session);

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(_)));
        assert_eq!(gateway.keys().len(), 1);
        session.with_engine(|e| assert!(!e.draft().cart.is_empty()));
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_backend() {
        let gateway = ScriptedGateway::with(Vec::new());
        let session = session_with(gateway.clone(), 3);

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, ClientError::Draft(DraftRejection::MissingClient)));
        assert!(gateway.keys().is_empty());
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_fails_fast() {
        let gateway = Arc::new(BlockingGateway {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let session = session_with(gateway.clone(), 0);
        ready_to_submit(&session);

        let (first, second) = tokio::join!(session.submit(), async {
            gateway.entered.notified().await;
            assert!(session.is_submitting());
            let second = session.submit().await;
            gateway.release.notify_one();
            second
        });

        assert!(matches!(second, Err(ClientError::SubmissionInProgress)));
        assert_eq!(first.unwrap().receipt.correlativo, 7);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_edits_refused_while_in_flight() {
        let gateway = Arc::new(BlockingGateway {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let session = session_with(gateway.clone(), 0);
        ready_to_submit(&session);
        let other = Product {
            id: 11,
            ..product(20, 10)
        };

        let (first, (added, discounted, mutated)) = tokio::join!(session.submit(), async {
            gateway.entered.notified().await;
            let added = session.add_product(&other);
            let discounted = session.set_global_discount(Money::from_units(5));
            let mutated = session.with_engine_mut(|e| e.set_observations("Entregar por la tarde"));
            gateway.release.notify_one();
            (added, discounted, mutated)
        });

        assert!(matches!(added, Err(ClientError::SubmissionInProgress)));
        assert!(matches!(discounted, Err(ClientError::SubmissionInProgress)));
        assert!(matches!(mutated, Err(ClientError::SubmissionInProgress)));
        let outcome = first.unwrap();
        assert_eq!(outcome.printed.items.len(), 1);
        session.with_engine(|e| assert!(e.draft().cart.is_empty()));

        session.add_product(&other).unwrap();
        session.with_engine(|e| assert_eq!(e.draft().cart.item_count(), 1));
    }

    #[tokio::test]
    async fn test_fresh_draft_uses_date_source() {
        let next_day = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let session = session_with(ScriptedGateway::with(Vec::new()), 0)
            .with_date_source(Arc::new(move || next_day));
        ready_to_submit(&session);
        session.with_engine(|e| assert_eq!(e.draft().issue_date, today()));

        session.submit().await.unwrap();

        session.with_engine(|e| assert_eq!(e.draft().issue_date, next_day));
    }

    // =========================================================================
    // Editing
    // =========================================================================

    #[test]
    fn test_insufficient_stock_surfaces_core_error() {
        let session = session_with(ScriptedGateway::with(Vec::new()), 0);
        session.add_product(&product(10, 1)).unwrap();

        let err = session.add_product(&product(10, 1)).unwrap_err();

        assert!(matches!(
            err,
            ClientError::Core(CoreError::InsufficientStock { available: 1, .. })
        ));
        session.with_engine(|e| assert_eq!(e.draft().cart.items()[0].quantity, dec!(1)));
    }

    #[test]
    fn test_line_edits_recompute_totals() {
        let session = session_with(ScriptedGateway::with(Vec::new()), 0);
        session.add_product(&product(100, 10)).unwrap();

        let r = session
            .update_item(
                0,
                LineItemPatch {
                    quantity: Some(dec!(3)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(r.totals.adjusted_total, Money::from_units(300));

        let r = session.set_global_discount(Money::from_units(50)).unwrap();
        assert_eq!(r.totals.adjusted_total, Money::from_units(250));

        let line_id = session.with_engine(|e| e.draft().cart.items()[0].line_id.clone());
        let r = session.remove_item(&line_id).unwrap();
        assert_eq!(r.totals.adjusted_total, Money::zero());
    }

    #[test]
    fn test_detraccion_flow_through_catalogs() {
        let session = session_with(ScriptedGateway::with(Vec::new()), 0);
        let catalogs = catalogs();
        session.add_product(&product(800, 5)).unwrap();

        let recomputation = session.set_operation_type(&catalogs, Some(2)).unwrap();
        assert!(recomputation.signals.contains(&RegimeSignal::PromptDetraccion));

        session.select_tipo_detraccion(&catalogs, 37).unwrap();
        let mut form = session.with_engine(|e| e.detraccion_form()).unwrap();
        assert_eq!(form.percent, dec!(12));
        form.medio_pago_detraccion_id = Some(1);
        form.cuenta_banco_nacion = "00-123-456789".to_string();

        session.save_detraccion(&catalogs, form).unwrap();

        session.with_engine(|e| match &e.draft().regime {
            TaxRegime::Detraccion { config, status } => {
                assert_eq!(*status, RegimeStatus::Configured);
                assert_eq!(config.amount, Money::from_units(96));
            }
            other => panic!("unexpected regime {other:?}"),
        });
    }

    #[test]
    fn test_unknown_catalog_entries_are_rejected() {
        let session = session_with(ScriptedGateway::with(Vec::new()), 0);
        let catalogs = catalogs();
        session.add_product(&product(800, 5)).unwrap();
        session.set_operation_type(&catalogs, Some(2)).unwrap();

        assert!(matches!(
            session.set_operation_type(&catalogs, Some(99)),
            Err(ClientError::NotFound { .. })
        ));

        let form = DetraccionForm {
            tipo_detraccion_id: Some(37),
            medio_pago_detraccion_id: Some(9),
            cuenta_banco_nacion: "00-123-456789".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            session.save_detraccion(&catalogs, form),
            Err(ClientError::NotFound { .. })
        ));
        session.with_engine(|e| assert_eq!(e.draft().regime.status(), Some(RegimeStatus::Pending)));
    }

    #[tokio::test]
    async fn test_select_client_by_document() {
        let session = session_with(ScriptedGateway::with(Vec::new()), 0);

        let found = session
            .select_client_by_document(&OneClientDirectory, "20123456789")
            .await
            .unwrap();
        assert!(found.is_some());
        session.with_engine(|e| {
            assert_eq!(
                e.draft().client.as_ref().map(|c| c.name.as_str()),
                Some("Constructora Andina SAC")
            )
        });

        let missing = session
            .select_client_by_document(&OneClientDirectory, "87654321")
            .await
            .unwrap();
        assert!(missing.is_none());

        let err = session
            .select_client_by_document(&OneClientDirectory, "123")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidDocument(_)));
    }
}
