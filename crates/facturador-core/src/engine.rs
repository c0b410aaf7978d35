//! # Invoice Engine
//!
//! Owns one draft and keeps its totals and regime consistent.
//!
//! ## Recomputation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  any mutation ──► draft changed ──► recompute()                         │
//! │                                        │                                │
//! │                                        ├─► compute_invoice_totals()     │
//! │                                        │        │ adjusted_total        │
//! │                                        │        ▼                       │
//! │                                        └─► resolve_regime(previous,     │
//! │                                               op code, adjusted)        │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                  Recomputation { totals, signals }      │
//! │                                                                         │
//! │  One pass per mutation: the regime never sees half-updated totals, and  │
//! │  "operation changed" vs "total changed" cannot race each other.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failed operations return their error and leave the draft untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::cart::{LineDetails, LineItemPatch};
use crate::draft::InvoiceDraft;
use crate::error::{CoreResult, DraftRejection, RegimeError, RegimeResult, ValidationError};
use crate::money::Money;
use crate::receipt::ReceiptView;
use crate::regime::{
    self, split_installments, DetraccionForm, RegimeSignal, RetencionForm, TaxRegime,
};
use crate::settings::TaxSettings;
use crate::submission::{self, SubmissionPayload};
use crate::totals::InvoiceTotals;
use crate::types::{
    Client, CompanyProfile, Currency, DocumentReference, DocumentType, Installment,
    OperationType, PaymentMethod, Product, TipoDetraccion,
};
use crate::validation::{validate_global_discount, ValidationResult};

/// Result of one recomputation pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recomputation {
    pub totals: InvoiceTotals,
    /// Regime transitions the UI should react to.
    pub signals: Vec<RegimeSignal>,
}

/// Explicit state container for one invoice being edited.
#[derive(Debug, Clone)]
pub struct InvoiceEngine {
    settings: TaxSettings,
    company: CompanyProfile,
    draft: InvoiceDraft,
    last: Recomputation,
}

impl InvoiceEngine {
    /// Creates an engine with an empty draft dated `issue_date`.
    pub fn new(settings: TaxSettings, company: CompanyProfile, issue_date: NaiveDate) -> Self {
        let draft = InvoiceDraft::new(settings.igv_rate, issue_date);
        let mut engine = InvoiceEngine {
            settings,
            company,
            draft,
            last: Recomputation::default(),
        };
        engine.recompute();
        engine
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn settings(&self) -> &TaxSettings {
        &self.settings
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    /// Totals from the last recomputation (unrounded).
    pub fn totals(&self) -> InvoiceTotals {
        self.last.totals
    }

    /// Signals from the last recomputation.
    pub fn signals(&self) -> &[RegimeSignal] {
        &self.last.signals
    }

    pub fn idempotency_key(&self) -> Uuid {
        self.draft.idempotency_key
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn add_product(&mut self, product: &Product) -> CoreResult<Recomputation> {
        self.draft.cart.add_product(product)?;
        Ok(self.recompute())
    }

    pub fn add_free_text(
        &mut self,
        description: &str,
        unit_price: Money,
        quantity: Decimal,
    ) -> CoreResult<Recomputation> {
        self.draft
            .cart
            .add_free_text(description, unit_price, quantity)?;
        Ok(self.recompute())
    }

    pub fn update_item(&mut self, index: usize, patch: LineItemPatch) -> CoreResult<Recomputation> {
        self.draft.cart.update_item(index, patch)?;
        Ok(self.recompute())
    }

    pub fn decrement(&mut self, index: usize) -> CoreResult<Recomputation> {
        self.draft.cart.decrement(index)?;
        Ok(self.recompute())
    }

    pub fn remove_item(&mut self, line_id: &str) -> CoreResult<Recomputation> {
        self.draft.cart.remove_item(line_id)?;
        Ok(self.recompute())
    }

    pub fn edit_line_details(
        &mut self,
        index: usize,
        details: LineDetails,
    ) -> CoreResult<Recomputation> {
        self.draft.cart.edit_line_details(index, details)?;
        Ok(self.recompute())
    }

    pub fn set_global_discount(&mut self, discount: Money) -> CoreResult<Recomputation> {
        validate_global_discount(discount)?;
        self.draft.global_discount = discount;
        Ok(self.recompute())
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Changes the operation type; may open or clear a regime.
    pub fn set_operation_type(&mut self, operation: Option<OperationType>) -> Recomputation {
        self.draft.operation_type = operation;
        self.recompute()
    }

    pub fn set_client(&mut self, client: Option<Client>) {
        self.draft.client = client;
    }

    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.draft.document_type = document_type;
    }

    pub fn set_reference(&mut self, reference: Option<DocumentReference>) {
        self.draft.reference = reference;
    }

    /// Sets the NP/OT advance payment. Negative amounts are rejected.
    pub fn set_advance(&mut self, advance: Option<Money>) -> ValidationResult<()> {
        if advance.is_some_and(|a| a.is_negative()) {
            return Err(ValidationError::MustNotBeNegative {
                field: "advance".to_string(),
            });
        }
        self.draft.advance = advance;
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.draft.payment_method = method;
    }

    pub fn set_observations(&mut self, observations: &str) {
        self.draft.observations = observations.to_string();
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.draft.currency = currency;
    }

    /// Replaces the company profile (e.g. after a configuration reload).
    pub fn set_company(&mut self, company: CompanyProfile) -> Recomputation {
        self.company = company;
        self.recompute()
    }

    // =========================================================================
    // Regime
    // =========================================================================

    /// Copies the catalog percentage of `tipo` into the detracción.
    pub fn select_tipo_detraccion(&mut self, tipo: &TipoDetraccion) -> RegimeResult<Recomputation> {
        let adjusted = self.last.totals.adjusted_total;
        match &mut self.draft.regime {
            TaxRegime::Detraccion { config, .. } => config.apply_tipo(tipo, adjusted),
            _ => {
                return Err(RegimeError::NotDetraccionOperation {
                    code: self.settings.detraccion_operation_code.clone(),
                })
            }
        }
        Ok(self.recompute())
    }

    /// Prefilled detracción dialog, if the draft is under detracción.
    pub fn detraccion_form(&self) -> Option<DetraccionForm> {
        match &self.draft.regime {
            TaxRegime::Detraccion { config, .. } => Some(DetraccionForm::from(config)),
            _ => None,
        }
    }

    pub fn save_detraccion(&mut self, form: DetraccionForm) -> RegimeResult<Recomputation> {
        self.draft.regime = regime::save_detraccion(
            form,
            self.last.totals.adjusted_total,
            self.draft.operation_code(),
            &self.settings,
        )?;
        Ok(self.recompute())
    }

    pub fn save_retencion(&mut self, form: RetencionForm) -> RegimeResult<Recomputation> {
        self.draft.regime = regime::save_retencion(
            form,
            self.last.totals.adjusted_total,
            self.draft.operation_code(),
            &self.settings,
        )?;
        Ok(self.recompute())
    }

    /// Proposes an even credit schedule for `adjusted − regime amount`.
    pub fn propose_installments(
        &self,
        count: usize,
        first_due: NaiveDate,
    ) -> RegimeResult<Vec<Installment>> {
        let payable = self.last.totals.adjusted_total.round2() - self.draft.regime.amount();
        split_installments(payable, count, first_due)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    pub fn validate(&self) -> Result<(), DraftRejection> {
        submission::validate(&self.draft, &self.last.totals, &self.settings)
    }

    pub fn assemble(&self) -> Result<SubmissionPayload, DraftRejection> {
        submission::assemble(&self.draft, &self.last.totals, &self.settings)
    }

    pub fn receipt(&self) -> ReceiptView {
        ReceiptView::build(&self.draft, &self.last.totals, &self.company)
    }

    /// Discards the draft after a confirmed submission.
    ///
    /// The new draft gets a fresh idempotency key.
    pub fn reset(&mut self, issue_date: NaiveDate) -> Recomputation {
        self.draft = InvoiceDraft::new(self.settings.igv_rate, issue_date);
        self.recompute()
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    fn recompute(&mut self) -> Recomputation {
        let totals = self.draft.totals(self.settings.igv_rate);
        let resolution = regime::resolve_regime(
            &self.draft.regime,
            self.draft.operation_code(),
            totals.adjusted_total,
            &self.company,
            &self.settings,
        );
        self.draft.regime = resolution.regime;
        self.last = Recomputation {
            totals,
            signals: resolution.signals,
        };
        self.last.clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
