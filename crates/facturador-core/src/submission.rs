//! # Submission Assembler
//!
//! Cross-field validation of a draft and its mapping to the backend DTO.
//!
//! ## Validation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  #  Check                                         Rejection             │
//! │  ─  ────────────────────────────────────────────  ───────────────────── │
//! │  1  FACTURA needs an 11-digit RUC                 FacturaWithDni /      │
//! │                                                   FacturaRequiresRuc    │
//! │  2  NOTA DE CREDITO needs serie + correlativo     MissingCreditNoteRef  │
//! │  3  Client selected                               MissingClient         │
//! │  4  At least one line                             EmptyCart             │
//! │  5  Op 0112: detracción saved, total >= 700       DetraccionNot... /    │
//! │                                                   DetraccionBelow...    │
//! │  6  Retención amount > 0                          RetencionAmount       │
//! │  7  NP/OT advance <= total                        AdvanceExceedsTotal   │
//! │  8  Credit installments still balance             Installments          │
//! │                                                                         │
//! │  The first failing check is reported. Nothing here mutates the draft.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::draft::InvoiceDraft;
use crate::error::DraftRejection;
use crate::money::Money;
use crate::regime::{validate_installments, RegimeStatus, TaxRegime};
use crate::settings::TaxSettings;
use crate::totals::InvoiceTotals;
use crate::types::{
    Currency, DocumentKind, DocumentReference, DocumentType, PaymentMethod, PaymentTerms,
};
use crate::words::leyenda;

/// ISO 8601 calendar date format used on the wire.
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Payload
// =============================================================================

/// The DTO posted to `/comprobantes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub idempotency_key: String,
    pub document_type: DocumentType,
    pub issue_date: String,
    pub currency: Currency,
    pub client: ClientPayload,
    pub operation_code: Option<String>,
    pub items: Vec<ItemPayload>,
    pub subtotal: Money,
    pub line_discounts: Money,
    pub global_discount: Money,
    pub gravada: Money,
    pub igv: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub payment_terms: PaymentTerms,
    pub installments: Vec<InstallmentPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detraccion: Option<DetraccionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retencion: Option<RetencionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<DocumentReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    pub leyenda: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    pub id: Option<i64>,
    pub name: String,
    pub document_number: String,
    pub document_kind: Option<DocumentKind>,
    pub address: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub product_id: Option<i64>,
    pub description: String,
    pub unit: Option<String>,
    #[ts(type = "number")]
    pub quantity: Decimal,
    pub unit_price: Money,
    #[ts(type = "number")]
    pub discount_percent: Decimal,
    pub discount: Money,
    pub sale_base: Money,
    pub igv: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPayload {
    pub number: u32,
    pub amount: Money,
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DetraccionPayload {
    pub tipo_detraccion_id: i64,
    pub medio_pago_detraccion_id: i64,
    pub cuenta_banco_nacion: String,
    #[ts(type = "number")]
    pub percent: Decimal,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RetencionPayload {
    #[ts(type = "number")]
    pub percent: Decimal,
    pub amount: Money,
}

// =============================================================================
// Validation
// =============================================================================

/// Runs every submission check in order and reports the first failure.
pub fn validate(
    draft: &InvoiceDraft,
    totals: &InvoiceTotals,
    settings: &TaxSettings,
) -> Result<(), DraftRejection> {
    let adjusted = totals.adjusted_total;

    if draft.document_type == DocumentType::Factura {
        let client = draft.client.as_ref();
        match client.and_then(|c| c.document_kind()) {
            Some(DocumentKind::Ruc) => {}
            Some(DocumentKind::Dni) => {
                return Err(DraftRejection::FacturaWithDni {
                    document: client
                        .map(|c| c.document_number.trim().to_string())
                        .unwrap_or_default(),
                })
            }
            None => return Err(DraftRejection::FacturaRequiresRuc),
        }
    }

    if draft.document_type == DocumentType::NotaCredito {
        let complete = draft.reference.as_ref().is_some_and(|r| {
            !r.serie.trim().is_empty() && !r.correlativo.trim().is_empty()
        });
        if !complete {
            return Err(DraftRejection::MissingCreditNoteReference);
        }
    }

    if !draft.client.as_ref().is_some_and(|c| c.is_selected()) {
        return Err(DraftRejection::MissingClient);
    }

    if draft.cart.is_empty() {
        return Err(DraftRejection::EmptyCart);
    }

    if settings.is_detraccion_operation(draft.operation_code()) {
        let configured = matches!(
            draft.regime,
            TaxRegime::Detraccion {
                status: RegimeStatus::Configured,
                ..
            }
        );
        if !configured {
            return Err(DraftRejection::DetraccionNotConfigured);
        }
        if !settings.meets_threshold(adjusted) {
            return Err(DraftRejection::DetraccionBelowThreshold {
                threshold: settings.regime_threshold,
                total: adjusted.round2(),
            });
        }
    }

    if draft.regime.is_retencion() && !draft.regime.amount().is_positive() {
        return Err(DraftRejection::RetencionAmount);
    }

    if draft.document_type.accepts_advance() {
        if let Some(advance) = draft.advance {
            if advance.round2() > adjusted.round2() {
                return Err(DraftRejection::AdvanceExceedsTotal {
                    advance: advance.round2(),
                    total: adjusted.round2(),
                });
            }
        }
    }

    validate_installments(
        draft.regime.payment_terms(),
        draft.regime.installments(),
        adjusted,
        draft.regime.amount(),
        settings.installment_tolerance,
    )
    .map_err(DraftRejection::Installments)
}

// =============================================================================
// Assembly
// =============================================================================

/// Validates `draft` and maps it to the backend payload.
///
/// All amounts are rounded to 2 decimals here and nowhere earlier.
pub fn assemble(
    draft: &InvoiceDraft,
    totals: &InvoiceTotals,
    settings: &TaxSettings,
) -> Result<SubmissionPayload, DraftRejection> {
    validate(draft, totals, settings)?;

    let client = draft.client.as_ref().ok_or(DraftRejection::MissingClient)?;
    let rounded = totals.rounded();

    let items = draft
        .cart
        .items()
        .iter()
        .map(|item| ItemPayload {
            product_id: item.product_id,
            description: item.description.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.round2(),
            discount_percent: item.discount_percent,
            discount: item.discount.round2(),
            sale_base: item.sale_base.round2(),
            igv: item.line_total.round2() - item.sale_base.round2(),
            total: item.line_total.round2(),
        })
        .collect();

    let installments = match draft.regime.payment_terms() {
        PaymentTerms::Contado => Vec::new(),
        PaymentTerms::Credito => draft
            .regime
            .installments()
            .iter()
            .zip(1u32..)
            .map(|(installment, number)| InstallmentPayload {
                number,
                amount: installment.amount.round2(),
                due_date: installment
                    .due_date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            })
            .collect(),
    };

    let (detraccion, retencion) = match &draft.regime {
        TaxRegime::None => (None, None),
        TaxRegime::Detraccion { config, .. } => (
            Some(DetraccionPayload {
                tipo_detraccion_id: config.tipo_detraccion_id.unwrap_or_default(),
                medio_pago_detraccion_id: config.medio_pago_detraccion_id.unwrap_or_default(),
                cuenta_banco_nacion: config.cuenta_banco_nacion.clone(),
                percent: config.percent,
                amount: config.amount.round2(),
            }),
            None,
        ),
        TaxRegime::Retencion { config, .. } => (
            None,
            Some(RetencionPayload {
                percent: config.percent,
                amount: config.amount.round2(),
            }),
        ),
    };

    let observations = draft.observations.trim();

    Ok(SubmissionPayload {
        idempotency_key: draft.idempotency_key.to_string(),
        document_type: draft.document_type,
        issue_date: draft.issue_date.format(DATE_FORMAT).to_string(),
        currency: draft.currency,
        client: ClientPayload {
            id: client.id,
            name: client.name.trim().to_string(),
            document_number: client.document_number.trim().to_string(),
            document_kind: client.document_kind(),
            address: client.address.clone(),
            email: client.email.clone(),
        },
        operation_code: draft.operation_code().map(str::to_string),
        items,
        subtotal: rounded.subtotal,
        line_discounts: rounded.discount,
        global_discount: rounded.global_discount,
        gravada: rounded.gravada,
        igv: rounded.igv,
        total: rounded.adjusted_total,
        payment_method: draft.payment_method,
        payment_terms: draft.regime.payment_terms(),
        installments,
        detraccion,
        retencion,
        reference: match draft.document_type {
            DocumentType::NotaCredito | DocumentType::NotaDebito => draft.reference.clone(),
            _ => None,
        },
        advance: draft
            .advance
            .filter(|_| draft.document_type.accepts_advance())
            .map(|a| a.round2()),
        observations: (!observations.is_empty()).then(|| observations.to_string()),
        leyenda: leyenda(rounded.adjusted_total, draft.currency),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{save_detraccion, save_retencion, DetraccionForm, RetencionForm};
    use crate::types::{Client, Installment, OperationType, Product, TaxRate};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const IGV: TaxRate = TaxRate::from_bps(1800);

    fn client(document: &str) -> Client {
        Client {
            id: Some(7),
            name: "Constructora Los Andes SAC".to_string(),
            document_number: document.to_string(),
            address: Some("Av. Arequipa 123, Lima".to_string()),
            email: None,
        }
    }

    fn op(codigo: &str) -> OperationType {
        OperationType {
            id: 1,
            codigo: codigo.to_string(),
            descripcion: "Operación".to_string(),
            allows_global_discount: true,
        }
    }

    fn cement(units: i64) -> Product {
        Product {
            id: 1,
            description: "Cemento Sol 42.5kg".to_string(),
            unit_price: Money::from_units(units),
            stock: 10,
            unit: Some("NIU".to_string()),
            category: None,
        }
    }

    fn draft_with_total(units: i64) -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(IGV, NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
        draft.client = Some(client("20123456789"));
        draft.cart.add_product(&cement(units)).unwrap();
        draft
    }

    fn check(draft: &InvoiceDraft) -> Result<(), DraftRejection> {
        let settings = TaxSettings::default();
        validate(draft, &draft.totals(IGV), &settings)
    }

    fn detraccion_form() -> DetraccionForm {
        DetraccionForm {
            tipo_detraccion_id: Some(3),
            medio_pago_detraccion_id: Some(1),
            cuenta_banco_nacion: "00-123-456789".to_string(),
            percent: dec!(12),
            payment_terms: PaymentTerms::Contado,
            installments: Vec::new(),
        }
    }

    #[test]
    fn test_factura_rejects_dni_and_accepts_ruc() {
        let mut draft = draft_with_total(100);
        draft.document_type = DocumentType::Factura;

        draft.client = Some(client("87654321"));
        let err = check(&draft).unwrap_err();
        assert_eq!(
            err,
            DraftRejection::FacturaWithDni {
                document: "87654321".to_string()
            }
        );
        assert!(err.to_string().contains("RUC"));

        draft.client = Some(client("20123456789"));
        assert!(check(&draft).is_ok());

        draft.client = Some(client("12345"));
        assert_eq!(check(&draft), Err(DraftRejection::FacturaRequiresRuc));
    }

    #[test]
    fn test_boleta_accepts_dni() {
        let mut draft = draft_with_total(100);
        draft.client = Some(client("87654321"));
        assert!(check(&draft).is_ok());
    }

    #[test]
    fn test_credit_note_requires_reference() {
        let mut draft = draft_with_total(100);
        draft.document_type = DocumentType::NotaCredito;
        assert_eq!(
            check(&draft),
            Err(DraftRejection::MissingCreditNoteReference)
        );

        draft.reference = Some(DocumentReference {
            serie: "F001".to_string(),
            correlativo: " ".to_string(),
            motivo: None,
        });
        assert_eq!(
            check(&draft),
            Err(DraftRejection::MissingCreditNoteReference)
        );

        draft.reference = Some(DocumentReference {
            serie: "F001".to_string(),
            correlativo: "000123".to_string(),
            motivo: Some("Anulación de la operación".to_string()),
        });
        assert!(check(&draft).is_ok());
    }

    #[test]
    fn test_client_and_cart_required() {
        let mut draft = draft_with_total(100);
        draft.client = None;
        assert_eq!(check(&draft), Err(DraftRejection::MissingClient));

        draft.client = Some(client("87654321"));
        draft.cart.clear();
        assert_eq!(check(&draft), Err(DraftRejection::EmptyCart));
    }

    #[test]
    fn test_detraccion_below_threshold_blocked_even_when_configured() {
        let settings = TaxSettings::default();
        let mut draft = draft_with_total(650);
        draft.operation_type = Some(op("0112"));
        assert_eq!(check(&draft), Err(DraftRejection::DetraccionNotConfigured));

        draft.regime = save_detraccion(
            detraccion_form(),
            Money::from_units(650),
            Some("0112"),
            &settings,
        )
        .unwrap();

        assert!(matches!(
            check(&draft),
            Err(DraftRejection::DetraccionBelowThreshold { .. })
        ));
    }

    #[test]
    fn test_advance_cannot_exceed_total() {
        let mut draft = draft_with_total(100);
        draft.document_type = DocumentType::NotaPedido;
        draft.advance = Some(Money::from_units(150));
        assert!(matches!(
            check(&draft),
            Err(DraftRejection::AdvanceExceedsTotal { .. })
        ));

        draft.advance = Some(Money::from_units(100));
        assert!(check(&draft).is_ok());
    }

    #[test]
    fn test_stale_installments_rejected() {
        let settings = TaxSettings::default();
        let mut draft = draft_with_total(750);
        draft.regime = save_retencion(
            RetencionForm {
                payment_terms: PaymentTerms::Credito,
                installments: vec![Installment::new(
                    Money::from_cents(72750),
                    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                )],
            },
            Money::from_units(750),
            None,
            &settings,
        )
        .unwrap();
        assert!(check(&draft).is_ok());

        // Total changed after the schedule was saved
        draft.cart.add_product(&cement(750)).unwrap();
        assert!(matches!(
            check(&draft),
            Err(DraftRejection::Installments(_))
        ));
    }

    #[test]
    fn test_assemble_retencion_payload() {
        let settings = TaxSettings::default();
        let mut draft = draft_with_total(750);
        draft.document_type = DocumentType::Factura;
        draft.observations = "  Entrega en obra ".to_string();
        draft.regime = save_retencion(
            RetencionForm::default(),
            Money::from_units(750),
            Some("0101"),
            &settings,
        )
        .unwrap();

        let payload = assemble(&draft, &draft.totals(IGV), &settings).unwrap();

        assert_eq!(payload.total, Money::from_units(750));
        assert_eq!(payload.gravada, Money::from_cents(63559));
        assert_eq!(payload.igv, Money::from_cents(11441));
        assert_eq!(payload.issue_date, "2025-05-02");
        assert_eq!(payload.observations.as_deref(), Some("Entrega en obra"));
        assert_eq!(payload.client.document_kind, Some(DocumentKind::Ruc));
        assert_eq!(payload.leyenda, "SETECIENTOS CINCUENTA CON 00/100 SOLES");
        assert_eq!(payload.idempotency_key, draft.idempotency_key.to_string());
        assert!(payload.detraccion.is_none());
        assert_eq!(
            payload.retencion.as_ref().map(|r| r.amount),
            Some(Money::from_cents(2250))
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("detraccion").is_none());
        assert_eq!(json["retencion"]["amount"], 22.5);
        assert_eq!(json["documentType"], "FACTURA");
    }

    #[test]
    fn test_assemble_detraccion_credit_payload() {
        let settings = TaxSettings::default();
        let mut draft = draft_with_total(1000);
        draft.document_type = DocumentType::Factura;
        draft.operation_type = Some(op("0112"));

        let mut form = detraccion_form();
        form.payment_terms = PaymentTerms::Credito;
        form.installments = vec![
            Installment::new(
                Money::from_units(440),
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            ),
            Installment::new(
                Money::from_units(440),
                NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ),
        ];
        draft.regime =
            save_detraccion(form, Money::from_units(1000), Some("0112"), &settings).unwrap();

        let payload = assemble(&draft, &draft.totals(IGV), &settings).unwrap();

        let detraccion = payload.detraccion.as_ref().unwrap();
        assert_eq!(detraccion.amount, Money::from_units(120));
        assert_eq!(detraccion.tipo_detraccion_id, 3);
        assert!(payload.retencion.is_none());
        assert_eq!(payload.payment_terms, PaymentTerms::Credito);
        assert_eq!(payload.installments.len(), 2);
        assert_eq!(payload.installments[1].number, 2);
        assert_eq!(payload.installments[1].due_date, "2025-07-01");
        assert_eq!(payload.operation_code.as_deref(), Some("0112"));
    }

    #[test]
    fn test_assemble_rejects_invalid_draft() {
        let mut draft = draft_with_total(100);
        draft.client = None;
        let settings = TaxSettings::default();
        assert_eq!(
            assemble(&draft, &draft.totals(IGV), &settings),
            Err(DraftRejection::MissingClient)
        );
    }

    #[test]
    fn test_advance_dropped_for_other_documents() {
        let settings = TaxSettings::default();
        let mut draft = draft_with_total(100);
        draft.advance = Some(Money::from_units(50));

        let payload = assemble(&draft, &draft.totals(IGV), &settings).unwrap();
        assert_eq!(payload.advance, None);

        draft.document_type = DocumentType::OrdenTrabajo;
        let payload = assemble(&draft, &draft.totals(IGV), &settings).unwrap();
        assert_eq!(payload.advance, Some(Money::from_units(50)));
    }
}
