//! # Receipt View
//!
//! Read-only projection of a draft for the ticket/A4/A5 renderers.
//!
//! The view carries rounded numbers and plain strings only. Layout, fonts,
//! thousands separators and paper size belong to the renderer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::draft::InvoiceDraft;
use crate::money::Money;
use crate::regime::TaxRegime;
use crate::totals::InvoiceTotals;
use crate::types::{
    Client, CompanyProfile, Currency, DocumentType, Installment, PaymentMethod, PaymentTerms,
};
use crate::words::leyenda;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub description: String,
    pub unit: Option<String>,
    #[ts(type = "number")]
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount: Money,
    pub total: Money,
}

/// Withholding line printed under the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegimeSummary {
    /// `DETRACCIÓN` or `RETENCIÓN`.
    pub label: String,
    #[ts(type = "number")]
    pub percent: Decimal,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub document_type: DocumentType,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    pub currency: Currency,
    pub company: CompanyProfile,
    pub client: Option<Client>,
    pub items: Vec<ReceiptLine>,
    pub totals: InvoiceTotals,
    pub regime: Option<RegimeSummary>,
    /// Total minus the withheld amount.
    pub net_payable: Money,
    pub payment_method: PaymentMethod,
    pub payment_terms: PaymentTerms,
    pub installments: Vec<Installment>,
    pub advance: Option<Money>,
    /// Total minus the advance, for NP/OT.
    pub balance_due: Option<Money>,
    pub observations: Option<String>,
    pub leyenda: String,
}

impl ReceiptView {
    /// Projects `draft` with its `totals` for printing.
    pub fn build(draft: &InvoiceDraft, totals: &InvoiceTotals, company: &CompanyProfile) -> Self {
        let totals = totals.rounded();

        let items = draft
            .cart
            .items()
            .iter()
            .map(|item| ReceiptLine {
                description: item.description.clone(),
                unit: item.unit.clone(),
                quantity: item.quantity.normalize(),
                unit_price: item.unit_price.round2(),
                discount: item.discount.round2(),
                total: item.line_total.round2(),
            })
            .collect();

        let regime = match &draft.regime {
            TaxRegime::None => None,
            TaxRegime::Detraccion { config, .. } => Some(RegimeSummary {
                label: "DETRACCIÓN".to_string(),
                percent: config.percent,
                amount: config.amount.round2(),
            }),
            TaxRegime::Retencion { config, .. } => Some(RegimeSummary {
                label: "RETENCIÓN".to_string(),
                percent: config.percent,
                amount: config.amount.round2(),
            }),
        };

        let advance = draft
            .advance
            .filter(|_| draft.document_type.accepts_advance())
            .map(|a| a.round2());
        let observations = draft.observations.trim();

        ReceiptView {
            document_type: draft.document_type,
            issue_date: draft.issue_date,
            currency: draft.currency,
            company: company.clone(),
            client: draft.client.clone(),
            items,
            net_payable: totals.adjusted_total - draft.regime.amount().round2(),
            regime,
            payment_method: draft.payment_method,
            payment_terms: draft.regime.payment_terms(),
            installments: draft.regime.installments().to_vec(),
            balance_due: advance.map(|a| (totals.adjusted_total - a).max_zero()),
            advance,
            observations: (!observations.is_empty()).then(|| observations.to_string()),
            leyenda: leyenda(totals.adjusted_total, draft.currency),
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{save_retencion, RetencionForm};
    use crate::settings::TaxSettings;
    use crate::types::{Product, TaxRate};
    use rust_decimal_macros::dec;

    const IGV: TaxRate = TaxRate::from_bps(1800);

    fn company() -> CompanyProfile {
        CompanyProfile {
            ruc: "20100000001".to_string(),
            razon_social: "Ferretería Central SAC".to_string(),
            es_agente_retencion: true,
        }
    }

    fn draft() -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(IGV, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        draft
            .cart
            .add_product(&Product {
                id: 5,
                description: "Varilla 1/2\"".to_string(),
                unit_price: Money::from_cents(3990),
                stock: 100,
                unit: Some("NIU".to_string()),
                category: None,
            })
            .unwrap();
        draft
    }

    #[test]
    fn test_receipt_without_regime() {
        let draft = draft();
        let view = ReceiptView::build(&draft, &draft.totals(IGV), &company());

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, dec!(1));
        assert_eq!(view.totals.adjusted_total, Money::from_cents(3990));
        assert_eq!(view.net_payable, Money::from_cents(3990));
        assert!(view.regime.is_none());
        assert_eq!(view.leyenda, "TREINTA Y NUEVE CON 90/100 SOLES");
        assert_eq!(view.company.razon_social, "Ferretería Central SAC");
    }

    #[test]
    fn test_receipt_with_retencion() {
        let mut draft = draft();
        let settings = TaxSettings::default();
        for _ in 0..24 {
            draft
                .cart
                .add_product(&Product {
                    id: 5,
                    description: "Varilla 1/2\"".to_string(),
                    unit_price: Money::from_cents(3990),
                    stock: 100,
                    unit: None,
                    category: None,
                })
                .unwrap();
        }
        let totals = draft.totals(IGV);
        draft.regime =
            save_retencion(RetencionForm::default(), totals.adjusted_total, None, &settings)
                .unwrap();

        let view = ReceiptView::build(&draft, &totals, &company());

        // 25 × 39.90 = 997.50, 3% = 29.925 → 29.93
        let regime = view.regime.as_ref().unwrap();
        assert_eq!(regime.label, "RETENCIÓN");
        assert_eq!(regime.amount, Money::from_cents(2993));
        assert_eq!(view.net_payable, Money::from_cents(96757));
    }

    #[test]
    fn test_receipt_balance_due_for_work_orders() {
        let mut draft = draft();
        draft.document_type = DocumentType::OrdenTrabajo;
        draft.advance = Some(Money::from_units(10));
        draft.observations = "   ".to_string();

        let view = ReceiptView::build(&draft, &draft.totals(IGV), &company());

        assert_eq!(view.advance, Some(Money::from_units(10)));
        assert_eq!(view.balance_due, Some(Money::from_cents(2990)));
        assert_eq!(view.observations, None);
    }
}
