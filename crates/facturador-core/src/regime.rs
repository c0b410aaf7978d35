//! # Tax Regime Resolver
//!
//! Decides whether Detracción, Retención or neither applies to a draft and
//! validates the configuration dialog for each.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            op == 0112                        save_detraccion() ok       │
//! │   NONE ─────────────────► DETRACCION{Pending} ───────► DETRACCION{Conf} │
//! │    ▲  │                          │                            │         │
//! │    │  │                          └──── op != 0112 ────────────┤         │
//! │    │  │                                  (DetraccionCleared)  │         │
//! │    │  │ adjusted >= 700 && agente && op != 0112               │         │
//! │    │  ▼                                                       ▼         │
//! │    │  RETENCION{Pending} ──save_retencion() ok──► RETENCION{Conf}       │
//! │    │        │                                           │               │
//! │    └────────┴──── adjusted < 700  or  op == 0112 ───────┘               │
//! │                      (RetencionCleared)                                 │
//! │                                                                         │
//! │  TaxRegime is one enum slot: Detracción and Retención cannot coexist.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`resolve_regime`] is the only transition function. The engine calls it
//! once per mutation with the fresh adjusted total and operation code, so
//! the result does not depend on which of the two changed last.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{RegimeError, RegimeResult};
use crate::money::{Money, MONEY_SCALE};
use crate::settings::TaxSettings;
use crate::types::{CompanyProfile, Installment, PaymentTerms, TaxRate, TipoDetraccion};

// =============================================================================
// Regime Types
// =============================================================================

/// Whether a regime still needs the configuration dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeStatus {
    /// DETRACCION_PENDING or RETENCION_PROPOSED.
    Pending,
    /// Saved through the dialog.
    Configured,
}

/// Detracción (SPOT) data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DetraccionConfig {
    pub tipo_detraccion_id: Option<i64>,
    pub medio_pago_detraccion_id: Option<i64>,
    pub cuenta_banco_nacion: String,
    #[ts(type = "number")]
    pub percent: Decimal,
    pub amount: Money,
    pub payment_terms: PaymentTerms,
    pub installments: Vec<Installment>,
}

impl DetraccionConfig {
    /// Copies the catalog percentage of `tipo` and re-derives the amount.
    pub fn apply_tipo(&mut self, tipo: &TipoDetraccion, adjusted: Money) {
        self.tipo_detraccion_id = Some(tipo.id);
        self.percent = tipo.porcentaje;
        self.amount = detraccion_amount(adjusted, self.percent);
    }
}

/// Retención data. The percentage is always the configured retention rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RetencionConfig {
    #[ts(type = "number")]
    pub percent: Decimal,
    pub amount: Money,
    pub payment_terms: PaymentTerms,
    pub installments: Vec<Installment>,
}

impl RetencionConfig {
    fn proposed(adjusted: Money, rate: TaxRate) -> Self {
        RetencionConfig {
            percent: rate.as_percent(),
            amount: retencion_amount(adjusted, rate),
            payment_terms: PaymentTerms::Contado,
            installments: Vec::new(),
        }
    }
}

/// The withholding regime of a draft.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRegime {
    #[default]
    None,
    Detraccion {
        config: DetraccionConfig,
        status: RegimeStatus,
    },
    Retencion {
        config: RetencionConfig,
        status: RegimeStatus,
    },
}

impl TaxRegime {
    pub fn is_none(&self) -> bool {
        matches!(self, TaxRegime::None)
    }

    pub fn is_detraccion(&self) -> bool {
        matches!(self, TaxRegime::Detraccion { .. })
    }

    pub fn is_retencion(&self) -> bool {
        matches!(self, TaxRegime::Retencion { .. })
    }

    /// `None` for the no-regime case.
    pub fn status(&self) -> Option<RegimeStatus> {
        match self {
            TaxRegime::None => None,
            TaxRegime::Detraccion { status, .. } | TaxRegime::Retencion { status, .. } => {
                Some(*status)
            }
        }
    }

    /// Withheld amount, zero when no regime applies.
    pub fn amount(&self) -> Money {
        match self {
            TaxRegime::None => Money::zero(),
            TaxRegime::Detraccion { config, .. } => config.amount,
            TaxRegime::Retencion { config, .. } => config.amount,
        }
    }

    /// Payment terms. No regime means a cash sale.
    pub fn payment_terms(&self) -> PaymentTerms {
        match self {
            TaxRegime::None => PaymentTerms::Contado,
            TaxRegime::Detraccion { config, .. } => config.payment_terms,
            TaxRegime::Retencion { config, .. } => config.payment_terms,
        }
    }

    pub fn installments(&self) -> &[Installment] {
        match self {
            TaxRegime::None => &[],
            TaxRegime::Detraccion { config, .. } => &config.installments,
            TaxRegime::Retencion { config, .. } => &config.installments,
        }
    }
}

/// Notification for the UI produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeSignal {
    /// Open the detracción dialog.
    PromptDetraccion,
    DetraccionCleared,
    RetencionProposed,
    RetencionCleared,
}

/// Output of [`resolve_regime`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub regime: TaxRegime,
    pub signals: Vec<RegimeSignal>,
}

// =============================================================================
// Amounts
// =============================================================================

/// `round2(adjusted × percent / 100)` when both are positive, else zero.
pub fn detraccion_amount(adjusted: Money, percent: Decimal) -> Money {
    if adjusted.is_positive() && percent > Decimal::ZERO {
        adjusted.percent(percent).round2()
    } else {
        Money::zero()
    }
}

/// `round2(adjusted × rate)`, never negative.
pub fn retencion_amount(adjusted: Money, rate: TaxRate) -> Money {
    adjusted.max_zero().apply_rate(rate).round2()
}

// =============================================================================
// Transition Function
// =============================================================================

/// Computes the regime that follows `previous` for the current inputs.
///
/// ## Rules
/// - Detracción operation: keep an existing Detracción with its amount
///   re-derived, otherwise open a pending one; any Retención is dropped
/// - Any other operation: drop Detracción; drop Retención below the
///   threshold; propose Retención at or above it for a retention agent
pub fn resolve_regime(
    previous: &TaxRegime,
    operation_code: Option<&str>,
    adjusted: Money,
    company: &CompanyProfile,
    settings: &TaxSettings,
) -> Resolution {
    let mut signals = Vec::new();

    if settings.is_detraccion_operation(operation_code) {
        let regime = match previous {
            TaxRegime::Detraccion { config, status } => {
                let mut config = config.clone();
                config.amount = detraccion_amount(adjusted, config.percent);
                TaxRegime::Detraccion {
                    config,
                    status: *status,
                }
            }
            other => {
                if other.is_retencion() {
                    signals.push(RegimeSignal::RetencionCleared);
                }
                signals.push(RegimeSignal::PromptDetraccion);
                TaxRegime::Detraccion {
                    config: DetraccionConfig::default(),
                    status: RegimeStatus::Pending,
                }
            }
        };
        return Resolution { regime, signals };
    }

    let cleared = TaxRegime::None;
    let current = if previous.is_detraccion() {
        signals.push(RegimeSignal::DetraccionCleared);
        &cleared
    } else {
        previous
    };

    let below = !settings.meets_threshold(adjusted);
    let regime = match current {
        TaxRegime::Retencion { .. } if below => {
            signals.push(RegimeSignal::RetencionCleared);
            TaxRegime::None
        }
        TaxRegime::Retencion { config, status } => {
            let mut config = config.clone();
            config.amount = retencion_amount(adjusted, settings.retencion_rate);
            config.percent = settings.retencion_rate.as_percent();
            TaxRegime::Retencion {
                config,
                status: *status,
            }
        }
        _ if !below && company.es_agente_retencion => {
            signals.push(RegimeSignal::RetencionProposed);
            TaxRegime::Retencion {
                config: RetencionConfig::proposed(adjusted, settings.retencion_rate),
                status: RegimeStatus::Pending,
            }
        }
        _ => TaxRegime::None,
    };

    Resolution { regime, signals }
}

// =============================================================================
// Configuration Dialog
// =============================================================================

/// Detracción dialog input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DetraccionForm {
    pub tipo_detraccion_id: Option<i64>,
    pub medio_pago_detraccion_id: Option<i64>,
    pub cuenta_banco_nacion: String,
    #[ts(type = "number")]
    pub percent: Decimal,
    pub payment_terms: PaymentTerms,
    pub installments: Vec<Installment>,
}

impl From<&DetraccionConfig> for DetraccionForm {
    fn from(config: &DetraccionConfig) -> Self {
        DetraccionForm {
            tipo_detraccion_id: config.tipo_detraccion_id,
            medio_pago_detraccion_id: config.medio_pago_detraccion_id,
            cuenta_banco_nacion: config.cuenta_banco_nacion.clone(),
            percent: config.percent,
            payment_terms: config.payment_terms,
            installments: config.installments.clone(),
        }
    }
}

/// Retención dialog input. The amount is derived, not entered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RetencionForm {
    pub payment_terms: PaymentTerms,
    pub installments: Vec<Installment>,
}

/// Validates the detracción dialog and returns the configured regime.
pub fn save_detraccion(
    form: DetraccionForm,
    adjusted: Money,
    operation_code: Option<&str>,
    settings: &TaxSettings,
) -> RegimeResult<TaxRegime> {
    if !settings.is_detraccion_operation(operation_code) {
        return Err(RegimeError::NotDetraccionOperation {
            code: settings.detraccion_operation_code.clone(),
        });
    }
    if form.tipo_detraccion_id.is_none() {
        return Err(RegimeError::MissingTipoDetraccion);
    }
    if form.medio_pago_detraccion_id.is_none() {
        return Err(RegimeError::MissingMedioPago);
    }
    if form.cuenta_banco_nacion.trim().is_empty() {
        return Err(RegimeError::MissingCuentaBancoNacion);
    }

    let amount = detraccion_amount(adjusted, form.percent);
    if !amount.is_positive() {
        return Err(RegimeError::NonPositiveAmount {
            regime: "detracción",
        });
    }

    validate_installments(
        form.payment_terms,
        &form.installments,
        adjusted,
        amount,
        settings.installment_tolerance,
    )?;

    Ok(TaxRegime::Detraccion {
        config: DetraccionConfig {
            tipo_detraccion_id: form.tipo_detraccion_id,
            medio_pago_detraccion_id: form.medio_pago_detraccion_id,
            cuenta_banco_nacion: form.cuenta_banco_nacion.trim().to_string(),
            percent: form.percent,
            amount,
            payment_terms: form.payment_terms,
            installments: form.installments,
        },
        status: RegimeStatus::Configured,
    })
}

/// Validates the retención dialog and returns the configured regime.
pub fn save_retencion(
    form: RetencionForm,
    adjusted: Money,
    operation_code: Option<&str>,
    settings: &TaxSettings,
) -> RegimeResult<TaxRegime> {
    if settings.is_detraccion_operation(operation_code) {
        return Err(RegimeError::RetencionUnderDetraccion);
    }
    if !settings.meets_threshold(adjusted) {
        return Err(RegimeError::RetencionBelowThreshold {
            threshold: settings.regime_threshold,
        });
    }

    let amount = retencion_amount(adjusted, settings.retencion_rate);
    if !amount.is_positive() {
        return Err(RegimeError::NonPositiveAmount { regime: "retención" });
    }

    validate_installments(
        form.payment_terms,
        &form.installments,
        adjusted,
        amount,
        settings.installment_tolerance,
    )?;

    Ok(TaxRegime::Retencion {
        config: RetencionConfig {
            percent: settings.retencion_rate.as_percent(),
            amount,
            payment_terms: form.payment_terms,
            installments: form.installments,
        },
        status: RegimeStatus::Configured,
    })
}

// =============================================================================
// Installments
// =============================================================================

/// Checks a credit schedule against `adjusted − regime_amount`.
///
/// ## Rules (CREDITO only; CONTADO always passes)
/// - At least one installment
/// - Each installment has a positive amount and a due date
/// - `|Σ amounts − (adjusted − regime_amount)| <= tolerance`
pub fn validate_installments(
    terms: PaymentTerms,
    installments: &[Installment],
    adjusted: Money,
    regime_amount: Money,
    tolerance: Money,
) -> RegimeResult<()> {
    if terms == PaymentTerms::Contado {
        return Ok(());
    }
    if installments.is_empty() {
        return Err(RegimeError::NoInstallments);
    }

    for (i, installment) in installments.iter().enumerate() {
        if !installment.amount.is_positive() {
            return Err(RegimeError::InstallmentAmount { number: i + 1 });
        }
        if installment.due_date.is_none() {
            return Err(RegimeError::InstallmentDueDate { number: i + 1 });
        }
    }

    let expected = (adjusted - regime_amount).round2();
    let actual: Money = installments.iter().map(|i| i.amount).sum();
    if actual.distance(expected) > tolerance {
        return Err(RegimeError::InstallmentSumMismatch { expected, actual });
    }

    Ok(())
}

/// Splits `total` into `count` monthly installments starting at `first_due`.
///
/// Every installment but the last gets `total / count` truncated to cents;
/// the last absorbs the remainder so the schedule sums to `total` exactly.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use facturador_core::money::Money;
/// use facturador_core::regime::split_installments;
///
/// let first = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
/// let schedule = split_installments(Money::from_units(100), 3, first).unwrap();
/// assert_eq!(schedule[0].amount, Money::from_cents(3333));
/// assert_eq!(schedule[2].amount, Money::from_cents(3334));
/// assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2025, 2, 28));
/// ```
pub fn split_installments(
    total: Money,
    count: usize,
    first_due: NaiveDate,
) -> RegimeResult<Vec<Installment>> {
    let invalid = || RegimeError::InvalidInstallmentCount { count };

    let total = total.round2();
    let divisor = u32::try_from(count).map_err(|_| invalid())?;
    if divisor == 0 {
        return Err(invalid());
    }

    let share = Money::new(
        (total.amount() / Decimal::from(divisor))
            .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero),
    );
    if !share.is_positive() {
        return Err(invalid());
    }

    let mut schedule = Vec::with_capacity(count);
    let mut distributed = Money::zero();
    for month in 0..divisor {
        let amount = if month + 1 == divisor {
            total - distributed
        } else {
            share
        };
        let due_date = first_due
            .checked_add_months(Months::new(month))
            .ok_or_else(invalid)?;

        distributed += amount;
        schedule.push(Installment::new(amount, due_date));
    }

    Ok(schedule)
}

// =============================================================================
// Unit Tests
// =============================================================================
