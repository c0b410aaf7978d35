//! # Amount in Words
//!
//! Builds the `leyenda` printed on every comprobante: the total spelled out
//! in Spanish, uppercase, with the cents as a fraction.
//!
//! ```text
//! 500.00   PEN  →  QUINIENTOS CON 00/100 SOLES
//! 1021.50  PEN  →  MIL VEINTIUNO CON 50/100 SOLES
//! 21000.00 USD  →  VEINTIÚN MIL CON 00/100 DÓLARES AMERICANOS
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::money::Money;
use crate::types::Currency;

const UNITS: [&str; 30] = [
    "CERO",
    "UNO",
    "DOS",
    "TRES",
    "CUATRO",
    "CINCO",
    "SEIS",
    "SIETE",
    "OCHO",
    "NUEVE",
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISÉIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
    "VEINTE",
    "VEINTIUNO",
    "VEINTIDÓS",
    "VEINTITRÉS",
    "VEINTICUATRO",
    "VEINTICINCO",
    "VEINTISÉIS",
    "VEINTISIETE",
    "VEINTIOCHO",
    "VEINTINUEVE",
];

const TENS: [&str; 10] = [
    "", "", "", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
];

const HUNDREDS: [&str; 10] = [
    "",
    "CIENTO",
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

/// Spells out `amount` for the leyenda.
///
/// The amount is rounded to cents first; the sign is ignored.
///
/// ## Example
/// ```rust
/// use facturador_core::money::Money;
/// use facturador_core::types::Currency;
/// use facturador_core::words::leyenda;
///
/// assert_eq!(leyenda(Money::from_units(500), Currency::Pen), "QUINIENTOS CON 00/100 SOLES");
/// ```
pub fn leyenda(amount: Money, currency: Currency) -> String {
    let rounded = amount.round2().amount().abs();
    let integer = rounded.trunc();
    let cents = ((rounded - integer) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();

    format!(
        "{} CON {:02}/100 {}",
        number_to_words(integer.to_u128().unwrap_or_default()),
        cents,
        currency.leyenda_name()
    )
}

/// Spells out a non-negative integer in uppercase Spanish.
pub fn number_to_words(n: u128) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }
    spell(n, false)
}

// `apocope` selects UN/VEINTIÚN for a trailing one that precedes MIL or
// MILLÓN(ES).
fn spell(n: u128, apocope: bool) -> String {
    let millions = n / 1_000_000;
    let rest = n % 1_000_000;

    let mut parts = Vec::new();
    match millions {
        0 => {}
        1 => parts.push("UN MILLÓN".to_string()),
        m => parts.push(format!("{} MILLONES", spell(m, true))),
    }

    let thousands = rest / 1_000;
    let units = rest % 1_000;
    match thousands {
        0 => {}
        1 => parts.push("MIL".to_string()),
        t => parts.push(format!("{} MIL", below_thousand(t, true))),
    }

    if units > 0 {
        parts.push(below_thousand(units, apocope));
    }

    parts.join(" ")
}

fn below_thousand(n: u128, apocope: bool) -> String {
    if n == 100 {
        return "CIEN".to_string();
    }

    let hundreds = (n / 100) as usize;
    let rest = n % 100;

    match (hundreds, rest) {
        (0, r) => below_hundred(r, apocope),
        (h, 0) => HUNDREDS[h].to_string(),
        (h, r) => format!("{} {}", HUNDREDS[h], below_hundred(r, apocope)),
    }
}

fn below_hundred(n: u128, apocope: bool) -> String {
    let n = n as usize;
    if n < 30 {
        return match (n, apocope) {
            (1, true) => "UN".to_string(),
            (21, true) => "VEINTIÚN".to_string(),
            _ => UNITS[n].to_string(),
        };
    }

    let tens = TENS[n / 10];
    match n % 10 {
        0 => tens.to_string(),
        1 if apocope => format!("{} Y UN", tens),
        u => format!("{} Y {}", tens, UNITS[u]),
    }
}
