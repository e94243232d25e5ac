use std::str::FromStr;

use alloy_primitives::Address;

use crate::model::{CurrencyEntry, CurrencyKind};

pub const INVALID_CURRENCY_LABEL: &str = "Invalid Currency";
pub const INVALID_CURRENCY_VALUE: &str = "Unknown";

/// Static table of supported currencies. The first entry is the native coin.
#[derive(Debug, Clone)]
pub struct CurrencyRegistry {
    entries: Vec<CurrencyEntry>,
}

impl CurrencyRegistry {
    /// Returns `None` for an empty table: without a native entry no payment
    /// can be routed.
    pub fn new(entries: Vec<CurrencyEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self { entries })
    }

    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn native(&self) -> &CurrencyEntry {
        &self.entries[0]
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.entries.iter().map(|c| c.value.clone()).collect()
    }

    pub fn by_label(&self, label: &str) -> Option<&CurrencyEntry> {
        self.entries
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
    }

    fn find(&self, token: &str) -> Option<&CurrencyEntry> {
        if token.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|c| c.value.eq_ignore_ascii_case(token))
    }

    /// Display entry for `token`. Unknown or empty identifiers yield the
    /// sentinel entry, which must never be used to route a payment.
    pub fn resolve(&self, token: &str) -> CurrencyEntry {
        match self.find(token) {
            Some(entry) => entry.clone(),
            None => {
                tracing::debug!(target: "currency", token = %token, "unsupported currency");
                sentinel()
            }
        }
    }

    pub fn is_native(&self, token: &str) -> bool {
        self.native().value.eq_ignore_ascii_case(token)
    }

    /// Classifies `token` for payment routing. Identifiers other than the
    /// native one are treated as token contracts whenever they parse as an
    /// address, registered or not.
    pub fn kind_of(&self, token: &str) -> Option<CurrencyKind> {
        if self.is_native(token) {
            return Some(CurrencyKind::Native);
        }
        Address::from_str(token.trim()).ok().map(CurrencyKind::Token)
    }
}

pub fn sentinel() -> CurrencyEntry {
    CurrencyEntry::new(INVALID_CURRENCY_LABEL, INVALID_CURRENCY_VALUE)
}

pub fn is_sentinel(entry: &CurrencyEntry) -> bool {
    entry.value == INVALID_CURRENCY_VALUE && entry.label == INVALID_CURRENCY_LABEL
}
