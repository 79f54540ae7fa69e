//! Raw event counters and the rates derived from them.
//!
//! Every ratio goes through [`safe_div`], so a zero denominator yields 0 at
//! leaves, internal rollup nodes, and aggregates alike.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Performance score weights: sessions, registrations, converted users.
pub const SCORE_WEIGHT_SESSIONS: f64 = 0.3;
pub const SCORE_WEIGHT_REGISTRATIONS: f64 = 0.4;
pub const SCORE_WEIGHT_CONVERTED: f64 = 0.3;

/// Divide, returning 0 when the denominator is 0.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Percentage `numerator / denominator * 100` under the zero policy.
pub fn safe_pct(numerator: u64, denominator: u64) -> f64 {
    safe_div(numerator as f64, denominator as f64) * 100.0
}

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Un-derived event counts summed over a set of hourly facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCounters {
    pub sessions: u64,
    pub registrations: u64,
    pub messages: u64,
    pub converted_users: u64,
    pub total_accounts: u64,
    pub credit_cards: u64,
    pub email_accounts: u64,
    pub google_accounts: u64,
    pub payment_methods: u64,
}

impl RawCounters {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Weighted performance score used for campaign ranking.
    pub fn performance_score(&self) -> f64 {
        SCORE_WEIGHT_SESSIONS * self.sessions as f64
            + SCORE_WEIGHT_REGISTRATIONS * self.registrations as f64
            + SCORE_WEIGHT_CONVERTED * self.converted_users as f64
    }
}

impl Add for RawCounters {
    type Output = RawCounters;

    fn add(mut self, rhs: RawCounters) -> RawCounters {
        self += rhs;
        self
    }
}

impl AddAssign for RawCounters {
    fn add_assign(&mut self, rhs: RawCounters) {
        self.sessions += rhs.sessions;
        self.registrations += rhs.registrations;
        self.messages += rhs.messages;
        self.converted_users += rhs.converted_users;
        self.total_accounts += rhs.total_accounts;
        self.credit_cards += rhs.credit_cards;
        self.email_accounts += rhs.email_accounts;
        self.google_accounts += rhs.google_accounts;
        self.payment_methods += rhs.payment_methods;
    }
}

impl Sum for RawCounters {
    fn sum<I: Iterator<Item = RawCounters>>(iter: I) -> RawCounters {
        iter.fold(RawCounters::default(), Add::add)
    }
}

impl<'a> Sum<&'a RawCounters> for RawCounters {
    fn sum<I: Iterator<Item = &'a RawCounters>>(iter: I) -> RawCounters {
        iter.copied().sum()
    }
}

/// Rates derived from raw counters, as unrounded percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub registration_rate: f64,
    pub conversion_rate: f64,
    pub message_rate: f64,
    pub account_creation_rate: f64,
    pub credit_card_conversion_rate: f64,
    /// Registrations per credit card. A plain ratio, not a percentage.
    pub registration_to_credit_card_ratio: f64,
}

impl DerivedMetrics {
    /// Two-decimal copy for presentation.
    pub fn rounded(&self) -> Self {
        Self {
            registration_rate: round2(self.registration_rate),
            conversion_rate: round2(self.conversion_rate),
            message_rate: round2(self.message_rate),
            account_creation_rate: round2(self.account_creation_rate),
            credit_card_conversion_rate: round2(self.credit_card_conversion_rate),
            registration_to_credit_card_ratio: round2(self.registration_to_credit_card_ratio),
        }
    }
}

/// Convert raw counters into named rates.
pub fn derive_rates(raw: &RawCounters) -> DerivedMetrics {
    DerivedMetrics {
        registration_rate: safe_pct(raw.registrations, raw.sessions),
        conversion_rate: safe_pct(raw.converted_users, raw.registrations),
        message_rate: safe_pct(raw.messages, raw.sessions),
        account_creation_rate: safe_pct(raw.total_accounts, raw.sessions),
        credit_card_conversion_rate: safe_pct(raw.credit_cards, raw.registrations),
        registration_to_credit_card_ratio: safe_div(
            raw.registrations as f64,
            raw.credit_cards as f64,
        ),
    }
}

/// Spend efficiency metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    pub cost_per_session: f64,
    pub cost_per_registration: f64,
    pub cost_per_conversion: f64,
}

pub fn derive_cost_metrics(cost: f64, raw: &RawCounters) -> CostMetrics {
    CostMetrics {
        cost_per_session: safe_div(cost, raw.sessions as f64),
        cost_per_registration: safe_div(cost, raw.registrations as f64),
        cost_per_conversion: safe_div(cost, raw.converted_users as f64),
    }
}

/// Raw sums plus everything derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub raw: RawCounters,
    pub cost: f64,
    pub rates: DerivedMetrics,
    pub cost_metrics: CostMetrics,
}

impl AggregatedMetrics {
    pub fn new(raw: RawCounters, cost: f64) -> Self {
        Self {
            raw,
            cost,
            rates: derive_rates(&raw),
            cost_metrics: derive_cost_metrics(cost, &raw),
        }
    }

    /// Sum raw counters and cost, then re-derive. Rates are never averaged.
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a AggregatedMetrics>) -> Self {
        let (raw, cost) = parts
            .into_iter()
            .fold((RawCounters::default(), 0.0), |(raw, cost), m| {
                (raw + m.raw, cost + m.cost)
            });
        Self::new(raw, cost)
    }
}
