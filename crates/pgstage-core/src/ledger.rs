//! Courier ledger settlement rules.
//!
//! The ledger source groups orders per courier and settlement month; these
//! rules turn the raw group totals into the payouts written to the ledger.

use crate::entity::CourierLedgerRow;

/// Share of order revenue kept as the processing fee.
pub const ORDER_PROCESSING_FEE_RATE: f64 = 0.25;

/// Share of tips paid out to the courier.
pub const TIP_PAYOUT_RATE: f64 = 0.95;

/// Commission tier selected by a courier's average rating for the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionTier {
    /// Rating below 4.0.
    Low,
    /// Rating in [4.0, 4.5).
    Standard,
    /// Rating in [4.5, 4.9).
    Good,
    /// Rating of 4.9 and above.
    Excellent,
}

impl CommissionTier {
    pub fn for_rating(rate_avg: f64) -> Self {
        if rate_avg < 4.0 {
            CommissionTier::Low
        } else if rate_avg < 4.5 {
            CommissionTier::Standard
        } else if rate_avg < 4.9 {
            CommissionTier::Good
        } else {
            CommissionTier::Excellent
        }
    }

    /// Share of the month's order revenue paid to the courier.
    pub fn rate(self) -> f64 {
        match self {
            CommissionTier::Low => 0.05,
            CommissionTier::Standard => 0.07,
            CommissionTier::Good => 0.08,
            CommissionTier::Excellent => 0.10,
        }
    }

    /// Minimum payout for the month.
    pub fn floor(self) -> f64 {
        match self {
            CommissionTier::Low => 100.0,
            CommissionTier::Standard => 150.0,
            CommissionTier::Good => 175.0,
            CommissionTier::Excellent => 200.0,
        }
    }

    pub fn payout(self, total_sum: f64) -> f64 {
        (self.rate() * total_sum).max(self.floor())
    }
}

/// Raw per-month aggregates for one courier, as produced by the ledger query.
#[derive(Debug, Clone, PartialEq)]
pub struct CourierMonth {
    pub courier_id: i64,
    pub courier_name: String,
    pub settlement_year: i32,
    pub settlement_month: i32,
    pub orders_count: i64,
    pub total_sum: f64,
    pub rate_avg: f64,
    pub tips_sum: f64,
}

impl CourierMonth {
    /// Apply the settlement rules to produce the ledger row.
    pub fn settle(self) -> CourierLedgerRow {
        let courier_order_sum = CommissionTier::for_rating(self.rate_avg).payout(self.total_sum);
        let courier_reward_sum = courier_order_sum + TIP_PAYOUT_RATE * self.tips_sum;

        CourierLedgerRow {
            courier_id: self.courier_id,
            courier_name: self.courier_name,
            settlement_year: self.settlement_year,
            settlement_month: self.settlement_month,
            orders_count: self.orders_count,
            total_sum: self.total_sum,
            rate_avg: self.rate_avg,
            order_processing_fee: ORDER_PROCESSING_FEE_RATE * self.total_sum,
            courier_order_sum,
            courier_tips_sum: self.tips_sum,
            courier_reward_sum,
        }
    }
}
