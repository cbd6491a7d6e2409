pub mod accounts;
pub mod recurring;
pub mod summary;
pub mod transactions;

use crate::macros::id_type;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub use rust_decimal::Decimal;

id_type!(
    /// Server-assigned account identity
    AccountId
);
id_type!(
    /// Server-assigned transaction identity
    TransactionId
);
id_type!(
    /// Server-assigned recurring transaction identity
    RecurringId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
    Cma,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => f.write_str("Checking"),
            Self::Savings => f.write_str("Savings"),
            Self::Investment => f.write_str("Investment"),
            Self::Cma => f.write_str("CMA"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => f.write_str("Income"),
            Self::Expense => f.write_str("Expense"),
            Self::Transfer => f.write_str("Transfer"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => f.write_str("Daily"),
            Self::Weekly => f.write_str("Weekly"),
            Self::Monthly => f.write_str("Monthly"),
            Self::Yearly => f.write_str("Yearly"),
        }
    }
}
