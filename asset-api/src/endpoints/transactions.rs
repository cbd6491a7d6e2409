use super::{AccountId, Decimal, TransactionId, TransactionType};
use crate::macros::setter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{EmptyResponse, Method, Request, RequestData};

pub const DEFAULT_LIMIT: u32 = 100;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub is_recurring: bool,
    pub created_at: NaiveDateTime,
}


// Requests

/// Query filters for the transaction list; the backend returns newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub limit: u32,
}

impl Default for TransactionFilters {
    fn default() -> Self {
        Self {
            account_id: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TransactionFilters {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt account_id: AccountId);
    setter!(opt start_date: NaiveDate);
    setter!(opt end_date: NaiveDate);

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListTransactions {
    filters: TransactionFilters,
}

impl ListTransactions {
    pub fn new(filters: TransactionFilters) -> Self {
        Self { filters }
    }
}

impl Request for ListTransactions {
    type Data = TransactionFilters;
    type Response = Vec<Transaction>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/transactions/".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(&self.filters)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub is_recurring: bool,
}

impl NewTransaction {
    pub fn new<T>(
        account_id: AccountId,
        transaction_type: TransactionType,
        category: impl Into<String>,
        amount: T,
        transaction_date: NaiveDate,
    ) -> Self
    where
        T: Into<Decimal>,
    {
        Self {
            account_id,
            transaction_type,
            category: category.into(),
            amount: amount.into(),
            description: None,
            transaction_date,
            is_recurring: false,
        }
    }

    setter!(opt description: String);

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTransaction {
    transaction: NewTransaction,
}

impl CreateTransaction {
    pub fn new(transaction: NewTransaction) -> Self {
        Self { transaction }
    }
}

impl Request for CreateTransaction {
    type Data = NewTransaction;
    type Response = Transaction;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/transactions/".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.transaction)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt category: String);
    setter!(opt amount: Decimal);
    setter!(opt description: String);
    setter!(opt transaction_date: NaiveDate);
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTransaction {
    #[serde(skip)]
    transaction_id: TransactionId,
    patch: TransactionPatch,
}

impl UpdateTransaction {
    pub fn new(transaction_id: TransactionId, patch: TransactionPatch) -> Self {
        Self {
            transaction_id,
            patch,
        }
    }
}

impl Request for UpdateTransaction {
    type Data = TransactionPatch;
    type Response = Transaction;
    const METHOD: Method = Method::PATCH;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/transactions/{}", self.transaction_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.patch)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteTransaction {
    transaction_id: TransactionId,
}

impl DeleteTransaction {
    pub fn new(transaction_id: TransactionId) -> Self {
        Self { transaction_id }
    }
}

impl Request for DeleteTransaction {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/transactions/{}", self.transaction_id).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_default_to_backend_limit() {
        let filters = TransactionFilters::new();
        assert_eq!(serde_json::to_string(&filters).unwrap(), r#"{"limit":100}"#);
    }

    #[test]
    fn filters_include_account_when_set() {
        let filters = TransactionFilters::new()
            .account_id(AccountId::new(4))
            .limit(20);
        assert_eq!(
            serde_json::to_string(&filters).unwrap(),
            r#"{"account_id":4,"limit":20}"#
        );
    }
}
