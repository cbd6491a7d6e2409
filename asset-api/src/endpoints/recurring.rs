use super::{AccountId, Decimal, Frequency, RecurringId, TransactionType};
use crate::macros::setter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{EmptyResponse, Method, Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: RecurringId,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub day_of_month: Option<u8>,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Requests

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecurringFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

impl RecurringFilters {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt account_id: AccountId);
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListRecurring {
    filters: RecurringFilters,
}

impl ListRecurring {
    pub fn new(filters: RecurringFilters) -> Self {
        Self { filters }
    }
}

impl Request for ListRecurring {
    type Data = RecurringFilters;
    type Response = Vec<RecurringTransaction>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/recurring/".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        if self.filters.account_id.is_some() {
            RequestData::Query(&self.filters)
        } else {
            RequestData::Empty
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecurring {
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl NewRecurring {
    pub fn new<T>(
        account_id: AccountId,
        transaction_type: TransactionType,
        category: impl Into<String>,
        amount: T,
        frequency: Frequency,
        start_date: NaiveDate,
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
            frequency,
            day_of_month: None,
            start_date,
            end_date: None,
            is_active: true,
        }
    }

    setter!(opt description: String);
    setter!(opt day_of_month: u8);
    setter!(opt end_date: NaiveDate);
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecurring {
    recurring: NewRecurring,
}

impl CreateRecurring {
    pub fn new(recurring: NewRecurring) -> Self {
        Self { recurring }
    }
}

impl Request for CreateRecurring {
    type Data = NewRecurring;
    type Response = RecurringTransaction;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/recurring/".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.recurring)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl RecurringPatch {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt amount: Decimal);
    setter!(opt is_active: bool);
    setter!(opt end_date: NaiveDate);
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecurring {
    #[serde(skip)]
    recurring_id: RecurringId,
    patch: RecurringPatch,
}

impl UpdateRecurring {
    pub fn new(recurring_id: RecurringId, patch: RecurringPatch) -> Self {
        Self {
            recurring_id,
            patch,
        }
    }
}

impl Request for UpdateRecurring {
    type Data = RecurringPatch;
    type Response = RecurringTransaction;
    const METHOD: Method = Method::PATCH;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/recurring/{}", self.recurring_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.patch)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeactivateRecurring {
    recurring_id: RecurringId,
}

impl DeactivateRecurring {
    pub fn new(recurring_id: RecurringId) -> Self {
        Self { recurring_id }
    }
}

impl Request for DeactivateRecurring {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/recurring/{}/deactivate", self.recurring_id).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecurring {
    recurring_id: RecurringId,
}

impl DeleteRecurring {
    pub fn new(recurring_id: RecurringId) -> Self {
        Self { recurring_id }
    }
}

impl Request for DeleteRecurring {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/recurring/{}", self.recurring_id).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_recurring_starts_active() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        let new = NewRecurring::new(
            AccountId::new(1),
            TransactionType::Income,
            "Salary",
            3_000_000,
            Frequency::Monthly,
            date,
        )
        .day_of_month(25u8);
        assert!(new.is_active);
        assert_eq!(new.day_of_month, Some(25));
    }

    #[test]
    fn deactivate_posts_to_action_path() {
        let req = DeactivateRecurring::new(RecurringId::new(5));
        assert_eq!(req.endpoint(), "/recurring/5/deactivate");
    }
}
