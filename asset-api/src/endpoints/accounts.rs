use super::{AccountId, AccountType, Decimal};
use crate::macros::setter;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{EmptyResponse, Method, Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Decimal,
    pub institution: Option<String>,
    pub account_number: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Requests

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListAccounts;

impl Request for ListAccounts {
    type Data = ();
    type Response = Vec<Account>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/accounts/".into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            balance: Decimal::ZERO,
            institution: None,
            account_number: None,
        }
    }

    pub fn balance(mut self, balance: impl Into<Decimal>) -> Self {
        self.balance = balance.into();
        self
    }

    setter!(opt institution: String);
    setter!(opt account_number: String);
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAccount {
    account: NewAccount,
}

impl CreateAccount {
    pub fn new(account: NewAccount) -> Self {
        Self { account }
    }
}

impl Request for CreateAccount {
    type Data = NewAccount;
    type Response = Account;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/accounts/".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.account)
    }
}

/// Partial account update; absent fields are left untouched by the backend.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

impl AccountPatch {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt name: String);
    setter!(opt balance: Decimal);
    setter!(opt institution: String);
    setter!(opt account_number: String);
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateAccount {
    #[serde(skip)]
    account_id: AccountId,
    patch: AccountPatch,
}

impl UpdateAccount {
    pub fn new(account_id: AccountId, patch: AccountPatch) -> Self {
        Self { account_id, patch }
    }
}

impl Request for UpdateAccount {
    type Data = AccountPatch;
    type Response = Account;
    const METHOD: Method = Method::PATCH;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/accounts/{}", self.account_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(&self.patch)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAccount {
    account_id: AccountId,
}

impl DeleteAccount {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }
}

impl Request for DeleteAccount {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/accounts/{}", self.account_id).into()
    }
}
