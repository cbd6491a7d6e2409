/// Which store a mutation happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Accounts,
    Transactions,
    Recurring,
    Summary,
}

impl StoreKind {
    /// Human-readable collection name used in error messages and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Transactions => "transactions",
            Self::Recurring => "recurring transactions",
            Self::Summary => "summary",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
    Deactivated,
}

/// Published by a store after a mutation succeeded on the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub source: StoreKind,
    pub kind: MutationKind,
    pub id: i64,
}

impl MutationEvent {
    pub fn new(source: StoreKind, kind: MutationKind, id: impl Into<i64>) -> Self {
        Self {
            source,
            kind,
            id: id.into(),
        }
    }

    /// Whether the mutation can move the server-computed totals.
    ///
    /// Account balances, transactions and recurring schedules all feed the
    /// summary; the summary itself is never a mutation source.
    pub fn affects_totals(&self) -> bool {
        match self.source {
            StoreKind::Accounts | StoreKind::Transactions | StoreKind::Recurring => true,
            StoreKind::Summary => false,
        }
    }
}
