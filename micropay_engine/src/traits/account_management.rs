use crate::{
    db_types::{Account, AccountId, NewAccount, NewWallet, Wallet},
    traits::StorageError,
};

/// The `AccountManagement` trait defines behaviour for managing accounts and their custodial wallets.
///
/// Account creation is split in two. [`AccountManagement::begin_account`] stores the account in a provisioning state,
/// where it reserves the email address but is invisible to every lookup, and hands back a [`PendingAccount`]. The
/// caller then either activates the account together with its wallet, or discards it. No storage lock is held in
/// between, so the wallet provider call does not block other writers.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    type Pending: PendingAccount;

    async fn fetch_account(&self, account_id: &AccountId) -> Result<Option<Account>, StorageError>;

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError>;

    async fn fetch_wallet_for_account(&self, account_id: &AccountId) -> Result<Option<Wallet>, StorageError>;

    /// Inserts a new provisioning account with a freshly generated id.
    ///
    /// Returns [`StorageError::AlreadyExists`] if the email address is already registered, or is held by another
    /// signup that is still in progress.
    async fn begin_account(&self, account: NewAccount) -> Result<Self::Pending, StorageError>;
}

/// An account that has been stored but not yet activated.
///
/// Dropping a `PendingAccount` without finishing it leaves the row invisible. Backends clean such rows up when the
/// same email address signs up again.
#[allow(async_fn_in_trait)]
pub trait PendingAccount {
    fn account(&self) -> &Account;

    /// Stores the wallet row and activates the account in the same transaction.
    async fn commit_with_wallet(self, wallet: NewWallet) -> Result<(Account, Wallet), StorageError>;

    /// Deletes the provisioning account.
    async fn discard(self) -> Result<(), StorageError>;
}
