use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Account, NewAccount, Wallet},
    events::{AccountCreatedEvent, EventProducers},
    mpe_api::errors::ProvisioningError,
    traits::{AccountManagement, PendingAccount, StorageError, WalletProvider},
};

/// `ProvisioningApi` creates an account together with its custodial wallet. Either both exist afterwards, or
/// neither does.
///
/// The account is stored in a provisioning state that no lookup can see, the wallet provider is called with the new
/// account id as its idempotency key, and the account is only activated once the wallet exists.
pub struct ProvisioningApi<B, W> {
    db: B,
    wallets: W,
    producers: EventProducers,
}

impl<B, W> Debug for ProvisioningApi<B, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProvisioningApi")
    }
}

impl<B, W> ProvisioningApi<B, W> {
    pub fn new(db: B, wallets: W, producers: EventProducers) -> Self {
        Self { db, wallets, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, W> ProvisioningApi<B, W>
where
    B: AccountManagement,
    W: WalletProvider,
{
    pub async fn create_account(&self, account: NewAccount) -> Result<(Account, Wallet), ProvisioningError> {
        validate_new_account(&account)?;
        let email = account.email.trim().to_ascii_lowercase();
        if self.db.fetch_account_by_email(&email).await?.is_some() {
            debug!("👤️ Account for {email} already exists");
            return Err(ProvisioningError::Conflict(email));
        }
        let label = account.wallet_label();
        let pending = self.db.begin_account(account).await.map_err(|e| match e {
            StorageError::AlreadyExists(_) => ProvisioningError::Conflict(email.clone()),
            e => ProvisioningError::Storage(e),
        })?;
        let key = pending.account().id.to_string();
        let wallet = match self.wallets.create_wallet(&key, &label).await {
            Ok(wallet) => wallet,
            Err(e) => {
                error!("👤️ Wallet creation for account [{key}] failed. Rolling back the account. {e}");
                if let Err(rollback_err) = pending.discard().await {
                    error!("👤️ Explicit rollback of account [{key}] failed. {rollback_err}");
                }
                return Err(e.into());
            },
        };
        let (account, wallet) = pending.commit_with_wallet(wallet).await?;
        info!("👤️ Account [{}] created for {} with wallet {}", account.id, account.email, wallet.address);
        self.call_account_created_hook(&account, &wallet).await;
        Ok((account, wallet))
    }

    async fn call_account_created_hook(&self, account: &Account, wallet: &Wallet) {
        for emitter in &self.producers.account_created_producer {
            debug!("👤️ Notifying account created hook subscribers");
            emitter.publish_event(AccountCreatedEvent::new(account.clone(), wallet.clone())).await;
        }
    }
}

fn validate_new_account(account: &NewAccount) -> Result<(), ProvisioningError> {
    let email = account.email.trim();
    let valid_email = match email.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid_email {
        return Err(ProvisioningError::Validation(format!("'{email}' is not a valid email address")));
    }
    if account.first_name.trim().is_empty() || account.last_name.trim().is_empty() {
        return Err(ProvisioningError::Validation("First and last names are required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn account_validation() {
        assert!(validate_new_account(&NewAccount::new("ada@example.com", "Ada", "Lovelace")).is_ok());
        assert!(validate_new_account(&NewAccount::new("ada.example.com", "Ada", "Lovelace")).is_err());
        assert!(validate_new_account(&NewAccount::new("@example.com", "Ada", "Lovelace")).is_err());
        assert!(validate_new_account(&NewAccount::new("ada@localhost", "Ada", "Lovelace")).is_err());
        assert!(validate_new_account(&NewAccount::new("ada@example.com", " ", "Lovelace")).is_err());
    }
}
