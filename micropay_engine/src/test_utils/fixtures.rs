use crate::{
    db_types::{Account, NewAccount, NewWallet},
    sqlite::db::accounts,
    traits::{AccountManagement, PendingAccount},
    SqliteDatabase,
};

pub fn test_wallet(n: u32) -> NewWallet {
    NewWallet {
        external_id: format!("fixture-wallet-{n}"),
        address: format!("0x{n:040x}"),
        blockchain: "ARC-TESTNET".to_string(),
        account_type: "SCA".to_string(),
        state: "LIVE".to_string(),
    }
}

/// Stores an account together with a wallet, bypassing the wallet provider.
pub async fn seed_account(db: &SqliteDatabase, email: &str, wallet_no: u32) -> Account {
    let pending = db.begin_account(NewAccount::new(email, "Test", "User")).await.expect("Error creating account");
    let (account, _) = pending.commit_with_wallet(test_wallet(wallet_no)).await.expect("Error committing account");
    account
}

/// Stores an account that has no wallet. This state is only reachable through manual database edits.
pub async fn seed_account_without_wallet(db: &SqliteDatabase, email: &str) -> Account {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let account = accounts::insert_account(NewAccount::new(email, "Walletless", "User"), &mut conn)
        .await
        .expect("Error creating account");
    accounts::activate_account(&account.id, &mut conn)
        .await
        .expect("Error activating account")
        .expect("Account was not in the provisioning state")
}
