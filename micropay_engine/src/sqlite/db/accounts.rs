use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Account, AccountId, NewAccount};

/// Inserts a new account with a freshly generated id. The email address is normalised to lower case.
///
/// The row starts out `PROVISIONING` and none of the fetch functions here will return it until
/// [`activate_account`] has been called. A duplicate email surfaces as a unique-constraint violation.
pub async fn insert_account(account: NewAccount, conn: &mut SqliteConnection) -> Result<Account, sqlx::Error> {
    let id = AccountId::new_random();
    let account: Account = sqlx::query_as(
        r#"
            INSERT INTO accounts (id, email, first_name, last_name, status, created_at)
            VALUES ($1, $2, $3, $4, 'PROVISIONING', $5)
            RETURNING *;
        "#,
    )
    .bind(&id)
    .bind(normalize_email(&account.email))
    .bind(account.first_name.trim())
    .bind(account.last_name.trim())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Account [{}] inserted for {}", account.id, account.email);
    Ok(account)
}

/// Moves a `PROVISIONING` account to `ACTIVE`. Returns `None` if there is no such provisioning account.
pub async fn activate_account(id: &AccountId, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as(
        "UPDATE accounts SET status = 'ACTIVE' WHERE id = $1 AND status = 'PROVISIONING' RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(account)
}

/// Deletes an account that never finished provisioning. Active accounts are left alone.
pub async fn delete_provisioning_account(id: &AccountId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND status = 'PROVISIONING'")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes a `PROVISIONING` row for `email` that was created before `cutoff`. Such a row was abandoned part way
/// through a signup and would otherwise hold on to the address forever.
pub async fn delete_abandoned_account(
    email: &str,
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE email = $1 AND status = 'PROVISIONING' AND created_at < $2")
        .bind(normalize_email(email))
        .bind(cutoff)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_account(id: &AccountId, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE id = $1 AND status = 'ACTIVE'")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub async fn fetch_account_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE email = $1 AND status = 'ACTIVE'")
        .bind(normalize_email(email))
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
