//! Wallet ledger business logic - the single source of truth for spendable balance.
//!
//! Every balance change goes through `apply_entry`, which performs an atomic
//! `UPDATE wallets SET balance = balance + delta` (optionally guarded by a floor)
//! and appends a ledger entry in the same database transaction. Concurrent
//! mutations of one wallet are therefore serialized by the database, while
//! different wallets never contend.
//!
//! Debit policy: [`debit`] refuses to take a wallet below zero and reports
//! [`Error::InsufficientFunds`]. Session charges use [`debit_with_floor`] so the
//! meter can apply the configured overdraft allowance instead.

use crate::{
    core::money::Money,
    entities::{EntryKind, LedgerEntry, Wallet, ledger_entry, wallet},
    errors::{Error, Result, is_unique_violation},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Opens a wallet for `owner_id`, crediting the signup bonus.
///
/// Opening is idempotent: if the owner already has a wallet it is returned
/// unchanged and no second bonus is paid.
#[instrument(skip(db))]
pub async fn open_wallet(
    db: &DatabaseConnection,
    owner_id: &str,
    signup_bonus: Money,
) -> Result<wallet::Model> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(Error::Validation {
            message: "Wallet owner id cannot be empty".to_string(),
        });
    }
    if signup_bonus.is_negative() {
        return Err(Error::InvalidAmount {
            amount: signup_bonus,
        });
    }

    if let Some(existing) = find_wallet(db, owner_id).await? {
        debug!("Wallet for {} already exists", owner_id);
        return Ok(existing);
    }

    insert_wallet(db, owner_id, signup_bonus).await
}

/// Inserts a new wallet and its signup bonus. Losing an insert race to another
/// open for the same owner returns the winner's wallet.
async fn insert_wallet(
    db: &DatabaseConnection,
    owner_id: &str,
    signup_bonus: Money,
) -> Result<wallet::Model> {
    let txn = db.begin().await?;

    let now = Utc::now();
    let inserted = wallet::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        balance: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await;
    let created = match inserted {
        Ok(created) => created,
        Err(e) if is_unique_violation(&e) => {
            txn.rollback().await?;
            debug!("Wallet for {} was opened concurrently", owner_id);
            return require_wallet(db, owner_id).await;
        }
        Err(e) => return Err(e.into()),
    };

    if signup_bonus.is_positive() {
        apply_entry(
            &txn,
            created.id,
            signup_bonus,
            None,
            EntryKind::SignupBonus,
            "Signup bonus".to_string(),
            None,
        )
        .await?;
    }

    let opened = find_wallet_by_id(&txn, created.id).await?;
    txn.commit().await?;

    info!(
        "Opened wallet {} for {} with balance {}",
        opened.id,
        owner_id,
        opened.balance()
    );
    Ok(opened)
}

/// Finds the wallet owned by `owner_id`.
pub async fn get_wallet(db: &DatabaseConnection, owner_id: &str) -> Result<Option<wallet::Model>> {
    find_wallet(db, owner_id).await
}

/// Finds the wallet owned by `owner_id`, failing with [`Error::WalletNotFound`].
pub async fn require_wallet<C>(db: &C, owner_id: &str) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    find_wallet(db, owner_id)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            owner_id: owner_id.to_string(),
        })
}

/// Current balance of the wallet owned by `owner_id`.
pub async fn get_balance(db: &DatabaseConnection, owner_id: &str) -> Result<Money> {
    Ok(require_wallet(db, owner_id).await?.balance())
}

/// Whether the wallet balance covers `amount`.
#[must_use]
pub fn can_afford(wallet: &wallet::Model, amount: Money) -> bool {
    wallet.balance() >= amount
}

/// Credits a top-up to the wallet owned by `owner_id`.
///
/// Returns the recorded ledger entry, whose `balance_after` is the new balance.
#[instrument(skip(db))]
pub async fn credit(
    db: &DatabaseConnection,
    owner_id: &str,
    amount: Money,
    description: &str,
) -> Result<ledger_entry::Model> {
    ensure_positive(amount)?;

    let txn = db.begin().await?;
    let wallet = require_wallet(&txn, owner_id).await?;
    let entry = apply_entry(
        &txn,
        wallet.id,
        amount,
        None,
        EntryKind::TopUp,
        description.to_string(),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        "Credited {} to {}; balance now {}",
        amount,
        owner_id,
        entry.balance_after()
    );
    Ok(entry)
}

/// Debits the wallet owned by `owner_id`, refusing to go below zero.
#[instrument(skip(db))]
pub async fn debit(
    db: &DatabaseConnection,
    owner_id: &str,
    amount: Money,
    description: &str,
) -> Result<ledger_entry::Model> {
    ensure_positive(amount)?;

    let txn = db.begin().await?;
    let wallet = require_wallet(&txn, owner_id).await?;
    let entry = debit_with_floor(
        &txn,
        wallet.id,
        amount,
        Some(Money::ZERO),
        EntryKind::Debit,
        description.to_string(),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        "Debited {} from {}; balance now {}",
        amount,
        owner_id,
        entry.balance_after()
    );
    Ok(entry)
}

/// Debits a wallet, allowing the balance to fall no lower than `floor`
/// (`None` means no floor at all).
///
/// Runs on whatever connection or transaction the caller provides so the meter
/// can combine the charge with its own session update.
pub async fn debit_with_floor<C>(
    db: &C,
    wallet_id: i64,
    amount: Money,
    floor: Option<Money>,
    kind: EntryKind,
    description: String,
    session_id: Option<String>,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    ensure_positive(amount)?;
    apply_entry(db, wallet_id, -amount, floor, kind, description, session_id).await
}

/// Lists ledger entries for the wallet owned by `owner_id`, newest first.
pub async fn list_entries(
    db: &DatabaseConnection,
    owner_id: &str,
    limit: Option<u64>,
) -> Result<Vec<ledger_entry::Model>> {
    let wallet = require_wallet(db, owner_id).await?;

    let mut query = LedgerEntry::find()
        .filter(ledger_entry::Column::WalletId.eq(wallet.id))
        .order_by_desc(ledger_entry::Column::Timestamp)
        .order_by_desc(ledger_entry::Column::Id);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    query.all(db).await.map_err(Into::into)
}

/// Applies a signed balance change and records it in the ledger.
///
/// With a `floor`, the update only matches when `balance + delta >= floor`;
/// a miss is reported as [`Error::InsufficientFunds`] without touching the row.
async fn apply_entry<C>(
    db: &C,
    wallet_id: i64,
    delta: Money,
    floor: Option<Money>,
    kind: EntryKind,
    description: String,
    session_id: Option<String>,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let mut update = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(delta.minor()),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(wallet_id));
    if let Some(floor) = floor {
        update = update.filter(wallet::Column::Balance.gte((floor - delta).minor()));
    }
    let result = update.exec(db).await?;

    let current = find_wallet_by_id(db, wallet_id).await?;
    if result.rows_affected == 0 {
        return Err(Error::InsufficientFunds {
            current: current.balance(),
            required: -delta,
        });
    }

    let entry = ledger_entry::ActiveModel {
        wallet_id: Set(wallet_id),
        amount: Set(delta.minor()),
        kind: Set(kind),
        description: Set(description),
        session_id: Set(session_id),
        balance_after: Set(current.balance),
        timestamp: Set(now),
        ..Default::default()
    };

    entry.insert(db).await.map_err(Into::into)
}

async fn find_wallet<C>(db: &C, owner_id: &str) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a wallet by primary key, failing with [`Error::WalletNotFound`].
pub(crate) async fn find_wallet_by_id<C>(db: &C, wallet_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::WalletNotFound {
            owner_id: format!("wallet #{wallet_id}"),
        })
}

fn ensure_positive(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}
