//! Defines the core data models and database queries for assets and
//! liabilities.
//!
//! Values are stored as non-negative magnitudes for every asset type,
//! including debts and receivables. The create and update functions reject
//! negative values, and [summarize_assets] is the only place where debt rows
//! are negated. This keeps the sign convention in one place so aggregation
//! cannot double-count.

use std::collections::HashMap;
use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    transaction::{Transaction, TransactionType, core::insert_transaction},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The kind of asset or liability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// An everyday bank account used for spending.
    SpendingAccount,
    /// Physical cash or a cash-like balance.
    Cash,
    /// Stocks, funds and other investments.
    Investment,
    /// A cryptocurrency holding tracked by quantity and unit price.
    Crypto,
    /// Real estate or another large physical asset.
    Property,
    /// Money the user owes someone else.
    Debt,
    /// Money someone else owes the user.
    Receivable,
    /// Anything that does not fit the other types.
    Other,
}

/// Display order for per-type summaries.
pub const ASSET_TYPES: [AssetType; 8] = [
    AssetType::SpendingAccount,
    AssetType::Cash,
    AssetType::Investment,
    AssetType::Crypto,
    AssetType::Property,
    AssetType::Debt,
    AssetType::Receivable,
    AssetType::Other,
];

impl AssetType {
    /// The string stored in the database for this asset type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::SpendingAccount => "spending_account",
            AssetType::Cash => "cash",
            AssetType::Investment => "investment",
            AssetType::Crypto => "crypto",
            AssetType::Property => "property",
            AssetType::Debt => "debt",
            AssetType::Receivable => "receivable",
            AssetType::Other => "other",
        }
    }

    /// Parse an asset type from its database string.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `value` is not a known asset type.
    pub fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "spending_account" => Ok(AssetType::SpendingAccount),
            "cash" => Ok(AssetType::Cash),
            "investment" => Ok(AssetType::Investment),
            "crypto" => Ok(AssetType::Crypto),
            "property" => Ok(AssetType::Property),
            "debt" => Ok(AssetType::Debt),
            "receivable" => Ok(AssetType::Receivable),
            "other" => Ok(AssetType::Other),
            _ => Err(Error::NotFound),
        }
    }

    /// Whether assets of this type count against net worth.
    pub fn is_debt(&self) -> bool {
        matches!(self, AssetType::Debt)
    }

    /// Whether assets of this type can be settled with a payment.
    pub fn is_settleable(&self) -> bool {
        matches!(self, AssetType::Debt | AssetType::Receivable)
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AssetType::SpendingAccount => "Spending Account",
            AssetType::Cash => "Cash",
            AssetType::Investment => "Investment",
            AssetType::Crypto => "Crypto",
            AssetType::Property => "Property",
            AssetType::Debt => "Debt",
            AssetType::Receivable => "Receivable",
            AssetType::Other => "Other",
        };

        write!(f, "{label}")
    }
}

/// An asset or liability owned by a user.
///
/// To create a new `Asset`, use [Asset::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// The ID of the asset.
    pub id: DatabaseId,
    /// The ID of the user who owns the asset.
    pub user_id: UserID,
    /// A short name, e.g. 'Checking account'.
    pub name: String,
    /// The kind of asset or liability.
    pub asset_type: AssetType,
    /// The current value as a non-negative magnitude.
    pub value: f64,
    /// The currency the value is denominated in, e.g. 'USD'.
    pub currency: String,
    /// An optional longer description.
    pub description: Option<String>,
    /// The number of units held, for crypto and investment holdings.
    pub quantity: Option<f64>,
    /// The unit price paid when the holding was bought.
    pub buy_price: Option<f64>,
    /// The most recently fetched unit price.
    pub current_price: Option<f64>,
    /// The price API identifier for crypto holdings, e.g. 'bitcoin'.
    pub coin_id: Option<String>,
}

impl Asset {
    /// Create a new asset.
    ///
    /// Shortcut for [AssetBuilder] for discoverability.
    pub fn build(name: &str, asset_type: AssetType, value: f64) -> AssetBuilder {
        AssetBuilder {
            name: name.to_owned(),
            asset_type,
            value,
            currency: DEFAULT_CURRENCY.to_owned(),
            description: None,
            quantity: None,
            buy_price: None,
            current_price: None,
            coin_id: None,
        }
    }
}

/// The currency assumed when the user does not pick one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A builder for creating [Asset] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct AssetBuilder {
    /// A short name for the asset.
    pub name: String,
    /// The kind of asset or liability.
    pub asset_type: AssetType,
    /// The value as a non-negative magnitude, including for debts.
    pub value: f64,
    /// The currency the value is denominated in.
    pub currency: String,
    /// An optional longer description.
    pub description: Option<String>,
    /// The number of units held.
    pub quantity: Option<f64>,
    /// The unit price paid when the holding was bought.
    pub buy_price: Option<f64>,
    /// The most recently fetched unit price.
    pub current_price: Option<f64>,
    /// The price API identifier for crypto holdings.
    pub coin_id: Option<String>,
}

impl AssetBuilder {
    /// Set the currency for the asset.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_owned();
        self
    }

    /// Set the description for the asset.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the holding quantity for the asset.
    pub fn quantity(mut self, quantity: Option<f64>) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the unit buy price for the asset.
    pub fn buy_price(mut self, buy_price: Option<f64>) -> Self {
        self.buy_price = buy_price;
        self
    }

    /// Set the current unit price for the asset.
    pub fn current_price(mut self, current_price: Option<f64>) -> Self {
        self.current_price = current_price;
        self
    }

    /// Set the price API coin ID for the asset.
    pub fn coin_id(mut self, coin_id: Option<String>) -> Self {
        self.coin_id = coin_id;
        self
    }
}

/// The per-type subtotals and signed total for a set of assets.
#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthSummary {
    /// Total asset value minus total debt value.
    pub net_worth: f64,
    /// The subtotal of stored (non-negative) values for each type that has
    /// at least one row.
    pub by_type: HashMap<AssetType, f64>,
}

/// Sum a set of assets into a signed net worth and per-type subtotals.
///
/// Debt rows subtract from the total, every other type adds. The subtotals
/// keep the stored magnitudes so callers can decide how to display debts.
pub fn summarize_assets(assets: &[Asset]) -> NetWorthSummary {
    let mut net_worth = 0.0;
    let mut by_type: HashMap<AssetType, f64> = HashMap::new();

    for asset in assets {
        if asset.asset_type.is_debt() {
            net_worth -= asset.value;
        } else {
            net_worth += asset.value;
        }

        *by_type.entry(asset.asset_type).or_insert(0.0) += asset.value;
    }

    NetWorthSummary { net_worth, by_type }
}

/// How a settlement payment is calculated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettlementPayment {
    /// Pay off the entire remaining balance.
    Full,
    /// Pay a fixed amount towards the balance.
    Partial(f64),
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the asset table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_asset_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS asset (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                asset_type TEXT NOT NULL,
                value REAL NOT NULL,
                currency TEXT NOT NULL,
                description TEXT,
                quantity REAL,
                buy_price REAL,
                current_price REAL,
                coin_id TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

const ASSET_COLUMNS: &str =
    "id, user_id, name, asset_type, value, currency, description, quantity, \
     buy_price, current_price, coin_id";

/// Create a new asset in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeValue] if the builder's value is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_asset(
    builder: AssetBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Asset, Error> {
    if builder.value < 0.0 {
        return Err(Error::NegativeValue(builder.value));
    }

    connection.execute(
        "INSERT INTO asset (user_id, name, asset_type, value, currency, description,
             quantity, buy_price, current_price, coin_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            user_id.as_i64(),
            &builder.name,
            builder.asset_type.as_str(),
            builder.value,
            &builder.currency,
            &builder.description,
            builder.quantity,
            builder.buy_price,
            builder.current_price,
            &builder.coin_id,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Asset {
        id,
        user_id,
        name: builder.name,
        asset_type: builder.asset_type,
        value: builder.value,
        currency: builder.currency,
        description: builder.description,
        quantity: builder.quantity,
        buy_price: builder.buy_price,
        current_price: builder.current_price,
        coin_id: builder.coin_id,
    })
}

/// Retrieve the asset with `asset_id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `asset_id` does not refer to an asset owned by the
///   user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_asset(
    asset_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Asset, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &asset_id), (":user_id", &user_id.as_i64())],
            map_asset_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's assets ordered by value, largest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_assets(user_id: UserID, connection: &Connection) -> Result<Vec<Asset>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset WHERE user_id = :user_id ORDER BY value DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_asset_row)?
        .map(|maybe_asset| maybe_asset.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's assets of a single type ordered by value, largest
/// first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_assets_by_type(
    asset_type: AssetType,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Asset>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset
             WHERE user_id = ?1 AND asset_type = ?2
             ORDER BY value DESC"
        ))?
        .query_map((user_id.as_i64(), asset_type.as_str()), map_asset_row)?
        .map(|maybe_asset| maybe_asset.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the asset with `asset_id` using the builder's fields.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeValue] if the builder's value is negative,
/// - [Error::UpdateMissingAsset] if `asset_id` does not refer to an asset
///   owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_asset(
    asset_id: DatabaseId,
    builder: AssetBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Asset, Error> {
    if builder.value < 0.0 {
        return Err(Error::NegativeValue(builder.value));
    }

    let rows_affected = connection.execute(
        "UPDATE asset SET name = ?1, asset_type = ?2, value = ?3, currency = ?4,
             description = ?5, quantity = ?6, buy_price = ?7, current_price = ?8,
             coin_id = ?9, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?10 AND user_id = ?11",
        (
            &builder.name,
            builder.asset_type.as_str(),
            builder.value,
            &builder.currency,
            &builder.description,
            builder.quantity,
            builder.buy_price,
            builder.current_price,
            &builder.coin_id,
            asset_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAsset);
    }

    Ok(Asset {
        id: asset_id,
        user_id,
        name: builder.name,
        asset_type: builder.asset_type,
        value: builder.value,
        currency: builder.currency,
        description: builder.description,
        quantity: builder.quantity,
        buy_price: builder.buy_price,
        current_price: builder.current_price,
        coin_id: builder.coin_id,
    })
}

/// Delete the asset with `asset_id` belonging to `user_id`.
///
/// Transactions that referenced the asset keep their rows, their asset
/// reference is set to null by the foreign key on the transaction table.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingAsset] if `asset_id` does not refer to an asset
///   owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_asset(
    asset_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM asset WHERE id = ?1 AND user_id = ?2",
        (asset_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAsset);
    }

    Ok(())
}

/// Add `delta` to the stored value of the asset with `asset_id`.
///
/// Used to mirror income and expense transactions onto their linked asset.
/// The caller is expected to run this inside the same SQL transaction as the
/// ledger write it mirrors.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingAsset] if `asset_id` does not refer to an asset
///   owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn adjust_asset_value(
    asset_id: DatabaseId,
    delta: f64,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE asset SET value = value + ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2 AND user_id = ?3",
        (delta, asset_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAsset);
    }

    Ok(())
}

/// Settle part or all of a debt or receivable.
///
/// The balance update and the ledger transaction recording the cash movement
/// happen in a single SQL transaction, so a failure anywhere rolls back both
/// writes.
///
/// A full settlement writes a balance of exactly zero. A partial payment
/// larger than the remaining balance pays off the whole balance, the stored
/// value never goes below zero.
///
/// Settling a debt records an expense, settling a receivable records income.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `asset_id` does not refer to an asset owned by the
///   user,
/// - [Error::NotSettleable] if the asset is neither a debt nor a receivable,
/// - [Error::InvalidPaymentAmount] if a partial payment is zero or negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn settle_asset(
    asset_id: DatabaseId,
    payment: SettlementPayment,
    today: Date,
    user_id: UserID,
    connection: &Connection,
) -> Result<Asset, Error> {
    let sql_transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    let asset = get_asset(asset_id, user_id, &sql_transaction)?;

    if !asset.asset_type.is_settleable() {
        return Err(Error::NotSettleable);
    }

    let pay = match payment {
        SettlementPayment::Full => asset.value,
        SettlementPayment::Partial(amount) if amount <= 0.0 => {
            return Err(Error::InvalidPaymentAmount(amount));
        }
        SettlementPayment::Partial(amount) => amount,
    };

    let new_value = match payment {
        SettlementPayment::Full => 0.0,
        SettlementPayment::Partial(_) => (asset.value - pay).max(0.0),
    };

    sql_transaction.execute(
        "UPDATE asset SET value = ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2 AND user_id = ?3",
        (new_value, asset_id, user_id.as_i64()),
    )?;

    let transaction_type = match asset.asset_type {
        AssetType::Debt => TransactionType::Expense,
        _ => TransactionType::Income,
    };

    let description = match payment {
        SettlementPayment::Full => format!("Paid off '{}'", asset.name),
        SettlementPayment::Partial(_) => format!("Payment towards '{}'", asset.name),
    };

    insert_transaction(
        Transaction::build(pay, transaction_type, today)
            .description(Some(description))
            .asset_id(Some(asset_id)),
        user_id,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Asset {
        value: new_value,
        ..asset
    })
}

/// Map a database row to an Asset.
pub fn map_asset_row(row: &Row) -> Result<Asset, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let name = row.get(2)?;
    let raw_type: String = row.get(3)?;
    let value = row.get(4)?;
    let currency = row.get(5)?;
    let description = row.get(6)?;
    let quantity = row.get(7)?;
    let buy_price = row.get(8)?;
    let current_price = row.get(9)?;
    let coin_id = row.get(10)?;

    let asset_type = AssetType::from_str(&raw_type).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown asset type {raw_type:?}").into(),
        )
    })?;

    Ok(Asset {
        id,
        user_id: UserID::new(raw_user_id),
        name,
        asset_type,
        value,
        currency,
        description,
        quantity,
        buy_price,
        current_price,
        coin_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod summarize_tests {
    use crate::{
        asset::{Asset, AssetType, summarize_assets},
        user::UserID,
    };

    fn asset(asset_type: AssetType, value: f64) -> Asset {
        Asset {
            id: 1,
            user_id: UserID::new(1),
            name: "Test".to_owned(),
            asset_type,
            value,
            currency: "USD".to_owned(),
            description: None,
            quantity: None,
            buy_price: None,
            current_price: None,
            coin_id: None,
        }
    }

    #[test]
    fn empty_list_sums_to_zero() {
        let summary = summarize_assets(&[]);

        assert_eq!(summary.net_worth, 0.0);
        assert!(summary.by_type.is_empty());
    }

    #[test]
    fn debts_subtract_and_everything_else_adds() {
        let assets = [
            asset(AssetType::SpendingAccount, 1000.0),
            asset(AssetType::Crypto, 250.0),
            asset(AssetType::Debt, 300.0),
            asset(AssetType::Receivable, 50.0),
        ];

        let summary = summarize_assets(&assets);

        assert_eq!(summary.net_worth, 1000.0 + 250.0 - 300.0 + 50.0);
    }

    #[test]
    fn non_debt_total_minus_debt_total_equals_net_worth() {
        let assets = [
            asset(AssetType::Cash, 12.34),
            asset(AssetType::Investment, 567.89),
            asset(AssetType::Debt, 111.11),
            asset(AssetType::Debt, 222.22),
            asset(AssetType::Property, 100_000.0),
        ];

        let summary = summarize_assets(&assets);

        let non_debt: f64 = assets
            .iter()
            .filter(|asset| !asset.asset_type.is_debt())
            .map(|asset| asset.value)
            .sum();
        let debt: f64 = assets
            .iter()
            .filter(|asset| asset.asset_type.is_debt())
            .map(|asset| asset.value)
            .sum();

        assert_eq!(summary.net_worth, non_debt - debt);
    }

    #[test]
    fn subtotals_keep_stored_magnitudes() {
        let assets = [
            asset(AssetType::Debt, 300.0),
            asset(AssetType::Debt, 200.0),
        ];

        let summary = summarize_assets(&assets);

        assert_eq!(summary.by_type[&AssetType::Debt], 500.0);
        assert_eq!(summary.net_worth, -500.0);
    }
}
