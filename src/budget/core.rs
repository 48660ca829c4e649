//! The budget domain type, its database functions and the derived spend
//! calculation.
//!
//! A budget caps spending for a category (or all spending when it has no
//! category) over a repeating period. The amount spent in the current period
//! is always derived from the transactions table at read time, it is never
//! stored.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use time::{Date, Duration, Month};

use crate::{
    Error,
    category::{CategoryType, core::get_category},
    database_id::DatabaseId,
    user::UserID,
};

/// How often a budget resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    /// The budget resets every seven days.
    Weekly,
    /// The budget resets on the same day of each month.
    Monthly,
    /// The budget resets on the same day of each year.
    Yearly,
}

impl BudgetPeriod {
    /// The string stored in the database for this period.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }

    /// Parse a period from its database representation.
    pub fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            _ => Err(Error::NotFound),
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BudgetPeriod::Weekly => "Weekly",
            BudgetPeriod::Monthly => "Monthly",
            BudgetPeriod::Yearly => "Yearly",
        };

        write!(f, "{label}")
    }
}

/// The periods in the order they are offered in forms.
pub const BUDGET_PERIODS: [BudgetPeriod; 3] = [
    BudgetPeriod::Weekly,
    BudgetPeriod::Monthly,
    BudgetPeriod::Yearly,
];

/// A spending cap over a repeating period.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The ID of the user who owns the budget.
    pub user_id: UserID,
    /// The category the budget caps, or `None` to cap all spending.
    pub category_id: Option<DatabaseId>,
    /// A short name, e.g. 'Eating out'.
    pub name: String,
    /// The spending cap per period.
    pub amount: f64,
    /// How often the budget resets.
    pub period: BudgetPeriod,
    /// The first day of the first period.
    pub start_date: Date,
    /// The last day the budget applies, or `None` for no end.
    pub end_date: Option<Date>,
}

impl Budget {
    /// Create a new budget.
    ///
    /// Shortcut for [BudgetBuilder] for discoverability.
    pub fn build(
        name: &str,
        amount: f64,
        period: BudgetPeriod,
        start_date: Date,
    ) -> BudgetBuilder {
        BudgetBuilder {
            name: name.to_owned(),
            amount,
            period,
            start_date,
            category_id: None,
            end_date: None,
        }
    }
}

/// A budget that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetBuilder {
    /// A short name for the budget.
    pub name: String,
    /// The spending cap per period, must be non-negative.
    pub amount: f64,
    /// How often the budget resets.
    pub period: BudgetPeriod,
    /// The first day of the first period.
    pub start_date: Date,
    /// The category the budget caps, or `None` to cap all spending.
    pub category_id: Option<DatabaseId>,
    /// The last day the budget applies.
    pub end_date: Option<Date>,
}

impl BudgetBuilder {
    /// Set the category the budget caps.
    pub fn category_id(mut self, category_id: Option<DatabaseId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the last day the budget applies.
    pub fn end_date(mut self, end_date: Option<Date>) -> Self {
        self.end_date = end_date;
        self
    }
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                period TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE SET NULL
            )",
        (),
    )?;

    Ok(())
}

const BUDGET_COLUMNS: &str =
    "id, user_id, category_id, name, amount, period, start_date, end_date";

fn validate_budget(
    builder: &BudgetBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    if builder.amount < 0.0 {
        return Err(Error::NegativeValue(builder.amount));
    }

    if let Some(category_id) = builder.category_id {
        let category = get_category(category_id, user_id, connection)
            .map_err(|_| Error::InvalidCategory(Some(category_id)))?;

        // Budgets cap spending, so only expense categories make sense.
        if category.category_type != CategoryType::Expense {
            return Err(Error::CategoryTypeMismatch);
        }
    }

    Ok(())
}

/// Create a budget in the database.
///
/// # Errors
/// Returns an error if the amount is negative, the category is invalid or
/// there is an SQL error.
pub fn create_budget(
    builder: BudgetBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate_budget(&builder, user_id, connection)?;

    connection.execute(
        "INSERT INTO budget (user_id, category_id, name, amount, period, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            builder.category_id,
            &builder.name,
            builder.amount,
            builder.period.as_str(),
            builder.start_date,
            builder.end_date,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Budget {
        id,
        user_id,
        category_id: builder.category_id,
        name: builder.name,
        amount: builder.amount,
        period: builder.period,
        start_date: builder.start_date,
        end_date: builder.end_date,
    })
}

/// Retrieve a budget by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to
/// another user.
pub fn get_budget(
    budget_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &budget_id), (":user_id", &user_id.as_i64())],
            map_budget_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's budgets, ordered by name.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
             WHERE user_id = :user_id
             ORDER BY name COLLATE NOCASE"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the budget with `budget_id` with the builder's values.
///
/// # Errors
/// Returns [Error::UpdateMissingBudget] if the budget does not exist or
/// belongs to another user.
pub fn update_budget(
    budget_id: DatabaseId,
    builder: BudgetBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate_budget(&builder, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE budget
         SET category_id = ?1, name = ?2, amount = ?3, period = ?4,
             start_date = ?5, end_date = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            builder.category_id,
            &builder.name,
            builder.amount,
            builder.period.as_str(),
            builder.start_date,
            builder.end_date,
            budget_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    Ok(Budget {
        id: budget_id,
        user_id,
        category_id: builder.category_id,
        name: builder.name,
        amount: builder.amount,
        period: builder.period,
        start_date: builder.start_date,
        end_date: builder.end_date,
    })
}

/// Delete the budget with `budget_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if the budget does not exist or
/// belongs to another user.
pub fn delete_budget(
    budget_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

/// Add `months` months to a date, clamping the day to the end of the month.
fn add_months(date: Date, months: i32) -> Date {
    let zero_based = date.month() as i32 - 1 + months;
    let year = date.year() + zero_based.div_euclid(12);
    let month = Month::try_from((zero_based.rem_euclid(12) + 1) as u8)
        .unwrap_or(Month::January);
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// The current period window for a budget, as an inclusive date range.
///
/// The window is the cycle containing `today`, anchored at the budget's
/// start date and clipped by its end date. Returns `None` when the budget
/// has not started yet or has already ended.
pub fn current_period_window(budget: &Budget, today: Date) -> Option<(Date, Date)> {
    if today < budget.start_date {
        return None;
    }

    if let Some(end_date) = budget.end_date
        && today > end_date
    {
        return None;
    }

    let (window_start, window_end) = match budget.period {
        BudgetPeriod::Weekly => {
            let elapsed_weeks = (today - budget.start_date).whole_days() / 7;
            let window_start = budget.start_date + Duration::weeks(elapsed_weeks);

            (window_start, window_start + Duration::days(6))
        }
        BudgetPeriod::Monthly => {
            let mut window_start = budget.start_date;

            while add_months(window_start, 1) <= today {
                window_start = add_months(window_start, 1);
            }

            (window_start, add_months(window_start, 1) - Duration::days(1))
        }
        BudgetPeriod::Yearly => {
            let mut window_start = budget.start_date;

            while add_months(window_start, 12) <= today {
                window_start = add_months(window_start, 12);
            }

            (window_start, add_months(window_start, 12) - Duration::days(1))
        }
    };

    let window_end = match budget.end_date {
        Some(end_date) => window_end.min(end_date),
        None => window_end,
    };

    Some((window_start, window_end))
}

/// Sum the expense transactions that count against a budget in the given
/// window.
///
/// Budgets with a category only count transactions in that category, budgets
/// without one count every expense.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn budget_spent(
    budget: &Budget,
    window: (Date, Date),
    user_id: UserID,
    connection: &Connection,
) -> Result<f64, Error> {
    let (window_start, window_end) = window;

    let spent = match budget.category_id {
        Some(category_id) => connection.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE user_id = ?1 AND transaction_type = 'expense'
               AND date >= ?2 AND date <= ?3 AND category_id = ?4",
            (user_id.as_i64(), window_start, window_end, category_id),
            |row| row.get(0),
        )?,
        None => connection.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE user_id = ?1 AND transaction_type = 'expense'
               AND date >= ?2 AND date <= ?3",
            (user_id.as_i64(), window_start, window_end),
            |row| row.get(0),
        )?,
    };

    Ok(spent)
}

/// Map a database row to a [Budget].
///
/// # Panics
/// Panics if the row does not contain the expected columns.
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let category_id = row.get(2)?;
    let name = row.get(3)?;
    let amount = row.get(4)?;
    let raw_period: String = row.get(5)?;
    let start_date = row.get(6)?;
    let end_date = row.get(7)?;

    let period = BudgetPeriod::from_str(&raw_period).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown budget period {raw_period}").into(),
        )
    })?;

    Ok(Budget {
        id,
        user_id: UserID::new(raw_user_id),
        category_id,
        name,
        amount,
        period,
        start_date,
        end_date,
    })
}

#[cfg(test)]
mod period_window_tests {
    use time::macros::date;

    use crate::user::UserID;

    use super::{Budget, BudgetPeriod, add_months, current_period_window};

    fn budget(period: BudgetPeriod, start_date: time::Date) -> Budget {
        Budget {
            id: 1,
            user_id: UserID::new(1),
            category_id: None,
            name: "Test".to_owned(),
            amount: 100.0,
            period,
            start_date,
            end_date: None,
        }
    }

    #[test]
    fn add_months_clamps_to_end_of_month() {
        assert_eq!(add_months(date!(2025 - 01 - 31), 1), date!(2025 - 02 - 28));
        assert_eq!(add_months(date!(2024 - 01 - 31), 1), date!(2024 - 02 - 29));
        assert_eq!(add_months(date!(2025 - 11 - 15), 2), date!(2026 - 01 - 15));
    }

    #[test]
    fn weekly_window_contains_today() {
        let budget = budget(BudgetPeriod::Weekly, date!(2025 - 08 - 04));

        let window = current_period_window(&budget, date!(2025 - 08 - 20));

        assert_eq!(window, Some((date!(2025 - 08 - 18), date!(2025 - 08 - 24))));
    }

    #[test]
    fn monthly_window_is_anchored_at_start_date() {
        let budget = budget(BudgetPeriod::Monthly, date!(2025 - 01 - 15));

        let window = current_period_window(&budget, date!(2025 - 08 - 20));

        assert_eq!(window, Some((date!(2025 - 08 - 15), date!(2025 - 09 - 14))));
    }

    #[test]
    fn first_period_starts_on_start_date() {
        let budget = budget(BudgetPeriod::Monthly, date!(2025 - 08 - 15));

        let window = current_period_window(&budget, date!(2025 - 08 - 15));

        assert_eq!(window, Some((date!(2025 - 08 - 15), date!(2025 - 09 - 14))));
    }

    #[test]
    fn yearly_window_contains_today() {
        let budget = budget(BudgetPeriod::Yearly, date!(2023 - 03 - 01));

        let window = current_period_window(&budget, date!(2025 - 08 - 20));

        assert_eq!(window, Some((date!(2025 - 03 - 01), date!(2026 - 02 - 28))));
    }

    #[test]
    fn no_window_before_start_date() {
        let budget = budget(BudgetPeriod::Monthly, date!(2025 - 09 - 01));

        assert_eq!(current_period_window(&budget, date!(2025 - 08 - 20)), None);
    }

    #[test]
    fn no_window_after_end_date() {
        let mut budget = budget(BudgetPeriod::Monthly, date!(2025 - 01 - 01));
        budget.end_date = Some(date!(2025 - 06 - 30));

        assert_eq!(current_period_window(&budget, date!(2025 - 08 - 20)), None);
    }

    #[test]
    fn window_is_clipped_by_end_date() {
        let mut budget = budget(BudgetPeriod::Monthly, date!(2025 - 01 - 01));
        budget.end_date = Some(date!(2025 - 08 - 10));

        let window = current_period_window(&budget, date!(2025 - 08 - 05));

        assert_eq!(window, Some((date!(2025 - 08 - 01), date!(2025 - 08 - 10))));
    }
}
