use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use nestegg::{PasswordHash, ValidatedPassword, create_user, initialize_db};

/// A utility for creating a test database for the nestegg web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("test@example.com", password_hash, &connection)?;
    let user_id = user.id.as_i64();

    println!("Creating test categories...");

    for (name, category_type) in [
        ("Salary", "income"),
        ("Interest", "income"),
        ("Groceries", "expense"),
        ("Eating Out", "expense"),
        ("Rent", "expense"),
    ] {
        connection.execute(
            "INSERT INTO category (user_id, name, category_type) VALUES (?1, ?2, ?3)",
            (user_id, name, category_type),
        )?;
    }

    println!("Creating test assets...");

    connection.execute(
        "INSERT INTO asset (user_id, name, asset_type, value, currency)
         VALUES (?1, 'Checking', 'spending_account', 2500.0, 'USD'),
                (?1, 'Savings', 'cash', 10000.0, 'USD'),
                (?1, 'Index Fund', 'investment', 15000.0, 'USD'),
                (?1, 'Car Loan', 'debt', 8000.0, 'USD'),
                (?1, 'Loan to Alice', 'receivable', 500.0, 'USD')",
        (user_id,),
    )?;
    connection.execute(
        "INSERT INTO asset
            (user_id, name, asset_type, value, currency, quantity, buy_price,
             current_price, coin_id)
         VALUES (?1, 'Bitcoin', 'crypto', 30000.0, 'USD', 0.5, 40000.0,
                 60000.0, 'bitcoin')",
        (user_id,),
    )?;

    println!("Creating test transactions...");

    connection.execute(
        "INSERT INTO \"transaction\"
            (user_id, amount, transaction_type, date, description, category_id)
         VALUES
            (?1, 4200.0, 'income', date('now', '-20 days'), 'Monthly pay',
             (SELECT id FROM category WHERE user_id = ?1 AND name = 'Salary')),
            (?1, 85.5, 'expense', date('now', '-10 days'), 'Weekly shop',
             (SELECT id FROM category WHERE user_id = ?1 AND name = 'Groceries')),
            (?1, 42.0, 'expense', date('now', '-3 days'), 'Dinner with friends',
             (SELECT id FROM category WHERE user_id = ?1 AND name = 'Eating Out')),
            (?1, 1800.0, 'expense', date('now', '-1 days'), NULL,
             (SELECT id FROM category WHERE user_id = ?1 AND name = 'Rent'))",
        (user_id,),
    )?;

    println!("Creating test budgets...");

    connection.execute(
        "INSERT INTO budget
            (user_id, category_id, name, amount, period, start_date)
         VALUES
            (?1, (SELECT id FROM category WHERE user_id = ?1 AND name = 'Groceries'),
             'Groceries', 400.0, 'monthly', date('now', 'start of month')),
            (?1, NULL, 'All spending', 3000.0, 'monthly', date('now', 'start of month'))",
        (user_id,),
    )?;

    println!("Success!");

    Ok(())
}
