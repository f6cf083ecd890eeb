// crates/geyser-economics/src/token.rs
//
// In-memory single-asset balance sheet.
//
// A `TokenBank` tracks balances of one asset for every account, including
// escrow vaults and the treasury. Handles are cheap clones of the same
// shared book, so the engine's collaborators and the test harness observe
// the same balances. All arithmetic is integer and checked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geyser_core::{AccountId, Amount, GeyserError};

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, Amount>,
    total_supply: Amount,
}

/// Shared handle to the balance sheet of a single asset.
#[derive(Debug, Clone)]
pub struct TokenBank {
    symbol: String,
    book: Arc<Mutex<Book>>,
}

impl TokenBank {
    /// Create an empty bank for the asset named `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            book: Arc::new(Mutex::new(Book::default())),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        // Every mutation below is applied only after all checks pass, so a
        // poisoned book is still consistent.
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new units in `to`.
    ///
    /// # Errors
    /// Returns `GeyserError::ArithmeticOverflow` if the supply would overflow.
    pub fn mint(&self, to: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        let mut book = self.book();
        let total_supply = book.total_supply.checked_add(amount).ok_or_else(|| {
            GeyserError::ArithmeticOverflow(format!("{} supply overflow", self.symbol))
        })?;
        book.total_supply = total_supply;
        *book.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Returns `GeyserError::Collaborator` if `from` holds less than `amount`.
    pub fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        let mut book = self.book();
        let available = book.balances.get(from).copied().unwrap_or(0);
        if amount > available {
            return Err(GeyserError::Collaborator(format!(
                "{} transfer of {} from {} exceeds balance {}",
                self.symbol, amount, from, available
            )));
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        book.balances.insert(from.clone(), available - amount);
        // Cannot overflow: the sum of all balances equals total_supply.
        *book.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    /// Balance of `account`; zero if it never held the asset.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.book().balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.book().total_supply
    }

    /// All nonzero balances, sorted by account.
    pub fn holders(&self) -> Vec<(AccountId, Amount)> {
        let mut holders: Vec<(AccountId, Amount)> = self
            .book()
            .balances
            .iter()
            .filter(|(_, balance)| **balance > 0)
            .map(|(account, balance)| (account.clone(), *balance))
            .collect();
        holders.sort();
        holders
    }
}

/// Render a raw amount with `decimals` fractional digits, trimming
/// trailing zeros.
///
/// ```
/// use geyser_economics::token::format_amount;
/// assert_eq!(format_amount(1_500_000_000, 9), "1.5");
/// assert_eq!(format_amount(42, 0), "42");
/// ```
pub fn format_amount(raw: Amount, decimals: u32) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let unit = match 10u128.checked_pow(decimals) {
        Some(unit) => unit,
        None => return raw.to_string(),
    };
    let whole = raw / unit;
    let frac = raw % unit;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac_str = format!("{:0width$}", frac, width = decimals as usize);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}
