// crates/geyser-economics/src/treasury.rs
//
// Reward funding treasury.
//
// The treasury holds a principal that funders lock in and that can never be
// released. Yield earned on top of it shows up as balance growth above the
// principal; only that surplus is available, and releasing moves all of it
// into the reward pool in one transfer.

use geyser_core::{AccountId, Amount, FundingSource, GeyserError};

use crate::token::TokenBank;

/// Treasury that tracks a locked principal inside a `TokenBank`.
#[derive(Debug, Clone)]
pub struct PrincipalTreasury {
    bank: TokenBank,
    account: AccountId,
    /// Locked principal in raw units.
    principal: Amount,
}

impl PrincipalTreasury {
    /// Create a treasury with zero principal, holding funds under `account`.
    pub fn new(bank: TokenBank, account: impl Into<AccountId>) -> Self {
        Self {
            bank,
            account: account.into(),
            principal: 0,
        }
    }

    /// Current balance, principal included.
    pub fn balance(&self) -> Amount {
        self.bank.balance_of(&self.account)
    }
}

impl FundingSource for PrincipalTreasury {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn funds_available(&self) -> Amount {
        self.balance().saturating_sub(self.principal)
    }

    fn principal(&self) -> Amount {
        self.principal
    }

    /// # Errors
    /// - `InvalidInput` if `amount` is zero.
    /// - `Collaborator` if the funder cannot cover `amount`.
    fn lock(&mut self, funder: &AccountId, amount: Amount) -> Result<Amount, GeyserError> {
        if amount == 0 {
            return Err(GeyserError::InvalidInput(
                "cannot lock a zero amount".to_string(),
            ));
        }
        let principal = self.principal.checked_add(amount).ok_or_else(|| {
            GeyserError::ArithmeticOverflow("treasury principal overflow".to_string())
        })?;
        self.bank.transfer(funder, &self.account, amount)?;
        self.principal = principal;
        Ok(self.principal)
    }

    fn release(&mut self, beneficiary: &AccountId) -> Result<Amount, GeyserError> {
        let available = self.funds_available();
        if available == 0 {
            return Ok(0);
        }
        self.bank.transfer(&self.account, beneficiary, available)?;
        Ok(available)
    }
}
