// crates/geyser-economics/src/escrow.rs
//
// Token escrow backed by a vault account inside a `TokenBank`.

use geyser_core::{AccountId, Amount, GeyserError, TokenEscrow};

use crate::token::TokenBank;

/// Escrow that keeps its balance under `vault` in `bank`.
#[derive(Debug, Clone)]
pub struct BankEscrow {
    bank: TokenBank,
    vault: AccountId,
}

impl BankEscrow {
    pub fn new(bank: TokenBank, vault: impl Into<AccountId>) -> Self {
        Self {
            bank,
            vault: vault.into(),
        }
    }
}

impl TokenEscrow for BankEscrow {
    fn account(&self) -> &AccountId {
        &self.vault
    }

    fn deposit_from(&mut self, payer: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        self.bank.transfer(payer, &self.vault, amount)
    }

    fn pay_out(&mut self, recipient: &AccountId, amount: Amount) -> Result<(), GeyserError> {
        self.bank.transfer(&self.vault, recipient, amount)
    }

    fn balance(&self) -> Amount {
        self.bank.balance_of(&self.vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_and_pay_out() {
        let bank = TokenBank::new("STK");
        let alice = AccountId::new("alice");
        bank.mint(&alice, 100).unwrap();

        let mut escrow = BankEscrow::new(bank.clone(), "vault:staking");
        escrow.deposit_from(&alice, 70).unwrap();
        assert_eq!(escrow.balance(), 70);
        assert_eq!(bank.balance_of(&alice), 30);

        escrow.pay_out(&alice, 20).unwrap();
        assert_eq!(escrow.balance(), 50);
        assert_eq!(bank.balance_of(&alice), 50);
    }

    #[test]
    fn test_failed_transfers_leave_balances() {
        let bank = TokenBank::new("STK");
        let alice = AccountId::new("alice");
        bank.mint(&alice, 10).unwrap();

        let mut escrow = BankEscrow::new(bank.clone(), "vault:staking");
        assert!(escrow.deposit_from(&alice, 11).is_err());
        assert!(escrow.pay_out(&alice, 1).is_err());
        assert_eq!(escrow.balance(), 0);
        assert_eq!(bank.balance_of(&alice), 10);
    }
}
