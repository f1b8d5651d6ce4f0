//! Storage types of the service contract pallet and the balance accounting rules.
//!
//! The accounting lives on [`ServiceContractAccount`] itself so it can be exercised
//! without a runtime. The pallet reads the sovereign balance, calls into these methods
//! and persists the result before moving any funds.

use frame::deps::frame_support::weights::Weight;
use frame::prelude::*;
use primitives::{Balance, ValidatorPubKey, params::FULL_DEPOSIT};

pub type ServiceId = u64;

/// Position of a transaction in its service contract's queue arena.
pub type TxIndex = u32;

/// Link value meaning "no neighbour" in the transaction chain.
pub const NO_TRANSACTION: TxIndex = TxIndex::MAX;

#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum Lifecycle {
  /// Record exists, the 32 ETH has not reached the deposit contract yet.
  PreDeposit,
  /// Validator running; beneficiary withdrawals are forbidden.
  Active,
  /// Funds are back on the service contract; withdrawals permitted.
  Exited,
}

/// One validator's service contract.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct ServiceContractAccount<AccountId, TokenId> {
  pub token_id: TokenId,
  /// Creator of the instance; the only account allowed to trigger beneficiary payouts.
  pub entrypoint: AccountId,
  /// Account whose free balance is the contract balance.
  pub sovereign: AccountId,
  pub validator_pubkey: ValidatorPubKey,
  pub commission_rate: Permill,
  pub state: Lifecycle,
  /// Unix seconds. Earliest time the operator may finalize the exit.
  pub exit_date: u64,
  pub operator_claimable: Balance,
  /// Cumulative amount paid to beneficiaries.
  pub withdrawn: Balance,
  /// Part of `balance - operator_claimable` already charged commission.
  pub settled_balance: Balance,
  /// Set once the beneficiary side has recovered the full deposit; never cleared.
  pub fully_exited: bool,
}

impl<AccountId, TokenId> ServiceContractAccount<AccountId, TokenId> {
  /// `floor(profit * rate / 1_000_000)`.
  pub fn commission_on(&self, profit: Balance) -> Balance {
    self.commission_rate.mul_floor(profit)
  }

  /// Exit accounting: charges commission on everything above the deposit baseline and
  /// moves the account to `Exited`. Returns the commission accrued, or `None` on overflow.
  pub fn settle_exit(&mut self, balance: Balance) -> Option<Balance> {
    let returned = balance.checked_add(self.withdrawn)?;
    let profit = returned.saturating_sub(FULL_DEPOSIT);
    let commission = self.commission_on(profit);
    self.operator_claimable = self.operator_claimable.checked_add(commission)?;
    self.settled_balance = balance.saturating_sub(self.operator_claimable);
    self.fully_exited = returned >= FULL_DEPOSIT;
    self.state = Lifecycle::Exited;
    Some(commission)
  }

  /// Withdrawal accounting against the current `balance`.
  ///
  /// Funds that arrived since the last settlement are charged commission on their
  /// profit share: all of it once `fully_exited`, otherwise only the part that lifts the
  /// beneficiary side over the deposit baseline. Returns `(commission, payout)`.
  pub fn settle_withdrawal(&mut self, balance: Balance) -> Option<(Balance, Balance)> {
    let available = balance.saturating_sub(self.operator_claimable);
    let fresh = available.saturating_sub(self.settled_balance);
    let profit = if self.fully_exited {
      fresh
    } else {
      let returned = self.withdrawn.checked_add(available)?;
      if returned >= FULL_DEPOSIT {
        self.fully_exited = true;
        returned.saturating_sub(FULL_DEPOSIT).min(fresh)
      } else {
        0
      }
    };
    let commission = self.commission_on(profit);
    self.operator_claimable = self.operator_claimable.checked_add(commission)?;
    let payout = available.checked_sub(commission)?;
    self.withdrawn = self.withdrawn.checked_add(payout)?;
    self.settled_balance = 0;
    Some((commission, payout))
  }
}

/// A single fund or data movement made from the service contract's sovereign account.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct Operation<AccountId, Payload> {
  pub destination: AccountId,
  pub value: Balance,
  pub payload: Payload,
}

/// Queue entry. Entries are never removed: canceling clears `valid` and unlinks.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct Transaction<Operations, Description> {
  pub operations: Operations,
  pub description: Description,
  /// Sum of the payload weights reported at submission.
  pub payload_weight: Weight,
  pub executed: bool,
  pub confirmed: bool,
  pub valid: bool,
  pub prev: TxIndex,
  pub next: TxIndex,
}

/// Arena bookkeeping for one service contract's queue.
#[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct TransactionQueue {
  /// Number of entries ever submitted; the next index.
  pub count: u32,
  pub head: TxIndex,
  pub tail: TxIndex,
}

impl Default for TransactionQueue {
  fn default() -> Self {
    Self {
      count: 0,
      head: NO_TRANSACTION,
      tail: NO_TRANSACTION,
    }
  }
}
