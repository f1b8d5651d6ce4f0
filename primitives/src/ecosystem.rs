//! Staking Constants for the Validator Service Contract
//!
//! This module centralizes the protocol-level constants shared by the service contract
//! pallet, its mock runtime and any runtime that wires it in: pallet IDs, the ETH unit,
//! the full validator deposit and the commission scale.
//!
//! Values here are part of the accounting contract. Changing any of them changes how
//! principal and commission are split, so they are fixed at compile time.

/// Balance type alias (wei)
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
pub mod pallet_ids {
  /// Service contract pallet ID; per-validator sovereign accounts are its sub-accounts
  pub const SERVICE_CONTRACT_PALLET_ID: &[u8; 8] = b"svc/eth2";
}

/// Protocol parameters for validator accounting.
pub mod params {
  use super::Balance;
  use sp_arithmetic::Permill;

  /// 1 ETH expressed in wei (10^18).
  pub const ETH: Balance = 1_000_000_000_000_000_000;

  /// Exactly one validator's worth of stake (32 ETH).
  ///
  /// Forwarded to the deposit contract on initialization and used as the principal
  /// baseline when computing profit.
  pub const FULL_DEPOSIT: Balance = 32 * ETH;

  /// Denominator of the commission rate (parts-per-million).
  pub const COMMISSION_SCALE: u32 = 1_000_000;

  /// Commission rate charged by default deployments (10%).
  pub const DEFAULT_COMMISSION_RATE: Permill = Permill::from_parts(100_000);

  /// Minimum balance that must sit on a service contract before exit may be finalized (16 ETH).
  ///
  /// Half the deposit: enough to tell a genuinely exited validator from a stray transfer,
  /// low enough to tolerate an inactivity-leaked validator. Governance can change it.
  pub const DEFAULT_MIN_EXIT_BALANCE: Balance = 16 * ETH;

  /// Seconds in a day.
  pub const DAY: u64 = 24 * 60 * 60;

  /// Initial service period: the exit date is set this far after initialization (1 year).
  pub const SERVICE_PERIOD: u64 = 365 * DAY;

  /// Largest single extension of the exit date the operator may apply (1 year).
  pub const MAX_EXIT_DATE_INCREMENT: u64 = 365 * DAY;
}
