//! Validator deposit data shared between the service contract pallet and deposit adapters.

/// BLS12-381 validator public key (48 bytes, compressed).
pub type ValidatorPubKey = [u8; 48];

/// BLS12-381 signature over the deposit message (96 bytes).
pub type DepositSignature = [u8; 96];

/// SSZ hash tree root of the `DepositData` container.
pub type DepositDataRoot = [u8; 32];

/// 32-byte withdrawal credentials committed to by the deposit.
pub type WithdrawalCredentials = [u8; 32];

/// 20-byte execution-layer address.
pub type ExecutionAddress = [u8; 20];

/// Prefix byte of execution-layer (ETH1 address) withdrawal credentials.
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

/// Builds `0x01 ‖ 11 zero bytes ‖ address`, pointing withdrawals at an execution-layer address.
pub fn eth1_withdrawal_credentials(address: &ExecutionAddress) -> WithdrawalCredentials {
  let mut credentials = [0u8; 32];
  credentials[0] = ETH1_ADDRESS_WITHDRAWAL_PREFIX;
  credentials[12..].copy_from_slice(address);
  credentials
}
