//! Collaborator traits for the service contract pallet.
//!
//! The pallet never talks to the NFT entrypoint, the beacon deposit contract or an
//! operation target directly. Each is reached through one of the narrow traits below,
//! wired in by the runtime through `Config`.

use core::marker::PhantomData;
use frame::deps::{
  frame_support::{
    dispatch::GetDispatchInfo,
    traits::{fungible, tokens::Preservation},
    weights::Weight,
  },
  sp_runtime::traits::Dispatchable,
};
use frame::prelude::*;
use primitives::{
  Balance, DepositDataRoot, DepositSignature, ValidatorPubKey, WithdrawalCredentials,
};

/// Nesting bound applied when decoding an operation payload into a runtime call.
pub const MAX_PAYLOAD_DECODE_DEPTH: u32 = 64;

/// Role queries against the staking NFT entrypoint.
///
/// Answers are read on every privileged call and never cached by the pallet.
pub trait StakingEntrypoint<AccountId, TokenId> {
  /// Account acting as operator for every service contract.
  fn owner() -> AccountId;

  /// Whether `who` currently owns or is approved for `token_id`.
  fn is_approved_or_owner(who: &AccountId, token_id: &TokenId) -> bool;
}

/// The canonical validator deposit contract.
pub trait DepositContract<AccountId> {
  /// Forwards `value` from `depositor` to `deposit_contract` together with the
  /// validator deposit data.
  fn deposit(
    depositor: &AccountId,
    deposit_contract: &AccountId,
    value: Balance,
    pubkey: &ValidatorPubKey,
    withdrawal_credentials: &WithdrawalCredentials,
    signature: &DepositSignature,
    deposit_data_root: &DepositDataRoot,
  ) -> DispatchResult;
}

/// Runs one queued operation on behalf of a service contract's sovereign account.
pub trait OperationExecutor<AccountId> {
  /// Weight `payload` consumes on execution, on top of the value transfer.
  ///
  /// Queried when the operation is submitted. An error rejects the payload.
  fn payload_weight(payload: &[u8]) -> Result<Weight, DispatchError>;

  fn execute(
    from: &AccountId,
    destination: &AccountId,
    value: Balance,
    payload: &[u8],
  ) -> DispatchResult;
}

/// Rejects every deposit. For configurations without a deposit bridge.
impl<AccountId> DepositContract<AccountId> for () {
  fn deposit(
    _: &AccountId,
    _: &AccountId,
    _: Balance,
    _: &ValidatorPubKey,
    _: &WithdrawalCredentials,
    _: &DepositSignature,
    _: &DepositDataRoot,
  ) -> DispatchResult {
    Err(DispatchError::Other("DepositContract not configured"))
  }
}

/// Rejects every operation. For configurations where the queue must stay inert.
impl<AccountId> OperationExecutor<AccountId> for () {
  fn payload_weight(_: &[u8]) -> Result<Weight, DispatchError> {
    Ok(Weight::zero())
  }

  fn execute(_: &AccountId, _: &AccountId, _: Balance, _: &[u8]) -> DispatchResult {
    Err(DispatchError::Other("OperationExecutor not configured"))
  }
}

/// Deposit adapter that moves the stake to the deposit contract's account.
///
/// The deposit data itself is left to whatever watches that account.
pub struct TransferDeposit<Currency>(PhantomData<Currency>);

impl<AccountId, Currency> DepositContract<AccountId> for TransferDeposit<Currency>
where
  AccountId: Eq,
  Currency: fungible::Mutate<AccountId, Balance = Balance>,
{
  fn deposit(
    depositor: &AccountId,
    deposit_contract: &AccountId,
    value: Balance,
    _pubkey: &ValidatorPubKey,
    _withdrawal_credentials: &WithdrawalCredentials,
    _signature: &DepositSignature,
    _deposit_data_root: &DepositDataRoot,
  ) -> DispatchResult {
    Currency::transfer(depositor, deposit_contract, value, Preservation::Expendable)?;
    Ok(())
  }
}

/// Executor for plain value transfers. A non-empty payload is an error.
pub struct TransferOnly<Currency>(PhantomData<Currency>);

impl<AccountId, Currency> OperationExecutor<AccountId> for TransferOnly<Currency>
where
  AccountId: Eq,
  Currency: fungible::Mutate<AccountId, Balance = Balance>,
{
  fn payload_weight(payload: &[u8]) -> Result<Weight, DispatchError> {
    if !payload.is_empty() {
      return Err(DispatchError::Other("payload not supported"));
    }
    Ok(Weight::zero())
  }

  fn execute(
    from: &AccountId,
    destination: &AccountId,
    value: Balance,
    payload: &[u8],
  ) -> DispatchResult {
    if !payload.is_empty() {
      return Err(DispatchError::Other("payload not supported"));
    }
    if value > 0 {
      Currency::transfer(from, destination, value, Preservation::Expendable)?;
    }
    Ok(())
  }
}

/// Executor that transfers `value` and then dispatches the payload as a runtime call
/// signed by the sovereign account. The destination only receives the value.
pub struct DispatchAsSovereign<Runtime, Currency>(PhantomData<(Runtime, Currency)>);

impl<Runtime: frame_system::Config, Currency> DispatchAsSovereign<Runtime, Currency> {
  fn decode_call(payload: &[u8]) -> Result<Runtime::RuntimeCall, DispatchError> {
    <Runtime::RuntimeCall as codec::DecodeLimit>::decode_all_with_depth_limit(
      MAX_PAYLOAD_DECODE_DEPTH,
      &mut &payload[..],
    )
    .map_err(|_| DispatchError::Other("undecodable operation payload"))
  }
}

impl<Runtime, Currency> OperationExecutor<Runtime::AccountId>
  for DispatchAsSovereign<Runtime, Currency>
where
  Runtime: frame_system::Config,
  Runtime::RuntimeCall: GetDispatchInfo,
  Currency: fungible::Mutate<Runtime::AccountId, Balance = Balance>,
{
  fn payload_weight(payload: &[u8]) -> Result<Weight, DispatchError> {
    if payload.is_empty() {
      return Ok(Weight::zero());
    }
    Ok(Self::decode_call(payload)?.get_dispatch_info().call_weight)
  }

  fn execute(
    from: &Runtime::AccountId,
    destination: &Runtime::AccountId,
    value: Balance,
    payload: &[u8],
  ) -> DispatchResult {
    TransferOnly::<Currency>::execute(from, destination, value, &[])?;
    if payload.is_empty() {
      return Ok(());
    }
    Self::decode_call(payload)?
      .dispatch(frame_system::RawOrigin::Signed(from.clone()).into())
      .map(|_| ())
      .map_err(|e| e.error)
  }
}
