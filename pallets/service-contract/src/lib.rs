//! Validator Service Contract Pallet
//!
//! Non-custodial staking accounts, one per validator. The staking entrypoint funds a
//! service contract with exactly 32 ETH, the pallet forwards that stake to the deposit
//! contract with withdrawal credentials pointing back at the service contract's own
//! sovereign account, and later splits whatever comes back between the token holder
//! (principal and net rewards) and the operator (commission on profit).
//!
//! Extra fund movements out of a service contract go through a per-contract transaction
//! queue: the operator submits, the token holder confirms, the operator executes, and
//! entries execute strictly in chain order.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{
  DepositContract, DispatchAsSovereign, OperationExecutor, StakingEntrypoint, TransferDeposit,
  TransferOnly,
};

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub const LOG_TARGET: &str = "runtime::service-contract";

/// Runtime-side setup the benchmarks cannot do through the pallet itself.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, TokenId> {
  fn token_id(seed: u32) -> TokenId;
  /// Makes `who` the account `StakingEntrypoint::owner` reports.
  fn set_operator(who: &AccountId);
  /// Makes `who` owner of `token_id`.
  fn set_holder(who: &AccountId, token_id: &TokenId);
  fn deposit_contract() -> AccountId;
}

#[frame::pallet]
pub mod pallet {
  use super::{DepositContract, OperationExecutor, StakingEntrypoint, WeightInfo, types::*};
  use alloc::vec::Vec;
  use frame::deps::{
    frame_support::{
      PalletId,
      traits::{
        UnixTime,
        fungible::{Inspect, Mutate},
        tokens::Preservation,
      },
      weights::Weight,
    },
    sp_runtime::traits::{AccountIdConversion, Convert},
  };
  use frame::prelude::*;
  use primitives::{
    Balance, DepositDataRoot, DepositSignature, ExecutionAddress, ValidatorPubKey,
    eth1_withdrawal_credentials, params::FULL_DEPOSIT,
  };

  const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

  #[pallet::pallet]
  #[pallet::storage_version(STORAGE_VERSION)]
  pub struct Pallet<T>(PhantomData<T>);

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// Native currency. A service contract's balance is the free balance of its
    /// sovereign account.
    type Currency: Inspect<Self::AccountId, Balance = Balance>
      + Mutate<Self::AccountId, Balance = Balance>;

    /// Identifier of the staking NFT that owns a service contract.
    type TokenId: Parameter + Member + Copy + MaxEncodedLen;

    /// Operator and holder role queries.
    type Entrypoint: StakingEntrypoint<Self::AccountId, Self::TokenId>;

    /// Receiver of the validator stake.
    type DepositContract: DepositContract<Self::AccountId>;

    /// Runs the operations of executed queue entries.
    type OperationExecutor: OperationExecutor<Self::AccountId>;

    /// Execution-layer address of an account, committed to in withdrawal credentials.
    type ExecutionAddress: Convert<Self::AccountId, ExecutionAddress>;

    type TimeProvider: UnixTime;

    /// Origin allowed to create service contracts. Resolves to the entrypoint account
    /// that funds the stake and later triggers beneficiary withdrawals.
    type EntrypointOrigin: EnsureOrigin<Self::RuntimeOrigin, Success = Self::AccountId>;

    /// Origin that can update governance parameters
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Sovereign accounts are sub-accounts of this id keyed by `ServiceId`.
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    #[pallet::constant]
    type MaxOperations: Get<u32>;

    #[pallet::constant]
    type MaxPayloadLen: Get<u32>;

    /// Largest dispatch weight a single operation payload may carry.
    #[pallet::constant]
    type MaxPayloadWeight: Get<Weight>;

    #[pallet::constant]
    type MaxDescriptionLen: Get<u32>;

    /// Seconds between initialization and the initial exit date.
    #[pallet::constant]
    type ServicePeriod: Get<u64>;

    /// Largest single exit date extension, in seconds.
    #[pallet::constant]
    type MaxExitDateIncrement: Get<u64>;

    /// Default minimum contract balance for finalizing an exit.
    #[pallet::constant]
    type DefaultMinExitBalance: Get<Balance>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId, Self::TokenId>;
  }

  pub type PayloadOf<T> = BoundedVec<u8, <T as Config>::MaxPayloadLen>;
  pub type OperationOf<T> = Operation<<T as frame_system::Config>::AccountId, PayloadOf<T>>;
  pub type OperationsOf<T> = BoundedVec<OperationOf<T>, <T as Config>::MaxOperations>;
  pub type DescriptionOf<T> = BoundedVec<u8, <T as Config>::MaxDescriptionLen>;
  pub type TransactionOf<T> = Transaction<OperationsOf<T>, DescriptionOf<T>>;
  pub type ServiceContractAccountOf<T> =
    ServiceContractAccount<<T as frame_system::Config>::AccountId, <T as Config>::TokenId>;

  #[pallet::storage]
  pub type NextServiceId<T: Config> = StorageValue<_, ServiceId, ValueQuery>;

  #[pallet::storage]
  pub type ServiceContracts<T: Config> =
    StorageMap<_, Twox64Concat, ServiceId, ServiceContractAccountOf<T>, OptionQuery>;

  /// One service contract per token.
  #[pallet::storage]
  pub type TokenToService<T: Config> =
    StorageMap<_, Blake2_128Concat, T::TokenId, ServiceId, OptionQuery>;

  #[pallet::storage]
  pub type Queues<T: Config> = StorageMap<_, Twox64Concat, ServiceId, TransactionQueue, ValueQuery>;

  /// Transaction arena. Entries keep their index for life, canceled ones included.
  #[pallet::storage]
  pub type Transactions<T: Config> = StorageDoubleMap<
    _,
    Twox64Concat,
    ServiceId,
    Twox64Concat,
    TxIndex,
    TransactionOf<T>,
    OptionQuery,
  >;

  /// Current minimum balance for finalizing an exit (can be updated by governance)
  #[pallet::storage]
  pub type MinExitBalance<T: Config> =
    StorageValue<_, Balance, ValueQuery, T::DefaultMinExitBalance>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    ServiceContractInitialized {
      service_id: ServiceId,
      token_id: T::TokenId,
      entrypoint: T::AccountId,
      sovereign: T::AccountId,
      commission_rate: Permill,
      exit_date: u64,
    },
    /// The stake reached the deposit contract.
    ValidatorDeposited {
      service_id: ServiceId,
      pubkey: ValidatorPubKey,
    },
    CommissionAccrued {
      service_id: ServiceId,
      amount: Balance,
    },
    /// Exit accounting ran; the service contract is now `Exited`.
    ServiceEnd {
      service_id: ServiceId,
      balance: Balance,
      operator_claimable: Balance,
    },
    ExitDateUpdated {
      service_id: ServiceId,
      new_date: u64,
    },
    Withdrawal {
      service_id: ServiceId,
      to: T::AccountId,
      amount: Balance,
    },
    Claim {
      service_id: ServiceId,
      receiver: T::AccountId,
      amount: Balance,
    },
    TransactionSubmitted {
      service_id: ServiceId,
      index: TxIndex,
      description: DescriptionOf<T>,
    },
    TransactionConfirmed {
      service_id: ServiceId,
      index: TxIndex,
    },
    TransactionCanceled {
      service_id: ServiceId,
      index: TxIndex,
    },
    TransactionExecuted {
      service_id: ServiceId,
      index: TxIndex,
    },
    MinExitBalanceUpdated {
      old_amount: Balance,
      new_amount: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Caller is not the operator
    NotOperator,
    /// Caller does not hold the required role for this call
    CallerNotAllowed,
    ServiceNotFound,
    /// The token already has a service contract
    AlreadyInitialized,
    NotActive,
    NotExited,
    ZeroBalance,
    /// Contract balance is below the minimum exit balance
    ExitBalanceTooLow,
    ExitDateNotReached,
    /// New exit date must be later than the current one
    ExitDateTooEarly,
    ExitDateIncrementTooLarge,
    /// Nothing to claim
    EmptyClaimable,
    NothingToWithdraw,
    /// Withdrawals must leave the service contract's own account
    BeneficiaryIsServiceAccount,
    /// Contract balance would fall below the operator claimable
    InsufficientBalance,
    /// The deposit contract did not take exactly the full deposit
    InvalidDepositAmount,
    Overflow,
    ServiceIdOverflow,
    TransactionIndexOverflow,
    TransactionNotFound,
    /// The transaction was canceled
    TransactionCanceled,
    AlreadyConfirmed,
    NotConfirmed,
    AlreadyExecuted,
    /// The previous transaction in the chain has not executed
    PredecessorNotExecuted,
    /// An operation of the transaction failed
    TransactionCallFailed,
    /// The operation executor rejected a payload
    InvalidPayload,
    /// An operation payload weighs more than `MaxPayloadWeight`
    PayloadWeightTooHigh,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    #[cfg(feature = "try-runtime")]
    fn try_state(_n: BlockNumberFor<T>) -> Result<(), frame::deps::sp_runtime::TryRuntimeError> {
      Self::do_try_state()
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a service contract for `token_id`, fund it with the full deposit from the
    /// entrypoint and forward the stake to `deposit_contract`.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::initialize())]
    pub fn initialize(
      origin: OriginFor<T>,
      token_id: T::TokenId,
      commission_rate: Permill,
      validator_pubkey: ValidatorPubKey,
      deposit_signature: DepositSignature,
      deposit_data_root: DepositDataRoot,
      deposit_contract: T::AccountId,
    ) -> DispatchResult {
      let entrypoint = T::EntrypointOrigin::ensure_origin(origin)?;
      ensure!(
        !TokenToService::<T>::contains_key(token_id),
        Error::<T>::AlreadyInitialized
      );
      let service_id = NextServiceId::<T>::get();
      let next_id = service_id
        .checked_add(1)
        .ok_or(Error::<T>::ServiceIdOverflow)?;
      let exit_date = Self::now()
        .checked_add(T::ServicePeriod::get())
        .ok_or(Error::<T>::Overflow)?;
      let sovereign = Self::service_account(service_id);
      let mut account = ServiceContractAccount {
        token_id,
        entrypoint: entrypoint.clone(),
        sovereign: sovereign.clone(),
        validator_pubkey,
        commission_rate,
        state: Lifecycle::PreDeposit,
        exit_date,
        operator_claimable: 0,
        withdrawn: 0,
        settled_balance: 0,
        fully_exited: false,
      };
      NextServiceId::<T>::put(next_id);
      TokenToService::<T>::insert(token_id, service_id);
      ServiceContracts::<T>::insert(service_id, &account);
      // Sovereign account outlives a zero balance between withdrawals
      frame_system::Pallet::<T>::inc_providers(&sovereign);
      T::Currency::transfer(
        &entrypoint,
        &sovereign,
        FULL_DEPOSIT,
        Preservation::Expendable,
      )?;
      Self::deposit_event(Event::ServiceContractInitialized {
        service_id,
        token_id,
        entrypoint,
        sovereign: sovereign.clone(),
        commission_rate,
        exit_date,
      });

      account.state = Lifecycle::Active;
      ServiceContracts::<T>::insert(service_id, &account);

      let credentials = eth1_withdrawal_credentials(&T::ExecutionAddress::convert(sovereign.clone()));
      let balance_before = T::Currency::balance(&sovereign);
      T::DepositContract::deposit(
        &sovereign,
        &deposit_contract,
        FULL_DEPOSIT,
        &validator_pubkey,
        &credentials,
        &deposit_signature,
        &deposit_data_root,
      )?;
      ensure!(
        balance_before.saturating_sub(T::Currency::balance(&sovereign)) == FULL_DEPOSIT,
        Error::<T>::InvalidDepositAmount
      );
      log::debug!(
        target: crate::LOG_TARGET,
        "service contract {service_id} deposited, exit date {exit_date}",
      );
      Self::deposit_event(Event::ValidatorDeposited {
        service_id,
        pubkey: validator_pubkey,
      });
      Ok(())
    }

    /// Finalize the validator exit and run exit accounting.
    ///
    /// The entrypoint and the token holder may call this at any time; the operator only
    /// once the exit date has passed.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::end_operator_services())]
    pub fn end_operator_services(origin: OriginFor<T>, service_id: ServiceId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut account = Self::service(service_id)?;
      let time_gated = if who == account.entrypoint || Self::is_holder(&who, &account) {
        false
      } else if who == T::Entrypoint::owner() {
        true
      } else {
        return Err(Error::<T>::CallerNotAllowed.into());
      };
      ensure!(account.state == Lifecycle::Active, Error::<T>::NotActive);
      let balance = T::Currency::balance(&account.sovereign);
      ensure!(balance > 0, Error::<T>::ZeroBalance);
      ensure!(
        balance >= MinExitBalance::<T>::get(),
        Error::<T>::ExitBalanceTooLow
      );
      if time_gated {
        ensure!(
          Self::now() >= account.exit_date,
          Error::<T>::ExitDateNotReached
        );
      }

      let commission = account.settle_exit(balance).ok_or(Error::<T>::Overflow)?;
      ServiceContracts::<T>::insert(service_id, &account);
      log::debug!(
        target: crate::LOG_TARGET,
        "service contract {service_id} exited with balance {balance}, commission {commission}",
      );
      if commission > 0 {
        Self::deposit_event(Event::CommissionAccrued {
          service_id,
          amount: commission,
        });
      }
      Self::deposit_event(Event::ServiceEnd {
        service_id,
        balance,
        operator_claimable: account.operator_claimable,
      });
      Ok(())
    }

    /// Push the exit date back (operator only, while active).
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::update_exit_date())]
    pub fn update_exit_date(
      origin: OriginFor<T>,
      service_id: ServiceId,
      new_date: u64,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_operator(&who)?;
      let mut account = Self::service(service_id)?;
      ensure!(account.state == Lifecycle::Active, Error::<T>::NotActive);
      ensure!(new_date > account.exit_date, Error::<T>::ExitDateTooEarly);
      ensure!(
        new_date - account.exit_date <= T::MaxExitDateIncrement::get(),
        Error::<T>::ExitDateIncrementTooLarge
      );
      account.exit_date = new_date;
      ServiceContracts::<T>::insert(service_id, &account);
      Self::deposit_event(Event::ExitDateUpdated {
        service_id,
        new_date,
      });
      Ok(())
    }

    /// Pay the accrued commission out to the operator.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::operator_claim())]
    pub fn operator_claim(origin: OriginFor<T>, service_id: ServiceId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_operator(&who)?;
      let mut account = Self::service(service_id)?;
      let amount = account.operator_claimable;
      ensure!(amount > 0, Error::<T>::EmptyClaimable);
      account.operator_claimable = 0;
      ServiceContracts::<T>::insert(service_id, &account);
      T::Currency::transfer(&account.sovereign, &who, amount, Preservation::Expendable)?;
      Self::deposit_event(Event::Claim {
        service_id,
        receiver: who,
        amount,
      });
      Ok(())
    }

    /// Pay the beneficiary side of an exited service contract to `beneficiary`.
    ///
    /// Only the entrypoint that created the service contract may call this.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::withdraw_to())]
    pub fn withdraw_to(
      origin: OriginFor<T>,
      service_id: ServiceId,
      beneficiary: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut account = Self::service(service_id)?;
      ensure!(who == account.entrypoint, Error::<T>::CallerNotAllowed);
      ensure!(account.state == Lifecycle::Exited, Error::<T>::NotExited);
      ensure!(
        beneficiary != account.sovereign,
        Error::<T>::BeneficiaryIsServiceAccount
      );
      let balance = T::Currency::balance(&account.sovereign);
      let (commission, payout) = account
        .settle_withdrawal(balance)
        .ok_or(Error::<T>::Overflow)?;
      ensure!(
        payout > 0 || commission > 0,
        Error::<T>::NothingToWithdraw
      );
      ServiceContracts::<T>::insert(service_id, &account);
      if payout > 0 {
        T::Currency::transfer(
          &account.sovereign,
          &beneficiary,
          payout,
          Preservation::Expendable,
        )?;
      }
      log::debug!(
        target: crate::LOG_TARGET,
        "service contract {service_id} paid {payout}, commission {commission}",
      );
      if commission > 0 {
        Self::deposit_event(Event::CommissionAccrued {
          service_id,
          amount: commission,
        });
      }
      Self::deposit_event(Event::Withdrawal {
        service_id,
        to: beneficiary,
        amount: payout,
      });
      Ok(())
    }

    /// Append a batch of operations to the transaction queue (operator only).
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::submit_transaction(operations.len() as u32))]
    pub fn submit_transaction(
      origin: OriginFor<T>,
      service_id: ServiceId,
      operations: OperationsOf<T>,
      description: DescriptionOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_operator(&who)?;
      Self::service(service_id)?;
      let mut payload_weight = Weight::zero();
      for operation in operations.iter() {
        let weight = T::OperationExecutor::payload_weight(&operation.payload).map_err(|e| {
          log::debug!(
            target: crate::LOG_TARGET,
            "service contract {service_id}: payload rejected: {e:?}",
          );
          Error::<T>::InvalidPayload
        })?;
        ensure!(
          weight.all_lte(T::MaxPayloadWeight::get()),
          Error::<T>::PayloadWeightTooHigh
        );
        payload_weight = payload_weight.saturating_add(weight);
      }
      let mut queue = Queues::<T>::get(service_id);
      let index = queue.count;
      queue.count = index
        .checked_add(1)
        .ok_or(Error::<T>::TransactionIndexOverflow)?;
      if queue.tail != NO_TRANSACTION {
        Self::relink(service_id, queue.tail, |tx| tx.next = index)?;
      } else {
        queue.head = index;
      }
      let transaction = Transaction {
        operations,
        description: description.clone(),
        payload_weight,
        executed: false,
        confirmed: false,
        valid: true,
        prev: queue.tail,
        next: NO_TRANSACTION,
      };
      queue.tail = index;
      Transactions::<T>::insert(service_id, index, transaction);
      Queues::<T>::insert(service_id, queue);
      Self::deposit_event(Event::TransactionSubmitted {
        service_id,
        index,
        description,
      });
      Ok(())
    }

    /// Approve a queued transaction (token holder or approved account, never the operator).
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::confirm_transaction())]
    pub fn confirm_transaction(
      origin: OriginFor<T>,
      service_id: ServiceId,
      index: TxIndex,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let account = Self::service(service_id)?;
      ensure!(
        who != T::Entrypoint::owner() && Self::is_holder(&who, &account),
        Error::<T>::CallerNotAllowed
      );
      let mut transaction = Self::transaction(service_id, index)?;
      ensure!(transaction.valid, Error::<T>::TransactionCanceled);
      ensure!(!transaction.confirmed, Error::<T>::AlreadyConfirmed);
      ensure!(!transaction.executed, Error::<T>::AlreadyExecuted);
      transaction.confirmed = true;
      Transactions::<T>::insert(service_id, index, transaction);
      Self::deposit_event(Event::TransactionConfirmed { service_id, index });
      Ok(())
    }

    /// Drop a pending transaction from the chain (operator only).
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::cancel_transaction())]
    pub fn cancel_transaction(
      origin: OriginFor<T>,
      service_id: ServiceId,
      index: TxIndex,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_operator(&who)?;
      Self::service(service_id)?;
      let mut transaction = Self::transaction(service_id, index)?;
      ensure!(transaction.valid, Error::<T>::TransactionCanceled);
      ensure!(!transaction.executed, Error::<T>::AlreadyExecuted);

      let (prev, next) = (transaction.prev, transaction.next);
      let mut queue = Queues::<T>::get(service_id);
      if prev == NO_TRANSACTION {
        queue.head = next;
      } else {
        Self::relink(service_id, prev, |tx| tx.next = next)?;
      }
      if next == NO_TRANSACTION {
        queue.tail = prev;
      } else {
        Self::relink(service_id, next, |tx| tx.prev = prev)?;
      }
      transaction.valid = false;
      transaction.prev = NO_TRANSACTION;
      transaction.next = NO_TRANSACTION;
      Transactions::<T>::insert(service_id, index, transaction);
      Queues::<T>::insert(service_id, queue);
      Self::deposit_event(Event::TransactionCanceled { service_id, index });
      Ok(())
    }

    /// Run a confirmed transaction's operations from the sovereign account (operator only).
    ///
    /// The entry is marked executed before the first operation runs, so an operation
    /// calling back into this for the same index fails with `AlreadyExecuted`.
    /// Charged for the actual operation count and the payload weights recorded at
    /// submission.
    #[pallet::call_index(8)]
    #[pallet::weight(
      T::WeightInfo::execute_transaction(T::MaxOperations::get()).saturating_add(
        T::MaxPayloadWeight::get().saturating_mul(T::MaxOperations::get().into())
      )
    )]
    pub fn execute_transaction(
      origin: OriginFor<T>,
      service_id: ServiceId,
      index: TxIndex,
    ) -> DispatchResultWithPostInfo {
      let who = ensure_signed(origin)?;
      Self::ensure_operator(&who)?;
      let account = Self::service(service_id)?;
      let mut transaction = Self::transaction(service_id, index)?;
      ensure!(transaction.valid, Error::<T>::TransactionCanceled);
      ensure!(!transaction.executed, Error::<T>::AlreadyExecuted);
      ensure!(transaction.confirmed, Error::<T>::NotConfirmed);
      if transaction.prev != NO_TRANSACTION {
        let predecessor = Self::transaction(service_id, transaction.prev)?;
        ensure!(predecessor.executed, Error::<T>::PredecessorNotExecuted);
      }

      transaction.executed = true;
      Transactions::<T>::insert(service_id, index, &transaction);

      for (position, operation) in transaction.operations.iter().enumerate() {
        T::OperationExecutor::execute(
          &account.sovereign,
          &operation.destination,
          operation.value,
          &operation.payload,
        )
        .map_err(|e| {
          log::warn!(
            target: crate::LOG_TARGET,
            "transaction {index} of service contract {service_id}: operation {position} failed: {e:?}",
          );
          Error::<T>::TransactionCallFailed
        })?;
      }

      // Operations may have re-entered the pallet, read the record again.
      let account = Self::service(service_id)?;
      ensure!(
        T::Currency::balance(&account.sovereign) >= account.operator_claimable,
        Error::<T>::InsufficientBalance
      );
      Self::deposit_event(Event::TransactionExecuted { service_id, index });
      let actual = T::WeightInfo::execute_transaction(transaction.operations.len() as u32)
        .saturating_add(transaction.payload_weight);
      Ok(Some(actual).into())
    }

    /// Update the minimum exit balance (governance only)
    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::set_min_exit_balance())]
    pub fn set_min_exit_balance(origin: OriginFor<T>, new_amount: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      let old_amount = MinExitBalance::<T>::get();
      MinExitBalance::<T>::put(new_amount);
      Self::deposit_event(Event::MinExitBalanceUpdated {
        old_amount,
        new_amount,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Sovereign account of `service_id`. Deterministic, exists before initialization.
    pub fn service_account(service_id: ServiceId) -> T::AccountId {
      T::PalletId::get().into_sub_account_truncating(service_id)
    }

    pub fn contract_balance(service_id: ServiceId) -> Balance {
      T::Currency::balance(&Self::service_account(service_id))
    }

    /// What `withdraw_to` would pay right now, or zero when it would fail.
    pub fn withdrawable_amount(service_id: ServiceId) -> Balance {
      let Some(mut account) = ServiceContracts::<T>::get(service_id) else {
        return 0;
      };
      if account.state != Lifecycle::Exited {
        return 0;
      }
      let balance = T::Currency::balance(&account.sovereign);
      account
        .settle_withdrawal(balance)
        .map(|(_, payout)| payout)
        .unwrap_or(0)
    }

    pub fn commission_rate(service_id: ServiceId) -> Option<Permill> {
      ServiceContracts::<T>::get(service_id).map(|a| a.commission_rate)
    }

    pub fn lifecycle_state(service_id: ServiceId) -> Option<Lifecycle> {
      ServiceContracts::<T>::get(service_id).map(|a| a.state)
    }

    pub fn exit_date(service_id: ServiceId) -> Option<u64> {
      ServiceContracts::<T>::get(service_id).map(|a| a.exit_date)
    }

    pub fn is_fully_exited(service_id: ServiceId) -> bool {
      ServiceContracts::<T>::get(service_id).is_some_and(|a| a.fully_exited)
    }

    pub fn operator_claimable(service_id: ServiceId) -> Balance {
      ServiceContracts::<T>::get(service_id).map_or(0, |a| a.operator_claimable)
    }

    /// Entries ever submitted, canceled ones included.
    pub fn transaction_count(service_id: ServiceId) -> u32 {
      Queues::<T>::get(service_id).count
    }

    /// Linked entries from head to tail.
    pub fn transaction_chain(service_id: ServiceId) -> Vec<TxIndex> {
      let queue = Queues::<T>::get(service_id);
      let mut chain = Vec::new();
      let mut cursor = queue.head;
      while cursor != NO_TRANSACTION && chain.len() < queue.count as usize {
        chain.push(cursor);
        cursor = Transactions::<T>::get(service_id, cursor).map_or(NO_TRANSACTION, |tx| tx.next);
      }
      chain
    }

    fn now() -> u64 {
      T::TimeProvider::now().as_secs()
    }

    fn service(service_id: ServiceId) -> Result<ServiceContractAccountOf<T>, DispatchError> {
      ServiceContracts::<T>::get(service_id).ok_or_else(|| Error::<T>::ServiceNotFound.into())
    }

    fn transaction(
      service_id: ServiceId,
      index: TxIndex,
    ) -> Result<TransactionOf<T>, DispatchError> {
      Transactions::<T>::get(service_id, index)
        .ok_or_else(|| Error::<T>::TransactionNotFound.into())
    }

    fn relink(
      service_id: ServiceId,
      index: TxIndex,
      update: impl FnOnce(&mut TransactionOf<T>),
    ) -> DispatchResult {
      Transactions::<T>::try_mutate(service_id, index, |maybe_tx| {
        let tx = maybe_tx.as_mut().ok_or(Error::<T>::TransactionNotFound)?;
        update(tx);
        Ok(())
      })
    }

    fn ensure_operator(who: &T::AccountId) -> DispatchResult {
      ensure!(*who == T::Entrypoint::owner(), Error::<T>::NotOperator);
      Ok(())
    }

    fn is_holder(who: &T::AccountId, account: &ServiceContractAccountOf<T>) -> bool {
      T::Entrypoint::is_approved_or_owner(who, &account.token_id)
    }

    /// Checks every service contract for:
    /// - `operator_claimable` covered by the contract balance,
    /// - a transaction chain whose links agree in both directions, ending at the queue
    ///   tail, holding only valid entries.
    #[cfg(any(feature = "try-runtime", test))]
    pub fn do_try_state() -> Result<(), DispatchError> {
      for (service_id, account) in ServiceContracts::<T>::iter() {
        ensure!(
          account.sovereign == Self::service_account(service_id),
          "sovereign account does not match service id"
        );
        ensure!(
          account.operator_claimable <= T::Currency::balance(&account.sovereign),
          "operator claimable exceeds contract balance"
        );
        let queue = Queues::<T>::get(service_id);
        let mut prev = NO_TRANSACTION;
        let mut cursor = queue.head;
        let mut steps = 0u32;
        while cursor != NO_TRANSACTION {
          ensure!(steps < queue.count, "transaction chain is cyclic");
          let tx = Transactions::<T>::get(service_id, cursor).ok_or("dangling transaction link")?;
          ensure!(tx.valid, "canceled transaction still linked");
          ensure!(tx.prev == prev, "transaction back link mismatch");
          prev = cursor;
          cursor = tx.next;
          steps += 1;
        }
        ensure!(queue.tail == prev, "queue tail is not the chain end");
      }
      Ok(())
    }
  }
}
