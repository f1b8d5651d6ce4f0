use crate as pallet_service_contract;
use crate::{DispatchAsSovereign, OperationExecutor, ServiceId, StakingEntrypoint, TxIndex};
use core::{cell::RefCell, time::Duration};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, ord_parameter_types, parameter_types,
  traits::{ConstU32, ConstU128, UnixTime, fungible::Mutate, tokens::Preservation},
  weights::Weight,
};
use polkadot_sdk::frame_system::{self, EnsureRoot, EnsureSignedBy};
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult, Permill,
  testing::H256,
  traits::{BlakeTwo256, Convert, IdentityLookup},
};
use primitives::{
  Balance, DepositDataRoot, DepositSignature, ExecutionAddress, ValidatorPubKey,
  WithdrawalCredentials,
  params::{DEFAULT_MIN_EXIT_BALANCE, ETH, MAX_EXIT_DATE_INCREMENT, SERVICE_PERIOD},
  pallet_ids::SERVICE_CONTRACT_PALLET_ID,
};
use std::collections::{BTreeMap, BTreeSet};

pub type AccountId = u128;
pub type TokenId = u32;

pub const HOLDER: AccountId = 1;
pub const APPROVED: AccountId = 2;
pub const STRANGER: AccountId = 3;
pub const BENEFICIARY: AccountId = 4;
pub const REWARDS: AccountId = 9;
pub const ENTRYPOINT: AccountId = 10;
pub const OPERATOR: AccountId = 100;
pub const DEPOSIT_CONTRACT: AccountId = 500;

/// Unix time at genesis of every test externality.
pub const GENESIS_TIME: u64 = 1_700_000_000;

pub const PUBKEY: ValidatorPubKey = [0x11; 48];
pub const SIGNATURE: DepositSignature = [0x22; 96];
pub const DATA_ROOT: DepositDataRoot = [0x33; 32];

/// Operation payload the mock executor rejects.
pub const FAILING_PAYLOAD: u8 = 0xFF;
/// Operation payload that calls back into `execute_transaction` for the reentry target.
pub const REENTRANT_PAYLOAD: u8 = 0xEE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositRecord {
  pub depositor: AccountId,
  pub deposit_contract: AccountId,
  pub value: Balance,
  pub pubkey: ValidatorPubKey,
  pub withdrawal_credentials: WithdrawalCredentials,
  pub signature: DepositSignature,
  pub deposit_data_root: DepositDataRoot,
}

// State containers for stateful mocks
thread_local! {
    static OPERATOR_ACCOUNT: RefCell<AccountId> = const { RefCell::new(OPERATOR) };
    static TOKEN_OWNERS: RefCell<BTreeMap<TokenId, AccountId>> = const { RefCell::new(BTreeMap::new()) };
    static TOKEN_APPROVALS: RefCell<BTreeSet<(TokenId, AccountId)>> = const { RefCell::new(BTreeSet::new()) };
    static NOW: RefCell<u64> = const { RefCell::new(GENESIS_TIME) };

    pub static DEPOSITS: RefCell<Vec<DepositRecord>> = const { RefCell::new(Vec::new()) };
    // Amount withheld from what the deposit contract is asked to take
    static DEPOSIT_SHORTFALL: RefCell<Balance> = const { RefCell::new(0) };

    // (from, destination, value) of every operation that reached the executor
    pub static EXECUTED_OPERATIONS: RefCell<Vec<(AccountId, AccountId, Balance)>> = const { RefCell::new(Vec::new()) };
    static REENTRY_TARGET: RefCell<Option<(ServiceId, TxIndex)>> = const { RefCell::new(None) };
    pub static REENTRY_RESULT: RefCell<Option<DispatchResult>> = const { RefCell::new(None) };
}

// Helper methods to setup state
pub fn set_operator(who: AccountId) {
  OPERATOR_ACCOUNT.with(|o| *o.borrow_mut() = who);
}

pub fn set_token_owner(token_id: TokenId, who: AccountId) {
  TOKEN_OWNERS.with(|o| {
    o.borrow_mut().insert(token_id, who);
  });
}

pub fn approve(token_id: TokenId, who: AccountId) {
  TOKEN_APPROVALS.with(|a| {
    a.borrow_mut().insert((token_id, who));
  });
}

pub fn set_now(secs: u64) {
  NOW.with(|n| *n.borrow_mut() = secs);
}

pub fn set_deposit_shortfall(amount: Balance) {
  DEPOSIT_SHORTFALL.with(|s| *s.borrow_mut() = amount);
}

pub fn set_reentry_target(service_id: ServiceId, index: TxIndex) {
  REENTRY_TARGET.with(|t| *t.borrow_mut() = Some((service_id, index)));
}

pub fn deposits() -> Vec<DepositRecord> {
  DEPOSITS.with(|d| d.borrow().clone())
}

pub fn executed_operations() -> Vec<(AccountId, AccountId, Balance)> {
  EXECUTED_OPERATIONS.with(|e| e.borrow().clone())
}

pub fn reentry_result() -> Option<DispatchResult> {
  REENTRY_RESULT.with(|r| r.borrow().clone())
}

pub struct MockEntrypoint;

impl StakingEntrypoint<AccountId, TokenId> for MockEntrypoint {
  fn owner() -> AccountId {
    OPERATOR_ACCOUNT.with(|o| *o.borrow())
  }

  fn is_approved_or_owner(who: &AccountId, token_id: &TokenId) -> bool {
    TOKEN_OWNERS.with(|o| o.borrow().get(token_id) == Some(who))
      || TOKEN_APPROVALS.with(|a| a.borrow().contains(&(*token_id, *who)))
  }
}

/// Records every deposit, then moves the funds like `TransferDeposit` would.
pub struct MockDepositContract;

impl crate::DepositContract<AccountId> for MockDepositContract {
  fn deposit(
    depositor: &AccountId,
    deposit_contract: &AccountId,
    value: Balance,
    pubkey: &ValidatorPubKey,
    withdrawal_credentials: &WithdrawalCredentials,
    signature: &DepositSignature,
    deposit_data_root: &DepositDataRoot,
  ) -> DispatchResult {
    DEPOSITS.with(|d| {
      d.borrow_mut().push(DepositRecord {
        depositor: *depositor,
        deposit_contract: *deposit_contract,
        value,
        pubkey: *pubkey,
        withdrawal_credentials: *withdrawal_credentials,
        signature: *signature,
        deposit_data_root: *deposit_data_root,
      })
    });
    let shortfall = DEPOSIT_SHORTFALL.with(|s| *s.borrow());
    <crate::TransferDeposit<Balances> as crate::DepositContract<AccountId>>::deposit(
      depositor,
      deposit_contract,
      value - shortfall,
      pubkey,
      withdrawal_credentials,
      signature,
      deposit_data_root,
    )
  }
}

/// Dispatches payloads as runtime calls, with two magic single-byte payloads on top.
pub struct MockExecutor;

impl OperationExecutor<AccountId> for MockExecutor {
  fn payload_weight(payload: &[u8]) -> Result<Weight, DispatchError> {
    match payload {
      [FAILING_PAYLOAD] | [REENTRANT_PAYLOAD] => Ok(Weight::zero()),
      _ => <DispatchAsSovereign<Test, Balances> as OperationExecutor<AccountId>>::payload_weight(
        payload,
      ),
    }
  }

  fn execute(
    from: &AccountId,
    destination: &AccountId,
    value: Balance,
    payload: &[u8],
  ) -> DispatchResult {
    EXECUTED_OPERATIONS.with(|e| e.borrow_mut().push((*from, *destination, value)));
    match payload {
      [FAILING_PAYLOAD] => Err(DispatchError::Other("operation rejected")),
      [REENTRANT_PAYLOAD] => {
        if value > 0 {
          Balances::transfer(from, destination, value, Preservation::Expendable)?;
        }
        if let Some((service_id, index)) = REENTRY_TARGET.with(|t| *t.borrow()) {
          let result = ServiceContract::execute_transaction(
            RuntimeOrigin::signed(MockEntrypoint::owner()),
            service_id,
            index,
          )
          .map(|_| ())
          .map_err(|e| e.error);
          REENTRY_RESULT.with(|r| *r.borrow_mut() = Some(result));
        }
        Ok(())
      }
      _ => DispatchAsSovereign::<Test, Balances>::execute(from, destination, value, payload),
    }
  }
}

pub struct MockTime;

impl UnixTime for MockTime {
  fn now() -> Duration {
    Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

/// Places the account id in the low 16 bytes of the 20-byte address.
pub struct MockExecutionAddress;

impl Convert<AccountId, ExecutionAddress> for MockExecutionAddress {
  fn convert(who: AccountId) -> ExecutionAddress {
    let mut address = [0u8; 20];
    address[4..].copy_from_slice(&who.to_be_bytes());
    address
  }
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    ServiceContract: pallet_service_contract,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

ord_parameter_types! {
  pub const EntrypointAccount: AccountId = ENTRYPOINT;
}

parameter_types! {
  pub const ServiceContractPalletId: PalletId = PalletId(*SERVICE_CONTRACT_PALLET_ID);
  pub const ServicePeriod: u64 = SERVICE_PERIOD;
  pub const MaxExitDateIncrement: u64 = MAX_EXIT_DATE_INCREMENT;
  pub const DefaultMinExitBalance: Balance = DEFAULT_MIN_EXIT_BALANCE;
  pub static MaxPayloadWeight: Weight = DEFAULT_MAX_PAYLOAD_WEIGHT;
}

pub const DEFAULT_MAX_PAYLOAD_WEIGHT: Weight = Weight::from_parts(1_000_000_000, 65_536);

impl pallet_service_contract::Config for Test {
  type Currency = Balances;
  type TokenId = TokenId;
  type Entrypoint = MockEntrypoint;
  type DepositContract = MockDepositContract;
  type OperationExecutor = MockExecutor;
  type ExecutionAddress = MockExecutionAddress;
  type TimeProvider = MockTime;
  type EntrypointOrigin = EnsureSignedBy<EntrypointAccount, AccountId>;
  type AdminOrigin = EnsureRoot<AccountId>;
  type PalletId = ServiceContractPalletId;
  type MaxOperations = ConstU32<4>;
  type MaxPayloadLen = ConstU32<256>;
  type MaxPayloadWeight = MaxPayloadWeight;
  type MaxDescriptionLen = ConstU32<64>;
  type ServicePeriod = ServicePeriod;
  type MaxExitDateIncrement = MaxExitDateIncrement;
  type DefaultMinExitBalance = DefaultMinExitBalance;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, TokenId> for MockBenchmarkHelper {
  fn token_id(seed: u32) -> TokenId {
    seed
  }

  fn set_operator(who: &AccountId) {
    set_operator(*who);
  }

  fn set_holder(who: &AccountId, token_id: &TokenId) {
    set_token_owner(*token_id, *who);
  }

  fn deposit_contract() -> AccountId {
    DEPOSIT_CONTRACT
  }
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  set_operator(OPERATOR);
  set_now(GENESIS_TIME);
  set_deposit_shortfall(0);
  MaxPayloadWeight::set(DEFAULT_MAX_PAYLOAD_WEIGHT);
  TOKEN_OWNERS.with(|o| o.borrow_mut().clear());
  TOKEN_APPROVALS.with(|a| a.borrow_mut().clear());
  DEPOSITS.with(|d| d.borrow_mut().clear());
  EXECUTED_OPERATIONS.with(|e| e.borrow_mut().clear());
  REENTRY_TARGET.with(|t| *t.borrow_mut() = None);
  REENTRY_RESULT.with(|r| *r.borrow_mut() = None);

  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();
  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ENTRYPOINT, 1_000 * ETH),
      (HOLDER, 10 * ETH),
      (OPERATOR, ETH),
      (REWARDS, 1_000 * ETH),
    ],
    ..Default::default()
  }
  .assimilate_storage(&mut t)
  .unwrap();
  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| System::set_block_number(1));
  ext
}

/// Creates a service contract for `token_id` owned by `HOLDER` at the default
/// commission rate, returning its id.
pub fn initialize_service(token_id: TokenId) -> ServiceId {
  initialize_service_with_rate(token_id, primitives::params::DEFAULT_COMMISSION_RATE)
}

pub fn initialize_service_with_rate(token_id: TokenId, rate: Permill) -> ServiceId {
  set_token_owner(token_id, HOLDER);
  let service_id = crate::NextServiceId::<Test>::get();
  ServiceContract::initialize(
    RuntimeOrigin::signed(ENTRYPOINT),
    token_id,
    rate,
    PUBKEY,
    SIGNATURE,
    DATA_ROOT,
    DEPOSIT_CONTRACT,
  )
  .unwrap();
  service_id
}

/// Simulates consensus-layer funds (rewards or exit balance) arriving on a service contract.
pub fn credit(service_id: ServiceId, amount: Balance) {
  Balances::transfer(
    &REWARDS,
    &ServiceContract::service_account(service_id),
    amount,
    Preservation::Expendable,
  )
  .unwrap();
}

pub fn balance_of(who: AccountId) -> Balance {
  <Balances as polkadot_sdk::frame_support::traits::fungible::Inspect<AccountId>>::balance(&who)
}
