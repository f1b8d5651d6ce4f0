#![cfg(feature = "runtime-benchmarks")]

extern crate alloc;

use crate::*;
use alloc::{vec, vec::Vec};
use frame::deps::frame_support::traits::{EnsureOrigin, fungible::{Inspect, Mutate}};
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;
use primitives::{
  Balance,
  params::{ETH, FULL_DEPOSIT},
};

const SEED: u32 = 0;

#[benchmarks]
mod benches {
  use super::*;

  struct Setup<T: Config> {
    service_id: ServiceId,
    entrypoint: T::AccountId,
    holder: T::AccountId,
    operator: T::AccountId,
  }

  fn entrypoint_origin<T: Config>() -> (T::RuntimeOrigin, T::AccountId) {
    let origin = T::EntrypointOrigin::try_successful_origin().expect("entrypoint origin exists");
    let who = T::EntrypointOrigin::ensure_origin(origin.clone()).expect("origin just built");
    T::Currency::set_balance(&who, 2 * FULL_DEPOSIT);
    (origin, who)
  }

  fn active_service<T: Config>() -> Setup<T> {
    let (origin, entrypoint) = entrypoint_origin::<T>();
    let operator: T::AccountId = account("operator", 0, SEED);
    let holder: T::AccountId = account("holder", 0, SEED);
    let token_id = T::BenchmarkHelper::token_id(0);
    T::BenchmarkHelper::set_operator(&operator);
    T::BenchmarkHelper::set_holder(&holder, &token_id);
    let service_id = NextServiceId::<T>::get();
    Pallet::<T>::initialize(
      origin,
      token_id,
      Permill::from_percent(10),
      [1u8; 48],
      [2u8; 96],
      [3u8; 32],
      T::BenchmarkHelper::deposit_contract(),
    )
    .expect("initialize failed");
    Setup {
      service_id,
      entrypoint,
      holder,
      operator,
    }
  }

  fn exited_service<T: Config>(balance: Balance) -> Setup<T> {
    let setup = active_service::<T>();
    T::Currency::set_balance(&Pallet::<T>::service_account(setup.service_id), balance);
    Pallet::<T>::end_operator_services(
      RawOrigin::Signed(setup.holder.clone()).into(),
      setup.service_id,
    )
    .expect("exit failed");
    setup
  }

  fn transfer_operations<T: Config>(count: u32) -> OperationsOf<T> {
    let value = T::Currency::minimum_balance();
    let operations: Vec<OperationOf<T>> = (0..count)
      .map(|i| Operation {
        destination: account("recipient", i, SEED),
        value,
        payload: BoundedVec::default(),
      })
      .collect();
    BoundedVec::try_from(operations).unwrap_or_default()
  }

  fn submit<T: Config>(setup: &Setup<T>, count: u32) -> TxIndex {
    let index = Pallet::<T>::transaction_count(setup.service_id);
    Pallet::<T>::submit_transaction(
      RawOrigin::Signed(setup.operator.clone()).into(),
      setup.service_id,
      transfer_operations::<T>(count),
      BoundedVec::default(),
    )
    .expect("submit failed");
    index
  }

  #[benchmark]
  fn initialize() {
    let (origin, _) = entrypoint_origin::<T>();
    let holder: T::AccountId = account("holder", 0, SEED);
    let token_id = T::BenchmarkHelper::token_id(0);
    T::BenchmarkHelper::set_holder(&holder, &token_id);
    let deposit_contract = T::BenchmarkHelper::deposit_contract();

    #[extrinsic_call]
    _(
      origin as T::RuntimeOrigin,
      token_id,
      Permill::from_percent(10),
      [1u8; 48],
      [2u8; 96],
      [3u8; 32],
      deposit_contract,
    );

    assert_eq!(Pallet::<T>::lifecycle_state(0), Some(Lifecycle::Active));
  }

  #[benchmark]
  fn end_operator_services() {
    let setup = active_service::<T>();
    T::Currency::set_balance(
      &Pallet::<T>::service_account(setup.service_id),
      33 * ETH,
    );

    #[extrinsic_call]
    _(RawOrigin::Signed(setup.holder.clone()), setup.service_id);

    assert_eq!(
      Pallet::<T>::lifecycle_state(setup.service_id),
      Some(Lifecycle::Exited)
    );
  }

  #[benchmark]
  fn update_exit_date() {
    let setup = active_service::<T>();
    let new_date = Pallet::<T>::exit_date(setup.service_id).unwrap_or_default() + 1;

    #[extrinsic_call]
    _(RawOrigin::Signed(setup.operator.clone()), setup.service_id, new_date);

    assert_eq!(Pallet::<T>::exit_date(setup.service_id), Some(new_date));
  }

  #[benchmark]
  fn operator_claim() {
    let setup = exited_service::<T>(33 * ETH);

    #[extrinsic_call]
    _(RawOrigin::Signed(setup.operator.clone()), setup.service_id);

    assert_eq!(Pallet::<T>::operator_claimable(setup.service_id), 0);
  }

  #[benchmark]
  fn withdraw_to() {
    let setup = exited_service::<T>(33 * ETH);
    let beneficiary: T::AccountId = account("beneficiary", 0, SEED);

    #[extrinsic_call]
    _(
      RawOrigin::Signed(setup.entrypoint.clone()),
      setup.service_id,
      beneficiary.clone(),
    );

    assert_eq!(T::Currency::balance(&beneficiary), 33 * ETH - ETH / 10);
  }

  #[benchmark]
  fn submit_transaction(o: Linear<1, { T::MaxOperations::get() }>) {
    let setup = active_service::<T>();
    submit::<T>(&setup, 1);
    let operations = transfer_operations::<T>(o);
    let description: DescriptionOf<T> =
      BoundedVec::try_from(vec![b'x'; T::MaxDescriptionLen::get() as usize]).unwrap_or_default();

    #[extrinsic_call]
    _(
      RawOrigin::Signed(setup.operator.clone()),
      setup.service_id,
      operations,
      description,
    );

    assert_eq!(Pallet::<T>::transaction_count(setup.service_id), 2);
  }

  #[benchmark]
  fn confirm_transaction() {
    let setup = active_service::<T>();
    let index = submit::<T>(&setup, 1);

    #[extrinsic_call]
    _(RawOrigin::Signed(setup.holder.clone()), setup.service_id, index);

    assert!(
      Transactions::<T>::get(setup.service_id, index).is_some_and(|tx| tx.confirmed)
    );
  }

  #[benchmark]
  fn cancel_transaction() {
    let setup = active_service::<T>();
    for _ in 0..3 {
      submit::<T>(&setup, 1);
    }

    // Interior entry: both neighbours are relinked.
    #[extrinsic_call]
    _(RawOrigin::Signed(setup.operator.clone()), setup.service_id, 1);

    assert_eq!(Pallet::<T>::transaction_chain(setup.service_id), vec![0, 2]);
  }

  #[benchmark]
  fn execute_transaction(o: Linear<1, { T::MaxOperations::get() }>) {
    let setup = active_service::<T>();
    T::Currency::set_balance(
      &Pallet::<T>::service_account(setup.service_id),
      33 * ETH,
    );
    let first = submit::<T>(&setup, 1);
    let index = submit::<T>(&setup, o);
    for i in [first, index] {
      Pallet::<T>::confirm_transaction(
        RawOrigin::Signed(setup.holder.clone()).into(),
        setup.service_id,
        i,
      )
      .expect("confirm failed");
    }
    Pallet::<T>::execute_transaction(
      RawOrigin::Signed(setup.operator.clone()).into(),
      setup.service_id,
      first,
    )
    .expect("execute failed");

    #[extrinsic_call]
    _(RawOrigin::Signed(setup.operator.clone()), setup.service_id, index);

    assert!(
      Transactions::<T>::get(setup.service_id, index).is_some_and(|tx| tx.executed)
    );
  }

  #[benchmark]
  fn set_min_exit_balance() {
    let origin = T::AdminOrigin::try_successful_origin().expect("admin origin exists");

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, 20 * ETH);

    assert_eq!(MinExitBalance::<T>::get(), 20 * ETH);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
