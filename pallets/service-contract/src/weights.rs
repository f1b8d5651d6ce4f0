#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn initialize() -> Weight;
  fn end_operator_services() -> Weight;
  fn update_exit_date() -> Weight;
  fn operator_claim() -> Weight;
  fn withdraw_to() -> Weight;
  fn submit_transaction(o: u32) -> Weight;
  fn confirm_transaction() -> Weight;
  fn cancel_transaction() -> Weight;
  fn execute_transaction(o: u32) -> Weight;
  fn set_min_exit_balance() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn initialize() -> Weight {
    Weight::from_parts(95_000_000, 6196)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(7))
  }
  fn end_operator_services() -> Weight {
    Weight::from_parts(40_000_000, 3593)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(1))
  }
  fn update_exit_date() -> Weight {
    Weight::from_parts(20_000_000, 3593)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(1))
  }
  fn operator_claim() -> Weight {
    Weight::from_parts(55_000_000, 6196)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(3))
  }
  fn withdraw_to() -> Weight {
    Weight::from_parts(60_000_000, 6196)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(3))
  }
  fn submit_transaction(o: u32) -> Weight {
    Weight::from_parts(30_000_000, 4000)
      .saturating_add(Weight::from_parts(1_500_000, 0).saturating_mul(o.into()))
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(3))
  }
  fn confirm_transaction() -> Weight {
    Weight::from_parts(25_000_000, 4000)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(1))
  }
  fn cancel_transaction() -> Weight {
    Weight::from_parts(35_000_000, 4000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(4))
  }
  fn execute_transaction(o: u32) -> Weight {
    Weight::from_parts(40_000_000, 6196)
      .saturating_add(Weight::from_parts(45_000_000, 2603).saturating_mul(o.into()))
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(o.into())))
      .saturating_add(T::DbWeight::get().writes(1))
      .saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(o.into())))
  }
  fn set_min_exit_balance() -> Weight {
    Weight::from_parts(10_000_000, 1000)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn initialize() -> Weight {
    Weight::from_parts(95_000_000, 6196)
  }
  fn end_operator_services() -> Weight {
    Weight::from_parts(40_000_000, 3593)
  }
  fn update_exit_date() -> Weight {
    Weight::from_parts(20_000_000, 3593)
  }
  fn operator_claim() -> Weight {
    Weight::from_parts(55_000_000, 6196)
  }
  fn withdraw_to() -> Weight {
    Weight::from_parts(60_000_000, 6196)
  }
  fn submit_transaction(o: u32) -> Weight {
    Weight::from_parts(30_000_000, 4000)
      .saturating_add(Weight::from_parts(1_500_000, 0).saturating_mul(o.into()))
  }
  fn confirm_transaction() -> Weight {
    Weight::from_parts(25_000_000, 4000)
  }
  fn cancel_transaction() -> Weight {
    Weight::from_parts(35_000_000, 4000)
  }
  fn execute_transaction(o: u32) -> Weight {
    Weight::from_parts(40_000_000, 6196)
      .saturating_add(Weight::from_parts(45_000_000, 2603).saturating_mul(o.into()))
  }
  fn set_min_exit_balance() -> Weight {
    Weight::from_parts(10_000_000, 1000)
  }
}
