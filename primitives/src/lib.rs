#![cfg_attr(not(feature = "std"), no_std)]

pub mod ecosystem;
pub mod validator;

pub use ecosystem::*;
pub use validator::*;
