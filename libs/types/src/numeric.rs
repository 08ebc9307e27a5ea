//! 256-bit unsigned amounts
//!
//! Balances, capacity and withdrawal limits are all whole units held in a
//! `U256`. Arithmetic on ledger state goes through the checked operations
//! (`checked_add`, `checked_sub`) so an out-of-range result is observable
//! instead of wrapping or panicking.
//!
//! Amounts serialize as decimal strings, so JSON and TOML consumers never
//! lose precision. Deserialization also accepts plain non-negative integers.

// Allow clippy warnings from the uint crate's construct_uint macro
#![allow(clippy::manual_div_ceil)]
#![allow(clippy::assign_op_pattern)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uint::construct_uint;

use crate::errors::NumericError;

construct_uint! {
    /// 256-bit unsigned integer used for every ledger quantity.
    pub struct U256(4);
}

impl U256 {
    /// Parse a decimal string such as `"1000"`.
    ///
    /// Surrounding whitespace is ignored. Empty input, signs, fractional
    /// parts and values of 2^256 or more are rejected.
    pub fn parse_amount(input: &str) -> Result<Self, NumericError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NumericError::InvalidAmount {
                input: input.to_string(),
            });
        }
        U256::from_dec_str(trimmed).map_err(|_| NumericError::InvalidAmount {
            input: input.to_string(),
        })
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> serde::de::Visitor<'de> for AmountVisitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative decimal integer or decimal string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<U256, E> {
                U256::parse_amount(v).map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<U256, E> {
                Ok(U256::from(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<U256, E> {
                if v < 0 {
                    return Err(E::custom(NumericError::Negative { value: v }));
                }
                Ok(U256::from(v as u64))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
