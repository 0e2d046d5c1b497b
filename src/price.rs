// Entry fee conversion from a USD target into lamports
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
};
use std::convert::TryFrom;

use crate::constants::NATIVE_DECIMALS;
use crate::error::LotteryError;

/// USD value of one native unit, scaled by `10^decimals`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    pub value: i64,
    pub decimals: u32,
}

impl Price {
    pub fn new(value: i64, decimals: u32) -> Self {
        Self { value, decimals }
    }
}

/// Converts a whole-USD fee into lamports at the given price.
///
/// `lamports = usd_fee * 10^NATIVE_DECIMALS * 10^decimals / price`, rounded down.
/// A non-positive price, or one so large the fee rounds to zero lamports, is
/// rejected with `InvalidPrice`.
pub fn convert_fee_to_native(usd_fee: u64, price: Price) -> Result<u64, LotteryError> {
    if price.value <= 0 {
        return Err(LotteryError::InvalidPrice);
    }

    let exponent = NATIVE_DECIMALS
        .checked_add(price.decimals)
        .ok_or(LotteryError::ArithmeticOverflow)?;
    let scale = 10u128
        .checked_pow(exponent)
        .ok_or(LotteryError::ArithmeticOverflow)?;
    let native = (usd_fee as u128)
        .checked_mul(scale)
        .ok_or(LotteryError::ArithmeticOverflow)?
        / price.value as u128;

    if native == 0 {
        return Err(LotteryError::InvalidPrice);
    }

    u64::try_from(native).map_err(|_| LotteryError::ArithmeticOverflow)
}

/// Price feed account read when a round opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFeed {
    pub is_initialized: bool,
    pub price: i64,
    pub decimals: u8,
}

impl PriceFeed {
    pub fn price(&self) -> Price {
        Price::new(self.price, self.decimals as u32)
    }
}

impl Sealed for PriceFeed {}

impl IsInitialized for PriceFeed {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for PriceFeed {
    const LEN: usize = 1 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, PriceFeed::LEN];
        let (is_initialized, price, decimals) = array_refs![src, 1, 8, 1];

        Ok(PriceFeed {
            is_initialized: is_initialized[0] != 0,
            price: i64::from_le_bytes(*price),
            decimals: decimals[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, PriceFeed::LEN];
        let (is_initialized_dst, price_dst, decimals_dst) = mut_array_refs![dst, 1, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *price_dst = self.price.to_le_bytes();
        decimals_dst[0] = self.decimals;
    }
}
