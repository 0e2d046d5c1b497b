/// Decimal places of the native currency (1 SOL = 10^9 lamports)
pub const NATIVE_DECIMALS: u32 = 9;

/// Entries the on-chain lottery account is sized for
pub const MAX_ENTRIES: usize = 100;

pub const CONFIG_SEED: &[u8] = b"config";
pub const LOTTERY_SEED: &[u8] = b"lottery";
pub const REQUEST_SEED: &[u8] = b"request";

/// Networks where contracts resolve to locally deployed mocks
pub const LOCAL_NETWORKS: [&str; 3] = ["localnet", "development", "test-validator"];
