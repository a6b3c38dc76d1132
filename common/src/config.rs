// Protocol constants
//
// These values mirror the deployed scheduler contracts. Any change here
// must follow a contract upgrade, otherwise the client computes windows,
// endowments or buckets the contracts disagree with.

pub const VERSION: &str = env!("BUILD_VERSION");

// 18 decimals native currency
pub const COIN_DECIMALS: u8 = 18;
// 1 000 000 000 000 000 000 wei to represent 1 ether
pub const COIN_VALUE: u64 = 10u64.pow(COIN_DECIMALS as u32);
// 1 gwei in wei
pub const GWEI: u64 = 1_000_000_000;

// ===== EXECUTION =====

// Gas units consumed by the execution path of the request itself
// (checks, payments, events), on top of the call gas of the user
pub const EXECUTION_GAS_OVERHEAD: u64 = 180_000;

// Gas limit attached to the scheduling transaction
pub const SCHEDULE_TRANSACTION_GAS: u64 = 600_000;

// ===== SCHEDULING DEFAULTS =====

// 0.01 ether
pub const DEFAULT_BOUNTY: u64 = COIN_VALUE / 100;
// 30 gwei
pub const DEFAULT_GAS_PRICE: u64 = 30 * GWEI;
// Plain value transfer
pub const DEFAULT_CALL_GAS: u64 = 21_000;
pub const DEFAULT_CALL_VALUE: u64 = 0;
pub const DEFAULT_FEE: u64 = 0;
pub const DEFAULT_REQUIRED_DEPOSIT: u64 = 0;

// ===== WINDOWS (blocks) =====

pub const MINIMUM_WINDOW_SIZE_BLOCK: u64 = 16;
pub const CLAIM_WINDOW_SIZE_BLOCK: u64 = 255;
pub const FREEZE_PERIOD_BLOCK: u64 = 10;
pub const RESERVED_WINDOW_SIZE_BLOCK: u64 = 16;

// ===== WINDOWS (seconds) =====

// 5 minutes
pub const MINIMUM_WINDOW_SIZE_TIMESTAMP: u64 = 5 * 60;
// 60 minutes
pub const CLAIM_WINDOW_SIZE_TIMESTAMP: u64 = 60 * 60;
// 3 minutes
pub const FREEZE_PERIOD_TIMESTAMP: u64 = 3 * 60;
// 5 minutes
pub const RESERVED_WINDOW_SIZE_TIMESTAMP: u64 = 5 * 60;

// ===== BUCKETS =====

// Bucket sizes used by the request factory to index requests by window start
pub const BUCKET_SIZE_BLOCK: u64 = 240;
pub const BUCKET_SIZE_TIMESTAMP: u64 = 3600;

// ===== PERCENTAGES =====

// Payment modifiers are expressed in percent
pub const PAYMENT_MODIFIER_SCALE: u64 = 100;

// Static checks
const _: () = assert!(
    RESERVED_WINDOW_SIZE_BLOCK <= 2 * MINIMUM_WINDOW_SIZE_BLOCK,
    "Default reserved window must fit in the default block window"
);
const _: () = assert!(
    RESERVED_WINDOW_SIZE_TIMESTAMP <= 2 * MINIMUM_WINDOW_SIZE_TIMESTAMP,
    "Default reserved window must fit in the default timestamp window"
);
