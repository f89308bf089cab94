//! Error code constants

/// Prerequisite error codes (1000-1099)
pub const ERR_TOOL_NOT_FOUND: &str = "E-TFH-1001";
pub const ERR_PROVIDER_FILE: &str = "E-TFH-1002";

/// Configuration error codes (1100-1199)
pub const ERR_INVALID_CONFIG: &str = "E-TFH-1101";
pub const ERR_INVALID_CASE: &str = "E-TFH-1102";

/// Execution error codes (1200-1299)
pub const ERR_SPAWN: &str = "E-TFH-1201";
pub const ERR_EXIT: &str = "E-TFH-1202";
pub const ERR_TIMEOUT: &str = "E-TFH-1203";
pub const ERR_IO: &str = "E-TFH-1204";

/// Assertion error codes (1300-1399)
pub const ERR_PLAN_MISMATCH: &str = "E-TFH-1301";
pub const ERR_NOT_IDEMPOTENT: &str = "E-TFH-1302";

/// Decode error codes (1400-1499)
pub const ERR_DECODE: &str = "E-TFH-1401";
pub const ERR_MISSING_OUTPUT: &str = "E-TFH-1402";
