//! Default timeouts for terraform invocations that accept one.
//!
//! `apply` and `destroy` have no entry here; they run for as long
//! as the surrounding test framework allows.

/// `terraform validate -json`.
pub const DEFAULT_VALIDATE_TIMEOUT_MS: u64 = 120_000;

/// `terraform show -json <planfile>`.
pub const DEFAULT_SHOW_TIMEOUT_MS: u64 = 120_000;
