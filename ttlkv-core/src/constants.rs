//! Defaults shared by the engine, the HTTP adapter and the CLI.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// How often the background sweeper scans the store for expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Default capacity bound of the store.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Upper bound applied to every TTL (~100 years).
/// Keeps `now + ttl` from overflowing the monotonic clock.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Largest request body the adapter will read (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Server URL the CLI talks to when none is given.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
