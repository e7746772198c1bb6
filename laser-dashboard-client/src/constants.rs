/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

/// End time shown for a session that has not finished yet.
pub const ONGOING: &str = "Ongoing";

/// Placeholder for total time and details when the server sent none.
pub const NOT_AVAILABLE: &str = "N/A";

/// Text of the placeholder row shown while the log table is empty.
pub const EMPTY_TABLE_TEXT: &str = "No data available yet";

/// Number of columns in the log table.
pub const LOG_COLUMNS: usize = 6;

/// Layout used for the receive time of records without a start time.
pub const RECEIVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Reconnection backoff, matching the Socket.IO client defaults.
pub const RECONNECT_MIN_MS: u64 = 1_000;
pub const RECONNECT_MAX_MS: u64 = 5_000;
pub const RECONNECT_FACTOR: u32 = 2;
pub const RECONNECT_JITTER: f64 = 0.5;

/// Liveness window used until the server handshake announces its own.
pub const DEFAULT_LIVENESS_MS: u64 = 45_000;

// Element ids of the HTML page the browser front end writes into.
pub const LOG_TABLE_ID: &str = "logDataTable";
pub const PART_FILE_ID: &str = "partFile";
pub const TECH_DATA_ID: &str = "techData";
pub const TOTAL_PART_COUNT_ID: &str = "totalPartCount";
pub const AVG_CUTTING_TIME_ID: &str = "avgCuttingTime";
pub const AVG_IDLE_TIME_ID: &str = "avgIdleTime";
