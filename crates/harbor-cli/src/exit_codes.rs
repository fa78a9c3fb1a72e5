//! Process exit codes
//!
//! Values are part of the resource's interface: pipelines and wrappers match
//! on them, so they never change between releases. Every code fits in the
//! 8 bits a Unix parent actually sees.

#![allow(dead_code)]

/// Success
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure, IO
pub const ERROR: i32 = 1;

/// Usage error - invalid arguments (clap's own code)
pub const USAGE_ERROR: i32 = 2;

/// Internal software error (sysexits `EX_SOFTWARE`)
pub const INTERNAL: i32 = 70;

/// Bad configuration, e.g. an unusable server URL (sysexits `EX_CONFIG`)
pub const CONFIG: i32 = 78;

// ============ Request ============
pub const INVALID_REQUEST: i32 = 100;

// ============ Version Resolution ============
pub const VERSION_RANGE_VIOLATION: i32 = 104;

// ============ Chart Build ============
pub const CHART_NOT_FOUND: i32 = 110;
pub const CHART_MANIFEST_INVALID: i32 = 111;
pub const INSPECT_FAILED: i32 = 120;
pub const DEPENDENCY_BUILD_FAILED: i32 = 121;
pub const PACKAGING_FAILED: i32 = 122;
pub const VERSION_UNRESOLVABLE: i32 = 123;
pub const UPLOAD_FAILED: i32 = 124;
pub const REPO_ADD_FAILED: i32 = 125;
pub const ARCHIVE_MISSING: i32 = 126;

// ============ Signing ============
pub const MISSING_SIGNING_KEY: i32 = 132;
pub const GPG_IMPORT_FAILED: i32 = 133;
pub const KEY_ID_NOT_FOUND: i32 = 134;
pub const KEY_EXPORT_FAILED: i32 = 135;

// ============ Upload Response ============
pub const MALFORMED_UPLOAD_RESPONSE: i32 = 161;
pub const SERVER_REPORTED_ERROR: i32 = 162;
pub const NOT_PERSISTED: i32 = 163;

// ============ Verification ============
pub const VERSION_MISMATCH: i32 = 203;

// ============ Chart Retrieval ============
pub const POST_UPLOAD_FETCH_FAILED: i32 = 210;
pub const MALFORMED_CHART_METADATA: i32 = 211;
pub const DOWNLOAD_FAILED: i32 = 220;

// ============ Upload Rejected ============
/// Base of the band reserved for rejected uploads: 241..=245 carry the
/// HTTP status class, 249 any status outside 100..=599.
pub const UPLOAD_REJECTED_BASE: i32 = 240;
pub const UPLOAD_REJECTED_OTHER: i32 = 249;

/// Exit code for an upload the server answered with a non-success status
pub fn upload_rejected(status: u16) -> i32 {
    match status {
        100..=599 => UPLOAD_REJECTED_BASE + i32::from(status / 100),
        _ => UPLOAD_REJECTED_OTHER,
    }
}

/// Every fixed failure code, in table order
pub const FAILURES: &[i32] = &[
    ERROR,
    USAGE_ERROR,
    INTERNAL,
    CONFIG,
    INVALID_REQUEST,
    VERSION_RANGE_VIOLATION,
    CHART_NOT_FOUND,
    CHART_MANIFEST_INVALID,
    INSPECT_FAILED,
    DEPENDENCY_BUILD_FAILED,
    PACKAGING_FAILED,
    VERSION_UNRESOLVABLE,
    UPLOAD_FAILED,
    REPO_ADD_FAILED,
    ARCHIVE_MISSING,
    MISSING_SIGNING_KEY,
    GPG_IMPORT_FAILED,
    KEY_ID_NOT_FOUND,
    KEY_EXPORT_FAILED,
    MALFORMED_UPLOAD_RESPONSE,
    SERVER_REPORTED_ERROR,
    NOT_PERSISTED,
    VERSION_MISMATCH,
    POST_UPLOAD_FETCH_FAILED,
    MALFORMED_CHART_METADATA,
    DOWNLOAD_FAILED,
];
