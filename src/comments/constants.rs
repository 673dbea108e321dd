//! Shared constants for comment validation and pagination limits.
//!
//! These limits are applied on the client side so oversized payloads are
//! rejected before a round trip; a conforming backend enforces the same
//! values.

// =============================================================================
// Content Size Limits
// =============================================================================

/// Maximum comment body size across all paragraphs (10 KB).
pub const MAX_COMMENT_BODY_SIZE: usize = 10 * 1024;

/// Maximum number of paragraphs in a comment body.
pub const MAX_PARAGRAPH_COUNT: usize = 100;

// =============================================================================
// Pagination Limits
// =============================================================================

/// Default number of top-level comments per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Maximum number of top-level comments per page.
pub const MAX_PAGE_SIZE: usize = 100;

/// Default number of replies returned inline per reply thread.
pub const DEFAULT_REPLY_PAGE_SIZE: usize = 10;

/// Maximum number of replies per reply-thread page.
pub const MAX_REPLY_PAGE_SIZE: usize = 50;
