//! Fixed request parameters for the vision analysis call.

/// Model used for every analysis request.
pub const MODEL: &str = "gpt-4o-mini";

/// Response budget. Results render in a single overlay window, so there is
/// no value in letting the model run long.
pub const MAX_TOKENS: u32 = 500;

/// Instruction sent alongside every screenshot.
pub const ANALYSIS_PROMPT: &str =
    "Look at this screenshot and provide a concise solution to the problem it shows.";
