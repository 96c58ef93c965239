//! Stable error-code constants.
//!
//! Every error message carries its code inline (e.g. `[SDKIFY_TFM_001]`) so
//! logs stay greppable even after messages are reworded. The constants here
//! are the machine-readable side, returned by each error type's `code()`.

pub const MONIKER_UNKNOWN: &str = "SDKIFY_TFM_001";

pub const EVAL_INTERNAL: &str = "SDKIFY_EVAL_001";

pub const BASELINE_EVALUATION: &str = "SDKIFY_BASE_001";

pub const CONVERT_MALFORMED: &str = "SDKIFY_CONV_001";
pub const CONVERT_AMBIGUOUS_ITEM: &str = "SDKIFY_CONV_002";

pub const XML_MALFORMED: &str = "SDKIFY_XML_001";
pub const XML_UNEXPECTED_STRUCTURE: &str = "SDKIFY_XML_002";
pub const XML_WRITE: &str = "SDKIFY_XML_003";
