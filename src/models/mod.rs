pub mod record;

pub use record::{ScanRecord, ShareBundle};

/// Scan records, newest first.
pub type RecordList = Vec<ScanRecord>;
