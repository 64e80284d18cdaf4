pub mod diagnostics;
pub mod records;
pub mod writer;

pub use diagnostics::{Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use records::{InteractionMetadata, InteractionRecord, RatingRecord};
pub use writer::{SheetsLogger, DEFAULT_MAX_ATTEMPTS};
