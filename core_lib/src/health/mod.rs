pub mod checks;
pub mod detail;
pub mod key;
pub mod report;
pub mod reporter;
mod sparse;
pub mod status;


pub use checks::Checks;
pub use detail::{ComponentDetail, ObservedValue};
pub use key::Key;
pub use report::{CheckOutcome, Health, ReportMetadata};
pub use reporter::{Checker, HealthReporter};
pub use status::Status;
