pub mod street;

pub use street::{CorrectionReport, StreetMatcher};
