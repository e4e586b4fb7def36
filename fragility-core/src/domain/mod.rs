//! Domain types: date-indexed tables, the weekly calendar, filing records.

pub mod calendar;
pub mod filing;
pub mod frame;
pub mod series;

pub use calendar::{week_ending_friday, weekly_fridays};
pub use filing::{FilingSignal, STANDARDIZED_METRICS};
pub use frame::Frame;
pub use series::Series;
