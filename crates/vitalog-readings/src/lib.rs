//! Blood-pressure readings for Vitalog.
//!
//! Everything the server does with a user's readings once it knows who
//! the user is: storing them, classifying them, summarizing them and
//! exporting them.
//!
//! # Key types
//!
//! - [`ReadingStore`]: per-user persistence (with [`InMemoryReadingStore`])
//! - [`BloodPressureCategory`] / [`HeartRateCategory`]: classification
//! - [`Dashboard`]: the 30-day summary, latest readings and alerts
//! - [`HistoryFilter`]: period, range and text filtering
//! - [`to_csv`]: CSV export

mod category;
mod dashboard;
mod error;
mod export;
mod filter;
mod store;

pub use category::{BloodPressureCategory, HeartRateCategory};
pub use dashboard::{
    ClassifiedReading, DASHBOARD_WINDOW_DAYS, Dashboard, DashboardStats, HeartRateAlert,
    HeartRateBands, LATEST_COUNT, summarize,
};
pub use error::ReadingError;
pub use export::to_csv;
pub use filter::{DATE_DISPLAY_FORMAT, HistoryFilter, Period};
pub use store::{InMemoryReadingStore, ReadingStore};
