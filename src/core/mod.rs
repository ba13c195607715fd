//! Core conversion logic, rate caching and the converter session

pub mod cache;
pub mod clock;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod log;
pub mod session;

pub use cache::{KeyValueCollection, RateCache, Store};
pub use clock::{Clock, SystemClock};
pub use currency::{Currency, RateProvider, RateSnapshot};
pub use session::{ConverterSession, SessionState};
