//! Terminal commands

pub mod convert;
pub mod currencies;
pub mod rates;
pub mod refresh;
pub mod setup;
pub mod ui;
pub mod watch;
