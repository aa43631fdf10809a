pub mod calendar;
pub mod config;
pub mod error;
pub mod meals;
pub mod reconcile;
pub mod state;
pub mod storage;
