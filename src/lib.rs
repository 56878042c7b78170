pub mod ai;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod i18n;
pub mod recovery;
pub mod storage;
