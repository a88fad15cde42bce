//! Usage events are kept in a single keyed record, [usage_log::STORE_KEY], inside the data
//! directory. The record is a JSON array in chronological order and is only ever replaced as a
//! whole, see [usage_log::JsonUsageLog].

pub mod entities;
pub mod usage_log;
