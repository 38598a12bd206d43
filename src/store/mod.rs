//! Typed persistence per entity. Every function takes the connection it
//! works on; callers own locking and transactions.

pub mod clients;
pub mod consumables;
pub mod finance;
pub mod job_records;
pub mod jobs;
pub mod settings;
pub mod staff;
