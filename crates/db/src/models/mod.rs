//! Row structs for the channel tables.
//!
//! Each row converts into the corresponding `orgnotify_core` record; the
//! timestamps stay in the database layer.

pub mod channel;
