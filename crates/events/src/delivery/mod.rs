//! External delivery transports.
//!
//! Both transports sit behind a trait so the dispatcher can be exercised
//! with in-memory fakes.

pub mod email;
pub mod webhook;
