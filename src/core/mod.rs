//! Framework-agnostic marketplace operations.
//!
//! Every operation is an async function taking a database connection and the
//! acting user. Role and ownership checks happen at the top of each function.

pub mod cart;
pub mod community;
pub mod disease;
pub mod message;
pub mod notification;
pub mod order;
pub mod pos;
pub mod product;
pub mod review;
pub mod user;
pub mod weather;
