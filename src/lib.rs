//! renamebot: a Telegram bot that takes an uploaded file and a new base
//! name, and sends the same bytes back under that name with the original
//! extension.
//!
//! - [`bot`]: flow controller (upload -> name -> delivery)
//! - [`session`]: pending uploads, clock and expiry sweeper
//! - [`rename`]: name validation and sanitizing
//! - [`telegram`]: Bot API transport
//! - [`server`]: long polling and restart supervision

pub mod bot;
pub mod config;
pub mod error;
pub mod rename;
pub mod server;
pub mod session;
pub mod telegram;
