//! Telegram transport: long-polls updates and feeds text messages to the
//! dispatch worker.

pub mod bot;
pub mod chunk;

pub use {
    bot::run,
    chunk::{TELEGRAM_MAX_MESSAGE_LEN, split_reply},
};
