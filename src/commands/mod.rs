// CLI subcommand implementations

pub mod ask;
pub mod chat;
mod chat_helper;
pub mod config;
