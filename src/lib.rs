pub mod app_state;
pub mod chat;
pub mod config;
pub mod constants;
pub mod events;
pub mod ui;
pub mod ui_components;

pub use app_state::{ChatHistory, ChatUpdate, ChatWidget, Message, RequestId, Sender};
pub use chat::{ChatBackend, ChatError, ChatReply, ChatRequest, HealthStatus, HttpChatBackend};
pub use config::{ChatConfig, LogArgs};
