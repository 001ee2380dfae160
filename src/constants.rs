// Fixed strings and defaults shared by the widget, the CLI and the renderer.

/// Chat endpoint used when neither `--endpoint` nor `CHAT_ENDPOINT` is set.
pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:8000/chat";

/// The only text a user ever sees when a send fails.
pub const SEND_FAILED_REPLY: &str = "Error: No se pudo conectar con el servidor.";

pub const DEFAULT_LOG_FILE: &str = "comex-chat.log";
pub const DEFAULT_LOG_FILTER: &str = "comex_chat=info";

// UI copy
pub const WINDOW_TITLE: &str = "Mi Chatbot";
pub const INPUT_PLACEHOLDER: &str = "Escribe tu mensaje...";
pub const SEND_LABEL: &str = "Enviar";
pub const USER_LABEL: &str = "Tú";
pub const BOT_LABEL: &str = "Bot";

/// How often the event loop wakes up to drain completed sends.
pub const TICK_MILLIS: u64 = 100;
