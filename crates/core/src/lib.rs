pub mod audit;
pub mod config;
pub mod currency;
pub mod dialog;
pub mod intent;
pub mod sentiment;
pub mod template;

pub use audit::{render_csv, AuditRecord, ChatRow, CSV_HEADER};
pub use currency::normalize;
pub use dialog::{DialogResponse, Entity, Intent, MessageInput, MessagePayload, OutputPayload};
pub use intent::IntentKind;
pub use sentiment::SentimentLabel;
pub use template::{substitute, TemplateParam};
