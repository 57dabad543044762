pub mod adena;
pub mod config;
pub mod notify;

pub use adena::AdenaAdapter;
pub use config::{ConnectorConfig, RuntimeProfile};
pub use notify::{Toast, ToastQueue, TracingNotificationSink};
