pub mod etl;
pub mod notifier;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod template;

pub use crate::domain::model::{BatchResultSet, CodeRecord, RawResult};
pub use crate::domain::ports::{
    ConfigProvider, LookupProvider, MailTransport, OutgoingMail, Pipeline, Storage,
};
pub use crate::utils::error::Result;
