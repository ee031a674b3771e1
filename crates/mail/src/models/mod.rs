//! Domain models for mail entities

mod label;
mod message;
mod thread;

pub use label::{Label, LabelId, label_names, label_sort_order};
pub use message::{BodyPart, EmailAddress, Header, Message, MessageBuilder, MessageId, parse_date};
pub use thread::{Thread, ThreadId, ThreadSummary};
