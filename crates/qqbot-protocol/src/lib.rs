pub mod action;
pub mod events;

pub use action::{ActionResponse, ForwardNode, ForwardNodeData};
pub use events::{EventEnvelope, GroupMessageEvent, GroupRecallNotice, PrivateMessageEvent, Sender};
