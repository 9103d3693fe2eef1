pub mod input_bar;
pub mod message_list;
pub mod source_panel;

pub use input_bar::InputBar;
pub use message_list::MessageList;
pub use source_panel::SourcePanel;
