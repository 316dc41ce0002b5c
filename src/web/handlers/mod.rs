pub mod message_handlers;
pub mod popup_handlers;
pub mod system_handlers;

pub use message_handlers::*;
pub use popup_handlers::*;
pub use system_handlers::*;
