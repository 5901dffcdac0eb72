//! Marketplace services gated by the auth layer

pub mod flag;
pub mod listing;
pub mod message;
pub mod question;

pub use flag::FlagService;
pub use listing::ListingService;
pub use message::MessageService;
pub use question::QuestionService;
