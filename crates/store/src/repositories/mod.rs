//! Typed repositories over the document store.

pub mod chat;
pub mod customers;
pub mod feedback;
pub mod orders;
pub mod products;

pub use chat::ChatRepository;
pub use customers::CustomerRepository;
pub use feedback::FeedbackRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
