pub mod confidence;
pub mod derive;
pub mod similarity;
pub mod ticket;

pub use confidence::{ConfidenceTier, confidence_tier};
pub use derive::derive;
pub use similarity::cosine_similarity;
pub use ticket::{Category, Comment, RawIssue, SupportLevel, Ticket, TicketState};
