// src/types/mod.rs
pub mod candidate;
pub mod message;
pub mod response;
pub mod search_query;

pub use candidate::{CandidateProfile, EducationEntry, ExperienceEntry, RankedCandidate, RankingEntry};
pub use message::Message;
pub use response::Envelope;
pub use search_query::{ExperienceRange, SearchQuery};
