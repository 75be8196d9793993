pub mod domain;
pub mod error;
pub mod memory;
pub mod ports;
pub mod repository;
pub mod session;
pub mod summary;
pub mod text;
pub mod tokens;
pub mod traversal;
pub mod validation;

pub use domain::{
    Choice, ChoiceRecord, Journey, Letter, LetterConfig, Section, Summary, SummaryRecord,
    TextSize, TokenRecord,
};
pub use error::{LetterError, LetterResult};
pub use memory::MemoryStore;
pub use ports::{DenialReason, KeyValueStore, PortError, PortResult, TokenGate};
pub use repository::{LetterRepository, SummaryRepository};
pub use session::{Progress, ReadingService, ReadingSession};
pub use tokens::{IssuedToken, TokenRegistry};
pub use traversal::{SectionView, Step, TraversalError};
pub use validation::Violation;
