pub mod types;

pub use types::KycError;
