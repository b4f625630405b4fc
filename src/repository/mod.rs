mod error;

pub use error::RepositoryError;
