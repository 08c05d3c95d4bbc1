use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("All notification identifiers have been used up")]
    IdentifiersExhausted,
}

pub type Result<T> = std::result::Result<T, Error>;
