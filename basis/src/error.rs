use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BasisError {
    #[error("unknown basis set `{0}`")]
    UnknownBasis(String),

    #[error("basis set `{basis}` has no functions for element {symbol}")]
    MissingElement { basis: String, symbol: String },
}
