use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("negative amount: {0}")]
    Negative(String),

    #[error("amount {value} has more than {scale} fractional digits")]
    TooPrecise { value: String, scale: u32 },

    #[error("amount overflows 256 bits: {0}")]
    Overflow(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credential could not be decoded: {0}")]
    Decode(String),

    #[error("credential carries an invalid private key")]
    InvalidKey,

    #[error("credential carries an invalid address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("{step} failed: {source:#}")]
    Chain {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl OrderError {
    pub fn chain(step: &'static str, source: anyhow::Error) -> Self {
        Self::Chain { step, source }
    }

    pub fn failed_step(&self) -> Option<&'static str> {
        match self {
            Self::Chain { step, .. } => Some(step),
            _ => None,
        }
    }
}
