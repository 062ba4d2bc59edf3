use crate::types::DecimalError;

/// Why an event was discarded. Rejections never change state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("content is not a valid protocol object")]
    InvalidContent,
    #[error("unsupported operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid ticker")]
    InvalidTicker,
    #[error("5 byte ticker without self_mint before activation height")]
    SelfMintNotAllowed,
    #[error("ticker '{0}' is not enabled")]
    TickerNotEnabled(String),
    #[error("ticker '{0}' is already deployed")]
    TickerAlreadyDeployed(String),
    #[error("ticker '{0}' is not deployed")]
    TickerNotDeployed(String),
    #[error("invalid decimals")]
    InvalidDecimals,
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {error}")]
    InvalidAmount { field: &'static str, error: DecimalError },
    #[error("{0} must be positive")]
    ZeroAmount(&'static str),
    #[error("self mint requires the deploy inscription as parent")]
    SelfMintParentMismatch,
    #[error("amount exceeds the mint limit")]
    MintLimitExceeded,
    #[error("mint exceeds the remaining supply")]
    SupplyExceeded,
    #[error("insufficient available balance")]
    InsufficientBalance,
    #[error("inscription is not a pending transfer")]
    UnknownTransfer,
    #[error("transfer was already settled")]
    TransferAlreadySettled,
    #[error("module source does not match")]
    ModuleSourceMismatch,
    #[error("module '{0}' is already deployed")]
    ModuleAlreadyDeployed(String),
    #[error("module '{0}' is not deployed")]
    ModuleNotDeployed(String),
    #[error("commit is not inscribed by the module sequencer")]
    NotModuleSequencer,
    #[error("invalid commit item {index}: {reason}")]
    InvalidCommitItem { index: usize, reason: String },
}

/// Structural failures: the event was well formed but the indexer could not
/// apply it consistently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Brc20Error {
    #[error("deploy {0} has no max supply")]
    DeployMaxMissing(String),
    #[error("deploy {inscription_id}, but {reason}")]
    DeployFieldInvalid {
        inscription_id: String,
        reason: RejectReason,
    },
    #[error("ticker '{0}' already exists")]
    TickerExists(String),
    #[error("ticker '{0}' not found")]
    TickerNotFound(String),
    #[error("module '{0}' already exists")]
    ModuleExists(String),
    #[error("module '{0}' not found")]
    ModuleNotFound(String),
    #[error("pending transfer '{0}' not found")]
    PendingTransferNotFound(String),
    #[error("arithmetic error: {0}")]
    Decimal(#[from] DecimalError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Accepted,
    Rejected(RejectReason),
    Fatal(Brc20Error),
}

impl ProcessOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProcessOutcome::Accepted)
    }
}

/// Short-circuit type used inside processors so `?` works on both tiers.
#[derive(Debug)]
pub(crate) enum ProcessError {
    Rejected(RejectReason),
    Fatal(Brc20Error),
}

impl From<RejectReason> for ProcessError {
    fn from(reason: RejectReason) -> Self {
        ProcessError::Rejected(reason)
    }
}

impl From<Brc20Error> for ProcessError {
    fn from(error: Brc20Error) -> Self {
        ProcessError::Fatal(error)
    }
}

impl From<DecimalError> for ProcessError {
    fn from(error: DecimalError) -> Self {
        ProcessError::Fatal(Brc20Error::Decimal(error))
    }
}

impl From<Result<(), ProcessError>> for ProcessOutcome {
    fn from(result: Result<(), ProcessError>) -> Self {
        match result {
            Ok(()) => ProcessOutcome::Accepted,
            Err(ProcessError::Rejected(reason)) => ProcessOutcome::Rejected(reason),
            Err(ProcessError::Fatal(error)) => ProcessOutcome::Fatal(error),
        }
    }
}
