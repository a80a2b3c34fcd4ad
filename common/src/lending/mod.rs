use crate::UserObligation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("RPC error: {0}")]
    RpcError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("State decode error: {0}")]
    DeserializationError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Unknown staking contract: {0}")]
    UnknownStakingContract(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(u64),

    #[error("Historical state unavailable at round {0}")]
    HistoricalRoundUnavailable(u64),

    #[error("No storage account found for {0}")]
    NoStorageAccount(String),

    #[error("No oracle configured for asset {0}")]
    NoOracle(u64),

    #[error("Invalid transaction group: {0}")]
    InvalidGroup(String),

    #[error("Expected {expected} signers, got {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error("Operation {0} in the group is not signed")]
    UnsignedOperation(usize),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Transaction {tx_id} not confirmed after {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    #[error("Confirmation wait for {0} cancelled")]
    ConfirmationCancelled(String),

    #[error("Math overflow")]
    MathOverflow,

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

pub trait LendingClient<Address, MarketData> {
    /// Loads markets into the client's internal state
    fn load_markets(&mut self) -> Result<(), LendingError> {
        let data = self.fetch_markets()?;
        self.set_market_data(data);
        Ok(())
    }

    /// Fetches markets without modifying the client's state
    fn fetch_markets(&self) -> Result<MarketData, LendingError>;

    /// Updates the client's state with the fetched market data
    fn set_market_data(&mut self, data: MarketData);

    fn get_user_obligations(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<UserObligation>, LendingError>;

    fn program_id(&self) -> Address;

    fn protocol_name(&self) -> &'static str;

    fn print_markets(&self) {
        // Default empty implementation
    }
}
