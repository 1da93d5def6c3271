use solana_program::program_error::ProgramError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Custom program errors. The discriminant is the `ProgramError::Custom` code
/// surfaced to clients, so variants must only ever be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StakeError {
    #[error("Derived address or signer mismatch")]
    Unauthorized = 0,
    #[error("Account already initialized")]
    AlreadyInitialized = 1,
    #[error("Token account mint does not match the pool")]
    MintMismatch = 2,
    #[error("Amount must be greater than zero")]
    InvalidAmount = 3,
    #[error("Insufficient balance in the user token account")]
    InsufficientUserBalance = 4,
    #[error("Insufficient balance in the custody vault")]
    InsufficientVaultBalance = 5,
    #[error("Insufficient staked balance")]
    InsufficientStakedBalance = 6,
    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7,
    #[error("Clock moved backwards since the last checkpoint")]
    ClockRegression = 8,
    #[error("Invalid instruction discriminator")]
    InvalidInstruction = 9,
    #[error("Account not initialized")]
    NotInitialized = 10,
    #[error("Account not writable")]
    AccountNotWritable = 11,
    #[error("Invalid account owner")]
    InvalidOwner = 12,
    #[error("User stake still holds stake or unclaimed reward")]
    StakeAccountNotEmpty = 13,
    #[error("Stake would exceed the pool cap")]
    StakeCapExceeded = 14,
}

impl From<StakeError> for ProgramError {
    fn from(e: StakeError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
