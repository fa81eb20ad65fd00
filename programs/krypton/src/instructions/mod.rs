pub mod guardians;
pub mod initialize_guard;
pub mod initialize_wallet;
pub mod recover_assets;
pub mod recovery;
pub mod transfer;
pub mod wrap;

pub mod address;
pub mod guard;
pub mod models;
pub mod schema;
pub mod state;
pub mod util;

pub use guardians::*;
pub use initialize_guard::*;
pub use initialize_wallet::*;
pub use models::*;
pub use recover_assets::*;
pub use recovery::*;
pub use state::*;
pub use transfer::*;
pub use wrap::*;

pub mod constant {
    pub const CURRENT_VERSION: u8 = 1;
    pub const MAX_GUARDIANS: usize = 10;
    pub const MIN_RECOVERY_THRESHOLD: u8 = 1;
    pub const MAX_RECOVERY_THRESHOLD: u8 = 10;
    /// Profiles a single profile can carry along as recovered.
    pub const MAX_RECOVERED_PROFILES: usize = 8;

    pub const PROFILE_SEED: &[u8] = b"profile";
    pub const GUARD_SEED: &[u8] = b"guard";
    pub const BUCKET_SEED: &[u8] = b"bucket";
}

pub mod errors {
    use anchor_lang::prelude::*;

    // Codes are part of the client contract. Append only.
    #[error_code(offset = 0)]
    pub enum ErrorCode {
        #[msg("Account should be writeable")]
        NotWriteable,
        #[msg("Account should not have 0 length data")]
        NoAccountLength,
        #[msg("Account should not have non-zero data")]
        NonZeroData,
        #[msg("Account should be signer")]
        NotSigner,
        #[msg("Account should be valid system program")]
        InvalidSysProgram,
        #[msg("There are too many guardians")]
        TooManyGuardians,
        #[msg("There are too few guardians passed in")]
        NotEnoughGuardians,
        #[msg("Specified amount of accounts are not passed in")]
        NotEnoughAccounts,
        #[msg("The Guardian provided is not in the data")]
        GuardianNotFound,
        #[msg("There are not enough guardian signatures to recover")]
        MissingGuardianSignatures,
        #[msg("Recovery Threshold must be between 1 to 10")]
        InvalidRecoveryThreshold,
        #[msg("The pubkey is not authorized to act on behalf of the wallet")]
        InvalidAuthority,
        #[msg("The pubkey is not authorized to recover the wallet")]
        NotAuthorizedToRecover,
        #[msg("Required recovered accounts are not passed in")]
        MissingRecoveredAccounts,
        #[msg("There is insufficient balance to transfer")]
        InsufficientFundsForTransaction,
        #[msg("Operation overflowed")]
        Overflow,
        #[msg("Invalid Account Address")]
        InvalidAccountAddress,
        #[msg("Invalid date time")]
        InvalidDateTime,
        #[msg("Target account not found")]
        TargetAccountNotFound,
        #[msg("Invalid target for guard")]
        InvalidGuardTarget,
        #[msg("Guard Context not found")]
        GuardContextNotFound,
        #[msg("Arithmetic Overflow")]
        ArithmeticOverflow,
        #[msg("Unknown instruction for protocol version")]
        UnknownInstruction,
    }
}

#[cfg(test)]
pub(crate) fn assert_err<T: std::fmt::Debug>(
    result: anchor_lang::Result<T>,
    code: errors::ErrorCode,
) {
    use anchor_lang::solana_program::program_error::ProgramError;

    let err = result.expect_err("expected an error");
    assert_eq!(ProgramError::from(err), ProgramError::Custom(code.into()));
}
