use anchor_lang::prelude::*;

pub mod instructions;

declare_id!("2aJqX3GKRPAsfByeMkL7y9SqAGmCQEnakbuHJBdxGaDL");

#[program]
pub mod krypton {
    use super::*;
    pub use instructions::*;

    #[instruction(discriminator = [0])]
    pub fn initialize_wallet(ctx: Context<InitializeWallet>, recovery_threshold: u8) -> Result<()> {
        instructions::initialize_wallet(ctx, recovery_threshold)
    }

    #[instruction(discriminator = [1])]
    pub fn transfer_token(ctx: Context<TransferToken>, amount: u64) -> Result<()> {
        instructions::transfer_token(ctx, amount)
    }

    #[instruction(discriminator = [2])]
    pub fn transfer_native_sol(ctx: Context<TransferNativeSol>, amount: u64) -> Result<()> {
        instructions::transfer_native_sol(ctx, amount)
    }

    #[instruction(discriminator = [3])]
    pub fn wrap_instruction<'info>(
        ctx: Context<'_, '_, 'info, 'info, WrapInstruction<'info>>,
        data: Vec<u8>,
    ) -> Result<()> {
        instructions::wrap_instruction(ctx, data)
    }

    #[instruction(discriminator = [4])]
    pub fn add_recovery_guardians(ctx: Context<UpdateProfile>) -> Result<()> {
        instructions::add_recovery_guardians(ctx)
    }

    #[instruction(discriminator = [5])]
    pub fn recover_wallet(ctx: Context<RecoverWallet>) -> Result<()> {
        instructions::recover_wallet(ctx)
    }

    #[instruction(discriminator = [6])]
    pub fn modify_recovery_threshold(ctx: Context<UpdateProfile>, new_threshold: u8) -> Result<()> {
        instructions::modify_recovery_threshold(ctx, new_threshold)
    }

    #[instruction(discriminator = [7])]
    pub fn remove_recovery_guardians(ctx: Context<UpdateProfile>) -> Result<()> {
        instructions::remove_recovery_guardians(ctx)
    }

    #[instruction(discriminator = [8])]
    pub fn add_recovery_sign(ctx: Context<AddRecoverySign>) -> Result<()> {
        instructions::add_recovery_sign(ctx)
    }

    #[instruction(discriminator = [9])]
    pub fn recover_token(ctx: Context<RecoverToken>) -> Result<()> {
        instructions::recover_token(ctx)
    }

    #[instruction(discriminator = [10])]
    pub fn recover_native_sol(ctx: Context<RecoverNativeSol>) -> Result<()> {
        instructions::recover_native_sol(ctx)
    }

    #[instruction(discriminator = [11])]
    pub fn initialize_guard(ctx: Context<InitializeGuard>, args: InitializeGuardArgs) -> Result<()> {
        instructions::initialize_guard(ctx, args)
    }

    #[instruction(discriminator = [12])]
    pub fn cancel_recovery(ctx: Context<UpdateProfile>) -> Result<()> {
        instructions::cancel_recovery(ctx)
    }
}
