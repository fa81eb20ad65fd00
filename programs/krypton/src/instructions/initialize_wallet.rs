use anchor_lang::prelude::*;

use super::address::{profile_address, require_derived};
use super::constant::*;
use super::errors::ErrorCode;
use super::state::*;
use super::util::{create_pda_account, write_account};

pub fn initialize_wallet(ctx: Context<InitializeWallet>, recovery_threshold: u8) -> Result<()> {
    let authority = ctx.accounts.authority.key();
    let bump = require_derived(
        &ctx.accounts.profile.key(),
        profile_address(&authority, ctx.program_id)?,
    )?;

    let profile = UserProfile::new(authority, recovery_threshold, bump)?;

    let signer_seeds: &[&[u8]] = &[PROFILE_SEED, authority.as_ref(), &[bump]];
    create_pda_account(
        &ctx.accounts.authority.to_account_info(),
        &ctx.accounts.profile.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        UserProfile::SPACE,
        ctx.program_id,
        signer_seeds,
    )?;
    write_account(&ctx.accounts.profile.to_account_info(), &profile)?;

    msg!(
        "Wallet initialized: profile={}, authority={}, recovery_threshold={}",
        ctx.accounts.profile.key(),
        authority,
        recovery_threshold
    );

    Ok(())
}

#[derive(Accounts)]
pub struct InitializeWallet<'info> {
    #[account(mut @ ErrorCode::NotWriteable)]
    /// CHECK: Derived from the authority and created in the handler
    pub profile: UncheckedAccount<'info>,

    #[account(mut @ ErrorCode::NotWriteable, signer @ ErrorCode::NotSigner)]
    /// CHECK: Signer and payer, becomes the profile authority
    pub authority: UncheckedAccount<'info>,

    #[account(address = system_program::ID @ ErrorCode::InvalidSysProgram)]
    /// CHECK: Address checked
    pub system_program: UncheckedAccount<'info>,
}
