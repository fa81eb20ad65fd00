use anchor_lang::prelude::*;

use super::address::{guard_address, require_derived};
use super::constant::*;
use super::errors::ErrorCode;
use super::models::*;
use super::state::*;
use super::util::{create_pda_account, write_account};

pub fn initialize_guard(ctx: Context<InitializeGuard>, args: InitializeGuardArgs) -> Result<()> {
    let profile_key = ctx.accounts.profile.key();
    require_keys_eq!(args.target, profile_key, ErrorCode::InvalidGuardTarget);
    require!(
        ctx.accounts.profile.guard.is_none(),
        ErrorCode::InvalidGuardTarget
    );

    let guard_key = ctx.accounts.guard.key();
    let bump = require_derived(&guard_key, guard_address(&profile_key, ctx.program_id)?)?;

    let now = Clock::get()?.unix_timestamp;
    let guard = GuardAccount::new(profile_key, bump, args.policy.into_policy(now));

    let signer_seeds: &[&[u8]] = &[GUARD_SEED, profile_key.as_ref(), &[bump]];
    create_pda_account(
        &ctx.accounts.authority.to_account_info(),
        &ctx.accounts.guard.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        GuardAccount::SPACE,
        ctx.program_id,
        signer_seeds,
    )?;
    write_account(&ctx.accounts.guard.to_account_info(), &guard)?;

    ctx.accounts.profile.guard = Some(guard_key);

    let window = guard.policy.window();
    msg!(
        "Guard initialized: profile={}, guard={}, asset={:?}, limit={}, interval={:?}",
        profile_key,
        guard_key,
        guard.policy.asset(),
        window.transfer_limit,
        window.transfer_interval
    );

    Ok(())
}

#[derive(Accounts)]
pub struct InitializeGuard<'info> {
    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(mut @ ErrorCode::NotWriteable)]
    /// CHECK: Derived from the profile and created in the handler
    pub guard: UncheckedAccount<'info>,

    #[account(mut @ ErrorCode::NotWriteable, signer @ ErrorCode::NotSigner)]
    /// CHECK: Matched against profile.authority, pays for the guard
    pub authority: UncheckedAccount<'info>,

    #[account(address = system_program::ID @ ErrorCode::InvalidSysProgram)]
    /// CHECK: Address checked
    pub system_program: UncheckedAccount<'info>,
}
