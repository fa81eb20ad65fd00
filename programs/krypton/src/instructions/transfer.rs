use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use super::constant::*;
use super::errors::ErrorCode;
use super::models::*;
use super::state::*;
use super::util::{move_lamports, spendable_lamports};

pub fn transfer_native_sol(ctx: Context<TransferNativeSol>, amount: u64) -> Result<()> {
    let profile = &ctx.accounts.profile;
    profile.check_guard(ctx.accounts.guard.as_ref().map(|g| g.key()).as_ref())?;

    let profile_info = profile.to_account_info();
    send_native(
        &profile_info,
        &ctx.accounts.destination.to_account_info(),
        ctx.accounts.guard.as_deref_mut(),
        amount,
        &Rent::get()?,
        Clock::get()?.unix_timestamp,
    )?;

    msg!(
        "Native SOL transferred: profile={}, destination={}, amount={}, guarded={}",
        profile_info.key(),
        ctx.accounts.destination.key(),
        amount,
        ctx.accounts.guard.is_some()
    );

    Ok(())
}

/// Moves `amount` lamports from above the profile's rent minimum. A bound
/// guard is charged first; when it refuses, nothing moves.
pub fn send_native(
    profile: &AccountInfo,
    destination: &AccountInfo,
    guard: Option<&mut GuardAccount>,
    amount: u64,
    rent: &Rent,
    now: i64,
) -> Result<()> {
    require!(
        spendable_lamports(profile, rent) >= amount,
        ErrorCode::InsufficientFundsForTransaction
    );
    if let Some(guard) = guard {
        guard.apply(&GuardedAsset::Native, amount, now)?;
    }
    move_lamports(profile, destination, amount)
}

pub fn transfer_token(ctx: Context<TransferToken>, amount: u64) -> Result<()> {
    let profile = &ctx.accounts.profile;
    profile.check_guard(ctx.accounts.guard.as_ref().map(|g| g.key()).as_ref())?;

    let mint = ctx.accounts.source.mint;
    require!(
        ctx.accounts.source.amount >= amount,
        ErrorCode::InsufficientFundsForTransaction
    );

    if let Some(guard) = ctx.accounts.guard.as_mut() {
        guard.apply(
            &GuardedAsset::Token { mint },
            amount,
            Clock::get()?.unix_timestamp,
        )?;
    }

    let seeds = &[PROFILE_SEED, profile.seed.as_ref(), &[profile.bump]];
    let signer_seeds = &[&seeds[..]];

    let cpi_accounts = Transfer {
        from: ctx.accounts.source.to_account_info(),
        to: ctx.accounts.destination.to_account_info(),
        authority: profile.to_account_info(),
    };
    let cpi_program = ctx.accounts.token_program.to_account_info();
    let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

    token::transfer(cpi_ctx, amount)?;

    msg!(
        "Token transferred: profile={}, mint={}, destination={}, amount={}, guarded={}",
        profile.key(),
        mint,
        ctx.accounts.destination.key(),
        amount,
        ctx.accounts.guard.is_some()
    );

    Ok(())
}

#[derive(Accounts)]
pub struct TransferNativeSol<'info> {
    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(signer @ ErrorCode::NotSigner)]
    /// CHECK: Matched against profile.authority
    pub authority: UncheckedAccount<'info>,

    #[account(mut @ ErrorCode::NotWriteable)]
    /// CHECK: Any account can receive lamports
    pub destination: UncheckedAccount<'info>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [GUARD_SEED, profile.key().as_ref()],
        bump = guard.bump,
        constraint = guard.guarded == profile.key() @ ErrorCode::InvalidGuardTarget
    )]
    pub guard: Option<Account<'info, GuardAccount>>,
}

#[derive(Accounts)]
pub struct TransferToken<'info> {
    #[account(
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(signer @ ErrorCode::NotSigner)]
    /// CHECK: Matched against profile.authority
    pub authority: UncheckedAccount<'info>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        constraint = source.owner == profile.key() @ ErrorCode::TargetAccountNotFound
    )]
    pub source: Account<'info, TokenAccount>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        constraint = destination.mint == source.mint @ ErrorCode::TargetAccountNotFound
    )]
    pub destination: Account<'info, TokenAccount>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [GUARD_SEED, profile.key().as_ref()],
        bump = guard.bump,
        constraint = guard.guarded == profile.key() @ ErrorCode::InvalidGuardTarget
    )]
    pub guard: Option<Account<'info, GuardAccount>>,

    pub token_program: Program<'info, Token>,
}
