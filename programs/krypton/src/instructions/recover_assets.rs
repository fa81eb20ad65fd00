use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use super::constant::*;
use super::errors::ErrorCode;
use super::models::*;
use super::state::*;
use super::transfer::send_native;
use super::util::spendable_lamports;

/// Moves the whole token balance into the new profile's associated account.
/// The source account stays open.
pub fn recover_token(ctx: Context<RecoverToken>) -> Result<()> {
    let profile = &ctx.accounts.profile;
    profile.check_guard(ctx.accounts.guard.as_ref().map(|g| g.key()).as_ref())?;

    let mint = ctx.accounts.mint.key();
    let amount = ctx.accounts.source.amount;

    if amount > 0 {
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
    }

    msg!(
        "Token recovered: profile={}, new_profile={}, mint={}, amount={}, guarded={}",
        profile.key(),
        ctx.accounts.new_profile.key(),
        mint,
        amount,
        ctx.accounts.guard.is_some()
    );

    Ok(())
}

/// Moves every lamport above rent into the new profile.
pub fn recover_native_sol(ctx: Context<RecoverNativeSol>) -> Result<()> {
    let profile = &ctx.accounts.profile;
    profile.check_guard(ctx.accounts.guard.as_ref().map(|g| g.key()).as_ref())?;

    let profile_info = profile.to_account_info();
    let rent = Rent::get()?;
    let amount = spendable_lamports(&profile_info, &rent);

    send_native(
        &profile_info,
        &ctx.accounts.new_profile.to_account_info(),
        ctx.accounts.guard.as_deref_mut(),
        amount,
        &rent,
        Clock::get()?.unix_timestamp,
    )?;

    msg!(
        "Native SOL recovered: profile={}, new_profile={}, amount={}, guarded={}",
        profile_info.key(),
        ctx.accounts.new_profile.key(),
        amount,
        ctx.accounts.guard.is_some()
    );

    Ok(())
}

#[derive(Accounts)]
pub struct RecoverToken<'info> {
    #[account(
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority,
        constraint = profile.recovered_into == Some(new_profile.key()) @ ErrorCode::NotAuthorizedToRecover
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(
        seeds = [PROFILE_SEED, new_profile.seed.as_ref()],
        bump = new_profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority
    )]
    pub new_profile: Account<'info, UserProfile>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        constraint = source.owner == profile.key() @ ErrorCode::TargetAccountNotFound,
        constraint = source.mint == mint.key() @ ErrorCode::TargetAccountNotFound
    )]
    pub source: Account<'info, TokenAccount>,

    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = mint,
        associated_token::authority = new_profile
    )]
    pub destination: Account<'info, TokenAccount>,

    #[account(mut @ ErrorCode::NotWriteable, signer @ ErrorCode::NotSigner)]
    /// CHECK: Matched against both profiles' authority, pays for the destination
    pub authority: UncheckedAccount<'info>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [GUARD_SEED, profile.key().as_ref()],
        bump = guard.bump,
        constraint = guard.guarded == profile.key() @ ErrorCode::InvalidGuardTarget
    )]
    pub guard: Option<Account<'info, GuardAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RecoverNativeSol<'info> {
    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority,
        constraint = profile.recovered_into == Some(new_profile.key()) @ ErrorCode::NotAuthorizedToRecover
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, new_profile.seed.as_ref()],
        bump = new_profile.bump,
        has_one = authority @ ErrorCode::InvalidAuthority
    )]
    pub new_profile: Account<'info, UserProfile>,

    #[account(signer @ ErrorCode::NotSigner)]
    /// CHECK: Matched against both profiles' authority
    pub authority: UncheckedAccount<'info>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [GUARD_SEED, profile.key().as_ref()],
        bump = guard.bump,
        constraint = guard.guarded == profile.key() @ ErrorCode::InvalidGuardTarget
    )]
    pub guard: Option<Account<'info, GuardAccount>>,
}
