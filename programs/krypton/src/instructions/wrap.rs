use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{self, TokenAccount};

use super::constant::*;
use super::errors::ErrorCode;
use super::models::*;
use super::state::*;

/// Calls `target_program` with `data`, signed by the profile. Trailing accounts
/// are handed to the inner instruction in order.
pub fn wrap_instruction<'info>(
    ctx: Context<'_, '_, 'info, 'info, WrapInstruction<'info>>,
    data: Vec<u8>,
) -> Result<()> {
    let target_program = ctx.accounts.target_program.key();
    require_keys_neq!(target_program, *ctx.program_id, ErrorCode::InvalidAccountAddress);

    let profile = &ctx.accounts.profile;
    profile.check_guard(ctx.accounts.guard.as_ref().map(|g| g.key()).as_ref())?;

    let profile_key = profile.key();
    let profile_info = profile.to_account_info();
    let seeds = &[PROFILE_SEED, profile.seed.as_ref(), &[profile.bump]];
    let signer_seeds = &[&seeds[..]];

    // Step 1: Stash the guarded balance.
    let mut held = Vec::new();
    if let Some(guard) = ctx.accounts.guard.as_mut() {
        if let GuardedAsset::Token { mint } = guard.policy.asset() {
            held = holdings(ctx.remaining_accounts, &profile_key, &mint);
        }
        let balance_before = guarded_balance(guard, &profile_info, &held)?;
        guard.setup(balance_before)?;
    }

    // Step 2: Inner call.
    let metas = ctx
        .remaining_accounts
        .iter()
        .map(|acc| {
            let is_signer = acc.is_signer || *acc.key == profile_key;
            if acc.is_writable {
                AccountMeta::new(*acc.key, is_signer)
            } else {
                AccountMeta::new_readonly(*acc.key, is_signer)
            }
        })
        .collect();
    let ix = Instruction {
        program_id: target_program,
        accounts: metas,
        data,
    };

    let mut account_infos = ctx.remaining_accounts.to_vec();
    account_infos.push(ctx.accounts.target_program.to_account_info());
    invoke_signed(&ix, &account_infos, signer_seeds)?;

    // Step 3: Charge what left the guarded balance.
    let mut charged = 0;
    if let Some(guard) = ctx.accounts.guard.as_mut() {
        let after = reload_holdings(ctx.remaining_accounts, &held)?;
        let balance_after = guarded_balance(guard, &profile_info, &after)?;
        charged = guard.run(balance_after, Clock::get()?.unix_timestamp)?;
    }

    msg!(
        "Instruction wrapped: profile={}, program={}, accounts={}, guarded={}, charged={}",
        profile_key,
        target_program,
        ctx.remaining_accounts.len(),
        ctx.accounts.guard.is_some(),
        charged
    );

    Ok(())
}

/// A profile-owned token account as seen before or after the inner call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Holding {
    pub key: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: COption<Pubkey>,
    pub delegated_amount: u64,
}

impl Holding {
    fn read(acc: &AccountInfo) -> Option<(Self, Pubkey)> {
        if *acc.owner != token::ID {
            return None;
        }
        let data = acc.try_borrow_data().ok()?;
        let account = TokenAccount::try_deserialize(&mut &data[..]).ok()?;
        let holding = Self {
            key: *acc.key,
            owner: account.owner,
            amount: account.amount,
            delegate: account.delegate,
            delegated_amount: account.delegated_amount,
        };
        Some((holding, account.mint))
    }
}

/// Every distinct token account of `mint` owned by the profile among `accounts`.
pub fn holdings(accounts: &[AccountInfo], profile: &Pubkey, mint: &Pubkey) -> Vec<Holding> {
    let mut held: Vec<Holding> = Vec::new();
    for acc in accounts.iter() {
        if held.iter().any(|h| h.key == *acc.key) {
            continue;
        }
        match Holding::read(acc) {
            Some((holding, held_mint)) if held_mint == *mint && holding.owner == *profile => {
                held.push(holding)
            }
            _ => {}
        }
    }
    held
}

/// Re-reads the accounts snapshotted before the inner call. Moving tokens out
/// is charged by the guard; handing them over any other way is refused.
pub fn reload_holdings(accounts: &[AccountInfo], before: &[Holding]) -> Result<Vec<Holding>> {
    let mut after = Vec::with_capacity(before.len());
    for held in before {
        let (now, _) = accounts
            .iter()
            .find(|acc| *acc.key == held.key)
            .and_then(Holding::read)
            .ok_or(ErrorCode::TargetAccountNotFound)?;
        check_unchanged(held, &now)?;
        after.push(now);
    }
    Ok(after)
}

/// Ownership and delegation of a guarded account must survive the inner call.
pub fn check_unchanged(before: &Holding, after: &Holding) -> Result<()> {
    require_keys_eq!(after.owner, before.owner, ErrorCode::TargetAccountNotFound);
    require!(
        after.delegate == before.delegate && after.delegated_amount == before.delegated_amount,
        ErrorCode::InvalidGuardTarget
    );
    Ok(())
}

/// Balance of whatever the guard watches: the profile's lamports, or the sum
/// over its token accounts of the guarded mint.
fn guarded_balance(guard: &GuardAccount, profile: &AccountInfo, held: &[Holding]) -> Result<u64> {
    match guard.policy.asset() {
        GuardedAsset::Native => Ok(profile.lamports()),
        GuardedAsset::Token { .. } => held.iter().try_fold(0u64, |total, h| {
            total
                .checked_add(h.amount)
                .ok_or_else(|| error!(ErrorCode::ArithmeticOverflow))
        }),
    }
}

#[derive(Accounts)]
pub struct WrapInstruction<'info> {
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

    /// CHECK: Any program except this one
    pub target_program: UncheckedAccount<'info>,

    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [GUARD_SEED, profile.key().as_ref()],
        bump = guard.bump,
        constraint = guard.guarded == profile.key() @ ErrorCode::InvalidGuardTarget
    )]
    pub guard: Option<Account<'info, GuardAccount>>,
}
