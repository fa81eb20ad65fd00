use anchor_lang::prelude::*;

use super::constant::*;
use super::errors::ErrorCode;
use super::state::*;

/// Guardians are passed as trailing accounts.
pub fn add_recovery_guardians(ctx: Context<UpdateProfile>) -> Result<()> {
    let keys = guardian_keys(ctx.remaining_accounts);
    let profile = &mut ctx.accounts.profile;
    let added = profile.add_guardians(&keys)?;

    msg!(
        "Guardians added: profile={}, added={}, count={}",
        profile.key(),
        added,
        profile.guardians.len()
    );

    Ok(())
}

pub fn remove_recovery_guardians(ctx: Context<UpdateProfile>) -> Result<()> {
    let keys = guardian_keys(ctx.remaining_accounts);
    let profile = &mut ctx.accounts.profile;
    profile.remove_guardians(&keys)?;

    msg!(
        "Guardians removed: profile={}, removed={}, count={}",
        profile.key(),
        keys.len(),
        profile.guardians.len()
    );

    Ok(())
}

pub fn modify_recovery_threshold(ctx: Context<UpdateProfile>, new_threshold: u8) -> Result<()> {
    let profile = &mut ctx.accounts.profile;
    let old_threshold = profile.recovery_threshold;
    profile.set_recovery_threshold(new_threshold)?;

    msg!(
        "Recovery threshold modified: profile={}, old={}, new={}, guardians={}",
        profile.key(),
        old_threshold,
        new_threshold,
        profile.guardians.len()
    );

    Ok(())
}

fn guardian_keys(accounts: &[AccountInfo]) -> Vec<Pubkey> {
    accounts.iter().map(|acc| acc.key()).collect()
}

/// Authority-only changes to an existing profile.
#[derive(Accounts)]
pub struct UpdateProfile<'info> {
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
}
