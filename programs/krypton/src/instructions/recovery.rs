use anchor_lang::prelude::*;

use super::address::{profile_address, require_derived};
use super::constant::*;
use super::errors::ErrorCode;
use super::guardians::UpdateProfile;
use super::state::*;
use super::util::{classify, write_account, AccountKind};

/// Records a guardian signature. The last signature needed also finalizes,
/// provided the new authority's profile exists (or is this profile).
/// Profiles earlier recovered into this one are passed as trailing accounts.
pub fn add_recovery_sign(ctx: Context<AddRecoverySign>) -> Result<()> {
    let guardian = ctx.accounts.guardian.key();
    let new_authority = ctx.accounts.new_authority.key();
    let profile_key = ctx.accounts.profile.key();

    let destination = recovery_destination(
        &profile_key,
        &new_authority,
        ctx.accounts.new_profile.as_ref().map(|acc| acc.to_account_info()),
        ctx.program_id,
    )?;
    let destination_live = match &destination {
        Some(info) => {
            let data = info.try_borrow_data()?;
            check_recovery_destination(&data, &new_authority)?;
            let kind = classify(&data)?;
            kind == AccountKind::Profile
        }
        None => true,
    };

    let profile = &mut ctx.accounts.profile;
    match profile.sign_recovery(&guardian, &new_authority)? {
        RecoveryProgress::Pending { signed, threshold } => msg!(
            "Recovery signed: profile={}, guardian={}, new_authority={}, signed={}, threshold={}",
            profile_key,
            guardian,
            new_authority,
            signed,
            threshold
        ),
        RecoveryProgress::Ready if destination_live => {
            let followed = complete_recovery(
                profile,
                &profile_key,
                destination.as_ref(),
                ctx.remaining_accounts,
                ctx.program_id,
            )?;
            msg!(
                "Wallet recovered: profile={}, authority={}, last_guardian={}, followed={}",
                profile_key,
                new_authority,
                guardian,
                followed
            );
        }
        RecoveryProgress::Ready => msg!(
            "Recovery ready: profile={}, new_authority={}, awaiting new profile",
            profile_key,
            new_authority
        ),
    }

    Ok(())
}

/// Explicit finalize. Trailing signer accounts co-sign as guardians, the
/// other trailing accounts are profiles recovered into this one.
pub fn recover_wallet(ctx: Context<RecoverWallet>) -> Result<()> {
    let new_authority = ctx.accounts.new_authority.key();
    let profile_key = ctx.accounts.profile.key();

    let destination = recovery_destination(
        &profile_key,
        &new_authority,
        ctx.accounts.new_profile.as_ref().map(|acc| acc.to_account_info()),
        ctx.program_id,
    )?;
    if let Some(info) = &destination {
        check_recovery_destination(&info.try_borrow_data()?, &new_authority)?;
    }

    let cosigners: Vec<Pubkey> = ctx
        .remaining_accounts
        .iter()
        .filter(|acc| acc.is_signer)
        .map(|acc| acc.key())
        .collect();

    let profile = &mut ctx.accounts.profile;
    profile.cosign_recovery(&new_authority, &cosigners)?;
    let followed = complete_recovery(
        profile,
        &profile_key,
        destination.as_ref(),
        ctx.remaining_accounts,
        ctx.program_id,
    )?;

    msg!(
        "Wallet recovered: profile={}, authority={}, cosigners={}, followed={}",
        profile_key,
        new_authority,
        cosigners.len(),
        followed
    );

    Ok(())
}

pub fn cancel_recovery(ctx: Context<UpdateProfile>) -> Result<()> {
    let profile = &mut ctx.accounts.profile;
    let pending = profile.pending_new_authority;
    let was_open = profile.cancel_recovery();

    msg!(
        "Recovery cancelled: profile={}, was_open={}, pending={:?}",
        profile.key(),
        was_open,
        pending
    );

    Ok(())
}

/// The profile `new_authority` will use. `None` when that is the recovering
/// profile itself, i.e. recovery back to its seed key; `new_profile` is then
/// ignored.
pub fn recovery_destination<'info>(
    profile_key: &Pubkey,
    new_authority: &Pubkey,
    new_profile: Option<AccountInfo<'info>>,
    program_id: &Pubkey,
) -> Result<Option<AccountInfo<'info>>> {
    let derived = profile_address(new_authority, program_id)?;
    if derived.0 == *profile_key {
        return Ok(None);
    }

    let info = new_profile.ok_or(ErrorCode::MissingRecoveredAccounts)?;
    require_derived(info.key, derived)?;
    Ok(Some(info))
}

/// The account the new authority will control must be free, or already be
/// that authority's profile.
pub fn check_recovery_destination(data: &[u8], new_authority: &Pubkey) -> Result<()> {
    match classify(data)? {
        AccountKind::Empty | AccountKind::Zeroed => Ok(()),
        AccountKind::Profile => {
            let existing = UserProfile::try_deserialize(&mut &data[..])?;
            existing.require_authority(new_authority)
        }
        AccountKind::Guard => err!(ErrorCode::NonZeroData),
    }
}

/// Finalizes the round on `profile` and hands every profile still linked to
/// it over to the new authority. Linked profiles must be among `accounts`.
/// Returns how many of them followed.
pub fn complete_recovery(
    profile: &mut UserProfile,
    profile_key: &Pubkey,
    destination: Option<&AccountInfo>,
    accounts: &[AccountInfo],
    program_id: &Pubkey,
) -> Result<usize> {
    let new_profile_key = destination.map(|info| *info.key);
    let authority = profile.finalize_recovery(new_profile_key)?;
    let to = new_profile_key.unwrap_or(*profile_key);

    let mut followed = Vec::with_capacity(profile.recovered.len());
    for key in profile.recovered.iter() {
        if key == profile_key || *key == to {
            continue;
        }
        let info = accounts
            .iter()
            .find(|acc| acc.key == key)
            .ok_or(ErrorCode::MissingRecoveredAccounts)?;

        let mut chained = load_profile(info, program_id)?;
        if chained.relink(profile_key, &to, authority) {
            write_account(info, &chained)?;
            followed.push(*key);
        }
    }

    let Some(info) = destination else {
        return Ok(followed.len());
    };

    let mut new_profile = load_profile(info, program_id)?;
    new_profile.require_authority(&authority)?;
    if new_profile.recovered_into == Some(*profile_key) {
        new_profile.recovered_into = None;
    }
    new_profile.recovered.insert(*profile_key)?;
    for key in &followed {
        new_profile.recovered.insert(*key)?;
    }
    write_account(info, &new_profile)?;

    profile.recovered.clear();
    Ok(followed.len())
}

fn load_profile(info: &AccountInfo, program_id: &Pubkey) -> Result<UserProfile> {
    require_keys_eq!(*info.owner, *program_id, ErrorCode::MissingRecoveredAccounts);
    require!(info.is_writable, ErrorCode::NotWriteable);

    let data = info.try_borrow_data()?;
    require!(
        classify(&data)? == AccountKind::Profile,
        ErrorCode::MissingRecoveredAccounts
    );
    let profile = UserProfile::try_deserialize(&mut &data[..])?;
    Ok(profile)
}

#[derive(Accounts)]
pub struct AddRecoverySign<'info> {
    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(signer @ ErrorCode::NotSigner)]
    /// CHECK: Must be on the profile's guardian roster
    pub guardian: UncheckedAccount<'info>,

    /// CHECK: Target authority of the round
    pub new_authority: UncheckedAccount<'info>,

    /// Omitted when recovering back to the profile's seed key.
    #[account(mut @ ErrorCode::NotWriteable)]
    /// CHECK: Derived from new_authority and inspected in the handler
    pub new_profile: Option<UncheckedAccount<'info>>,
}

#[derive(Accounts)]
pub struct RecoverWallet<'info> {
    #[account(
        mut @ ErrorCode::NotWriteable,
        seeds = [PROFILE_SEED, profile.seed.as_ref()],
        bump = profile.bump
    )]
    pub profile: Account<'info, UserProfile>,

    #[account(signer @ ErrorCode::NotSigner)]
    /// CHECK: Must match the open round
    pub new_authority: UncheckedAccount<'info>,

    /// Omitted when recovering back to the profile's seed key.
    #[account(mut @ ErrorCode::NotWriteable)]
    /// CHECK: Derived from new_authority, must hold its profile
    pub new_profile: Option<UncheckedAccount<'info>>,
}
