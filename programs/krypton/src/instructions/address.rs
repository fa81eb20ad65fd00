use anchor_lang::prelude::*;
use solana_program::pubkey::{MAX_SEEDS, MAX_SEED_LEN};

use super::constant::*;
use super::errors::ErrorCode;

/// Derives the program address for `tag` and `keys`, returning it with its bump.
///
/// The bump search is bounded (255 down to 0), so this either returns or fails
/// with `InvalidAccountAddress`.
pub fn derive(tag: &[u8], keys: &[&Pubkey], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    // one seed slot is taken by the bump
    require!(
        tag.len() <= MAX_SEED_LEN && keys.len() + 2 <= MAX_SEEDS,
        ErrorCode::InvalidAccountAddress
    );

    let mut seeds: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
    seeds.push(tag);
    seeds.extend(keys.iter().map(|k| k.as_ref()));

    Pubkey::try_find_program_address(&seeds, program_id)
        .ok_or_else(|| error!(ErrorCode::InvalidAccountAddress))
}

pub fn profile_address(seed_key: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(PROFILE_SEED, &[seed_key], program_id)
}

pub fn guard_address(profile: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(GUARD_SEED, &[profile], program_id)
}

pub fn bucket_address(owner: &Pubkey, asset: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(BUCKET_SEED, &[owner, asset], program_id)
}

/// Fails with `InvalidAccountAddress` unless `actual` is the derived address.
pub fn require_derived(actual: &Pubkey, derived: (Pubkey, u8)) -> Result<u8> {
    let (expected, bump) = derived;
    require_keys_eq!(*actual, expected, ErrorCode::InvalidAccountAddress);
    Ok(bump)
}
