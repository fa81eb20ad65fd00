use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

use super::errors::ErrorCode;
use super::state::{GuardAccount, UserProfile};

/// What an account buffer holds, judged by its leading discriminator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AccountKind {
    Empty,
    Zeroed,
    Profile,
    Guard,
}

pub fn classify(data: &[u8]) -> Result<AccountKind> {
    if data.is_empty() {
        return Ok(AccountKind::Empty);
    }
    if data.iter().all(|b| *b == 0) {
        return Ok(AccountKind::Zeroed);
    }
    if data.starts_with(UserProfile::DISCRIMINATOR) {
        return Ok(AccountKind::Profile);
    }
    if data.starts_with(GuardAccount::DISCRIMINATOR) {
        return Ok(AccountKind::Guard);
    }
    err!(ErrorCode::NonZeroData)
}

/// Creates a program-owned account at a PDA, or adopts one that was funded
/// ahead of time. The target must not hold any data yet.
pub fn create_pda_account<'info>(
    payer: &AccountInfo<'info>,
    target: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    space: usize,
    owner: &Pubkey,
    signer_seeds: &[&[u8]],
) -> Result<()> {
    let kind = classify(&target.try_borrow_data()?)?;
    require!(
        matches!(kind, AccountKind::Empty | AccountKind::Zeroed),
        ErrorCode::NonZeroData
    );

    let lamports = target.lamports();
    if lamports > 0 {
        if target.owner == owner {
            // allocated by us earlier but never written
            require!(target.data_len() >= space, ErrorCode::NoAccountLength);
            return Ok(());
        }
        require_keys_eq!(*target.owner, system_program::ID, ErrorCode::NonZeroData);
    }

    let rent = Rent::get()?.minimum_balance(space);
    if lamports == 0 {
        system_program::create_account(
            CpiContext::new_with_signer(
                system_program.clone(),
                CreateAccount {
                    from: payer.clone(),
                    to: target.clone(),
                },
                &[signer_seeds],
            ),
            rent,
            space as u64,
            owner,
        )?;
        return Ok(());
    }

    if lamports < rent {
        system_program::transfer(
            CpiContext::new(
                system_program.clone(),
                Transfer {
                    from: payer.clone(),
                    to: target.clone(),
                },
            ),
            rent - lamports,
        )?;
    }
    system_program::allocate(
        CpiContext::new_with_signer(
            system_program.clone(),
            Allocate {
                account_to_allocate: target.clone(),
            },
            &[signer_seeds],
        ),
        space as u64,
    )?;
    system_program::assign(
        CpiContext::new_with_signer(
            system_program.clone(),
            Assign {
                account_to_assign: target.clone(),
            },
            &[signer_seeds],
        ),
        owner,
    )?;

    Ok(())
}

/// Writes discriminator and data of `value` into `info`.
pub fn write_account<T: AccountSerialize>(info: &AccountInfo, value: &T) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    value.try_serialize(&mut &mut data[..])?;
    Ok(())
}

/// Lamports above the rent-exempt minimum.
pub fn spendable_lamports(info: &AccountInfo, rent: &Rent) -> u64 {
    let rent_exempt_minimum = rent.minimum_balance(info.data_len());
    info.lamports().saturating_sub(rent_exempt_minimum)
}

/// Debits `from` and credits `to`. `from` must be owned by this program.
pub fn move_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> Result<()> {
    if from.key == to.key {
        return Ok(());
    }

    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(ErrorCode::InsufficientFundsForTransaction)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(ErrorCode::Overflow)?;

    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}
