use anchor_lang::prelude::*;

use super::constant::*;
use super::errors::ErrorCode;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug, InitSpace)]
pub struct Guardian {
    pub pubkey: Pubkey,
    /// Set once the guardian signed the open recovery round.
    pub has_signed: bool,
}

/// Fixed-capacity ordered map of guardian key -> signed flag.
///
/// Occupied slots are packed at the front; `len` slots are live and the rest
/// stay zeroed so the serialized size never changes.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, PartialEq, Eq, Debug, InitSpace)]
pub struct GuardianRoster {
    len: u8,
    slots: [Guardian; MAX_GUARDIANS],
}

impl GuardianRoster {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guardian> {
        self.slots[..self.len()].iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.iter().map(|g| g.pubkey)
    }

    fn position(&self, key: &Pubkey) -> Option<usize> {
        self.iter().position(|g| g.pubkey == *key)
    }

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.position(key).is_some()
    }

    /// Returns `false` when the key is already present.
    pub fn insert(&mut self, key: Pubkey) -> Result<bool> {
        if self.contains(&key) {
            return Ok(false);
        }
        require!(self.len() < MAX_GUARDIANS, ErrorCode::TooManyGuardians);

        self.slots[self.len()] = Guardian {
            pubkey: key,
            has_signed: false,
        };
        self.len += 1;
        Ok(true)
    }

    pub fn remove(&mut self, key: &Pubkey) -> Result<()> {
        let idx = self.position(key).ok_or(ErrorCode::GuardianNotFound)?;
        let len = self.len();

        self.slots.copy_within(idx + 1..len, idx);
        self.slots[len - 1] = Guardian::default();
        self.len -= 1;
        Ok(())
    }

    /// Returns `false` when the guardian had already signed.
    pub fn sign(&mut self, key: &Pubkey) -> Result<bool> {
        let idx = self.position(key).ok_or(ErrorCode::GuardianNotFound)?;
        let slot = &mut self.slots[idx];
        if slot.has_signed {
            return Ok(false);
        }
        slot.has_signed = true;
        Ok(true)
    }

    pub fn has_signed(&self, key: &Pubkey) -> bool {
        self.iter().any(|g| g.pubkey == *key && g.has_signed)
    }

    pub fn signed_count(&self) -> usize {
        self.iter().filter(|g| g.has_signed).count()
    }

    pub fn clear_signatures(&mut self) {
        for guardian in self.slots.iter_mut() {
            guardian.has_signed = false;
        }
    }
}

/// Profiles earlier recovered into the owning profile. Same packing as the
/// guardian roster.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, PartialEq, Eq, Debug, InitSpace)]
pub struct RecoveredSet {
    len: u8,
    keys: [Pubkey; MAX_RECOVERED_PROFILES],
}

impl RecoveredSet {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pubkey> {
        self.keys[..self.len()].iter()
    }

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.iter().any(|k| k == key)
    }

    /// Returns `false` when the key is already present.
    pub fn insert(&mut self, key: Pubkey) -> Result<bool> {
        if self.contains(&key) {
            return Ok(false);
        }
        require!(self.len() < MAX_RECOVERED_PROFILES, ErrorCode::Overflow);

        self.keys[self.len()] = key;
        self.len += 1;
        Ok(true)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug, InitSpace)]
pub enum TransferInterval {
    Hour,
    #[default]
    Day,
    Week,
}

impl TransferInterval {
    pub fn as_seconds(&self) -> i64 {
        match self {
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
        }
    }
}

/// Rolling budget shared by every transfer guard policy.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, InitSpace)]
pub struct TransferWindow {
    pub transfer_amount_remaining: u64,
    pub transfer_limit: u64,
    pub transfer_interval: TransferInterval,
    /// Start of the current accounting window (unix seconds).
    pub last_transferred: i64,
}

impl TransferWindow {
    pub fn new(transfer_limit: u64, transfer_interval: TransferInterval, now: i64) -> Self {
        Self {
            transfer_amount_remaining: transfer_limit,
            transfer_limit,
            transfer_interval,
            last_transferred: now,
        }
    }

    pub fn is_elapsed(&self, now: i64) -> Result<bool> {
        let elapsed = now
            .checked_sub(self.last_transferred)
            .ok_or(ErrorCode::ArithmeticOverflow)?;
        require!(elapsed >= 0, ErrorCode::InvalidDateTime);
        Ok(elapsed >= self.transfer_interval.as_seconds())
    }

    /// Charges `amount` against the window, resetting it first when elapsed.
    /// Nothing is written unless the whole charge succeeds.
    pub fn charge(&mut self, amount: u64, now: i64) -> Result<()> {
        let (budget, window_start) = if self.is_elapsed(now)? {
            (self.transfer_limit, now)
        } else {
            (self.transfer_amount_remaining, self.last_transferred)
        };

        require!(
            amount <= budget,
            ErrorCode::InsufficientFundsForTransaction
        );
        let remaining = budget
            .checked_sub(amount)
            .ok_or(ErrorCode::ArithmeticOverflow)?;

        self.transfer_amount_remaining = remaining;
        self.last_transferred = window_start;
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, InitSpace)]
pub struct NativeSolTransferGuard {
    pub window: TransferWindow,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, InitSpace)]
pub struct TokenTransferGuard {
    pub mint: Pubkey,
    pub window: TransferWindow,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, InitSpace)]
pub enum GuardPolicy {
    NativeSolTransfer(NativeSolTransferGuard),
    TokenTransfer(TokenTransferGuard),
}

/// Scratch state carried between the two phases of a guarded operation.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct GuardContext {
    pub balance_before: u64,
}

/// What a transfer moves. Not persisted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GuardedAsset {
    Native,
    Token { mint: Pubkey },
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub enum GuardPolicyArgs {
    NativeSolTransfer {
        transfer_limit: u64,
        transfer_interval: TransferInterval,
    },
    TokenTransfer {
        mint: Pubkey,
        transfer_limit: u64,
        transfer_interval: TransferInterval,
    },
}

impl GuardPolicyArgs {
    pub fn into_policy(self, now: i64) -> GuardPolicy {
        match self {
            Self::NativeSolTransfer {
                transfer_limit,
                transfer_interval,
            } => GuardPolicy::NativeSolTransfer(NativeSolTransferGuard {
                window: TransferWindow::new(transfer_limit, transfer_interval, now),
            }),
            Self::TokenTransfer {
                mint,
                transfer_limit,
                transfer_interval,
            } => GuardPolicy::TokenTransfer(TokenTransferGuard {
                mint,
                window: TransferWindow::new(transfer_limit, transfer_interval, now),
            }),
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitializeGuardArgs {
    /// Must be the profile the guard is created for.
    pub target: Pubkey,
    pub policy: GuardPolicyArgs,
}
