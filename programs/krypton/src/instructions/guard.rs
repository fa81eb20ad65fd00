//! Transfer guards.
//!
//! Every policy exposes the same capability: say whether it covers an asset,
//! and charge an amount against its window at a given time. `GuardAccount`
//! adds the two-phase protocol used around calls whose spend is only known
//! afterwards: `setup` stashes the guarded balance in `context`, `run`
//! consumes it and charges the observed decrease.

use anchor_lang::prelude::*;

use super::errors::ErrorCode;
use super::models::*;
use super::state::GuardAccount;

pub trait Guard {
    fn guards(&self, asset: &GuardedAsset) -> bool;

    fn apply(&mut self, amount: u64, now: i64) -> Result<()>;
}

impl Guard for NativeSolTransferGuard {
    fn guards(&self, asset: &GuardedAsset) -> bool {
        matches!(asset, GuardedAsset::Native)
    }

    fn apply(&mut self, amount: u64, now: i64) -> Result<()> {
        self.window.charge(amount, now)
    }
}

impl Guard for TokenTransferGuard {
    fn guards(&self, asset: &GuardedAsset) -> bool {
        matches!(asset, GuardedAsset::Token { mint } if *mint == self.mint)
    }

    fn apply(&mut self, amount: u64, now: i64) -> Result<()> {
        self.window.charge(amount, now)
    }
}

impl GuardPolicy {
    pub fn as_guard(&self) -> &dyn Guard {
        match self {
            Self::NativeSolTransfer(g) => g,
            Self::TokenTransfer(g) => g,
        }
    }

    pub fn as_guard_mut(&mut self) -> &mut dyn Guard {
        match self {
            Self::NativeSolTransfer(g) => g,
            Self::TokenTransfer(g) => g,
        }
    }

    /// The asset whose balance the policy watches.
    pub fn asset(&self) -> GuardedAsset {
        match self {
            Self::NativeSolTransfer(_) => GuardedAsset::Native,
            Self::TokenTransfer(g) => GuardedAsset::Token { mint: g.mint },
        }
    }

    pub fn window(&self) -> &TransferWindow {
        match self {
            Self::NativeSolTransfer(g) => &g.window,
            Self::TokenTransfer(g) => &g.window,
        }
    }
}

impl GuardAccount {
    pub fn guards(&self, asset: &GuardedAsset) -> bool {
        self.policy.as_guard().guards(asset)
    }

    /// Charges a known transfer. Assets the policy does not cover pass through.
    pub fn apply(&mut self, asset: &GuardedAsset, amount: u64, now: i64) -> Result<()> {
        require!(self.context.is_none(), ErrorCode::GuardContextNotFound);
        if !self.guards(asset) {
            return Ok(());
        }
        self.policy.as_guard_mut().apply(amount, now)
    }

    pub fn setup(&mut self, balance_before: u64) -> Result<()> {
        require!(self.context.is_none(), ErrorCode::GuardContextNotFound);
        self.context = Some(GuardContext { balance_before });
        Ok(())
    }

    /// Returns the amount charged.
    pub fn run(&mut self, balance_after: u64, now: i64) -> Result<u64> {
        let GuardContext { balance_before } =
            self.context.take().ok_or(ErrorCode::GuardContextNotFound)?;

        // An inner call may also credit the guarded account.
        let spent = balance_before.saturating_sub(balance_after);
        if spent > 0 {
            self.policy.as_guard_mut().apply(spent, now)?;
        }
        Ok(spent)
    }
}
