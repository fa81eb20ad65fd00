use anchor_lang::prelude::*;

use super::constant::*;
use super::errors::ErrorCode;
use super::models::*;

#[account(discriminator = [1])]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub version: u8,
    /// Key the profile address is derived from. Never changes.
    pub seed: Pubkey,
    pub authority: Pubkey,
    pub recovery_threshold: u8,
    pub guardians: GuardianRoster,
    /// Target authority of the open recovery round.
    pub pending_new_authority: Option<Pubkey>,
    /// Guard bound to this profile, if any.
    pub guard: Option<Pubkey>,
    /// Profile this one was last recovered into. Its authority may sweep
    /// assets out of here.
    pub recovered_into: Option<Pubkey>,
    /// Profiles recovered into this one whose authority follows ours.
    pub recovered: RecoveredSet,
    pub bump: u8,
}

#[account(discriminator = [2])]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct GuardAccount {
    pub version: u8,
    /// Profile this guard protects.
    pub guarded: Pubkey,
    pub bump: u8,
    pub policy: GuardPolicy,
    pub context: Option<GuardContext>,
}

/// Where a recovery round stands after a signature was recorded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RecoveryProgress {
    Pending { signed: usize, threshold: u8 },
    Ready,
}

pub fn check_recovery_threshold(threshold: u8) -> Result<()> {
    require!(
        (MIN_RECOVERY_THRESHOLD..=MAX_RECOVERY_THRESHOLD).contains(&threshold),
        ErrorCode::InvalidRecoveryThreshold
    );
    Ok(())
}

impl UserProfile {
    pub const SPACE: usize = Self::DISCRIMINATOR.len() + Self::INIT_SPACE;

    pub fn new(authority: Pubkey, recovery_threshold: u8, bump: u8) -> Result<Self> {
        check_recovery_threshold(recovery_threshold)?;

        Ok(Self {
            version: CURRENT_VERSION,
            seed: authority,
            authority,
            recovery_threshold,
            guardians: GuardianRoster::default(),
            pending_new_authority: None,
            guard: None,
            recovered_into: None,
            recovered: RecoveredSet::default(),
            bump,
        })
    }

    pub fn require_authority(&self, key: &Pubkey) -> Result<()> {
        require_keys_eq!(self.authority, *key, ErrorCode::InvalidAuthority);
        Ok(())
    }

    /// Adds every key not already present. Returns how many were new.
    pub fn add_guardians(&mut self, keys: &[Pubkey]) -> Result<usize> {
        require!(!keys.is_empty(), ErrorCode::NotEnoughAccounts);

        let mut roster = self.guardians.clone();
        let mut added = 0;
        for key in keys {
            if roster.insert(*key)? {
                added += 1;
            }
        }

        self.guardians = roster;
        Ok(added)
    }

    pub fn remove_guardians(&mut self, keys: &[Pubkey]) -> Result<()> {
        require!(!keys.is_empty(), ErrorCode::NotEnoughAccounts);

        let mut roster = self.guardians.clone();
        for key in keys {
            roster.remove(key)?;
        }
        require!(
            roster.len() >= self.recovery_threshold as usize,
            ErrorCode::NotEnoughGuardians
        );

        self.guardians = roster;
        Ok(())
    }

    pub fn set_recovery_threshold(&mut self, new_threshold: u8) -> Result<()> {
        check_recovery_threshold(new_threshold)?;
        require!(
            new_threshold as usize <= self.guardians.len(),
            ErrorCode::InvalidRecoveryThreshold
        );

        self.recovery_threshold = new_threshold;
        Ok(())
    }

    pub fn is_recovery_ready(&self) -> bool {
        self.pending_new_authority.is_some()
            && self.guardians.signed_count() >= self.recovery_threshold as usize
    }

    /// Records `guardian`'s signature for recovering into `new_authority`,
    /// opening the round on the first accepted signature.
    pub fn sign_recovery(
        &mut self,
        guardian: &Pubkey,
        new_authority: &Pubkey,
    ) -> Result<RecoveryProgress> {
        require!(
            self.guardians.contains(guardian),
            ErrorCode::GuardianNotFound
        );

        match self.pending_new_authority {
            Some(pending) => {
                require_keys_eq!(pending, *new_authority, ErrorCode::NotAuthorizedToRecover);
            }
            None => {
                // The round that targeted this key was already finalized.
                require_keys_neq!(
                    self.authority,
                    *new_authority,
                    ErrorCode::GuardContextNotFound
                );
                self.pending_new_authority = Some(*new_authority);
            }
        }

        self.guardians.sign(guardian)?;

        if self.is_recovery_ready() {
            Ok(RecoveryProgress::Ready)
        } else {
            Ok(RecoveryProgress::Pending {
                signed: self.guardians.signed_count(),
                threshold: self.recovery_threshold,
            })
        }
    }

    /// Swaps the authority to the pending one and links this profile to the
    /// profile it was recovered into. `None` means it stays its own
    /// destination. Returns the new authority.
    pub fn finalize_recovery(&mut self, recovered_into: Option<Pubkey>) -> Result<Pubkey> {
        let new_authority = self
            .pending_new_authority
            .ok_or(ErrorCode::NotAuthorizedToRecover)?;
        require!(
            self.guardians.signed_count() >= self.recovery_threshold as usize,
            ErrorCode::MissingGuardianSignatures
        );

        self.authority = new_authority;
        self.recovered_into = recovered_into;
        self.pending_new_authority = None;
        self.guardians.clear_signatures();
        Ok(new_authority)
    }

    /// Counts every co-signer for `new_authority`. The round must then target
    /// `new_authority`; the threshold is checked on finalize.
    pub fn cosign_recovery(&mut self, new_authority: &Pubkey, cosigners: &[Pubkey]) -> Result<()> {
        for guardian in cosigners {
            self.sign_recovery(guardian, new_authority)?;
        }
        require!(
            self.pending_new_authority == Some(*new_authority),
            ErrorCode::NotAuthorizedToRecover
        );
        Ok(())
    }

    /// Follows a recovery of the profile this one was recovered into.
    /// Returns `false` when this profile was since linked elsewhere.
    pub fn relink(&mut self, from: &Pubkey, to: &Pubkey, authority: Pubkey) -> bool {
        if self.recovered_into != Some(*from) {
            return false;
        }
        self.authority = authority;
        self.recovered_into = Some(*to);
        true
    }

    /// Assets may only be swept into the profile this one was recovered into.
    pub fn require_recovered_into(&self, new_profile: &Pubkey) -> Result<()> {
        require!(
            self.recovered_into == Some(*new_profile),
            ErrorCode::NotAuthorizedToRecover
        );
        Ok(())
    }

    /// Returns `false` when no round was open.
    pub fn cancel_recovery(&mut self) -> bool {
        let was_open = self.pending_new_authority.take().is_some();
        self.guardians.clear_signatures();
        was_open
    }

    /// A bound guard must be presented, and only that guard.
    pub fn check_guard(&self, supplied: Option<&Pubkey>) -> Result<()> {
        match (self.guard.as_ref(), supplied) {
            (None, None) => Ok(()),
            (Some(bound), Some(key)) if bound == key => Ok(()),
            _ => err!(ErrorCode::InvalidGuardTarget),
        }
    }
}

impl GuardAccount {
    pub const SPACE: usize = Self::DISCRIMINATOR.len() + Self::INIT_SPACE;

    pub fn new(guarded: Pubkey, bump: u8, policy: GuardPolicy) -> Self {
        Self {
            version: CURRENT_VERSION,
            guarded,
            bump,
            policy,
            context: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::assert_err;

    fn profile_with_guardians(threshold: u8, n: usize) -> (UserProfile, Vec<Pubkey>) {
        let mut profile = UserProfile::new(Pubkey::new_unique(), threshold, 254).unwrap();
        let guardians: Vec<Pubkey> = (0..n).map(|_| Pubkey::new_unique()).collect();
        if n > 0 {
            profile.add_guardians(&guardians).unwrap();
        }
        (profile, guardians)
    }

    #[test]
    fn test_initialize_threshold_range() {
        for t in MIN_RECOVERY_THRESHOLD..=MAX_RECOVERY_THRESHOLD {
            let profile = UserProfile::new(Pubkey::new_unique(), t, 255).unwrap();
            assert_eq!(profile.recovery_threshold, t);
            assert!(profile.guardians.is_empty());
            assert_eq!(profile.seed, profile.authority);
            assert_eq!(profile.pending_new_authority, None);
        }
        for t in [0, 11, u8::MAX] {
            assert_err(
                UserProfile::new(Pubkey::new_unique(), t, 255),
                ErrorCode::InvalidRecoveryThreshold,
            );
        }
    }

    #[test]
    fn test_add_guardians_dedups() {
        let (mut profile, guardians) = profile_with_guardians(1, 2);

        let added = profile
            .add_guardians(&[guardians[0], guardians[0], guardians[1]])
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(profile.guardians.len(), 2);

        assert_err(profile.add_guardians(&[]), ErrorCode::NotEnoughAccounts);
    }

    #[test]
    fn test_add_guardians_over_capacity_is_all_or_nothing() {
        let (mut profile, _) = profile_with_guardians(1, MAX_GUARDIANS - 1);
        let extra = [Pubkey::new_unique(), Pubkey::new_unique()];

        assert_err(profile.add_guardians(&extra), ErrorCode::TooManyGuardians);
        assert_eq!(profile.guardians.len(), MAX_GUARDIANS - 1);
    }

    #[test]
    fn test_remove_guardians_respects_threshold() {
        let (mut profile, guardians) = profile_with_guardians(2, 3);

        assert_err(
            profile.remove_guardians(&[guardians[0], guardians[1]]),
            ErrorCode::NotEnoughGuardians,
        );
        assert_eq!(profile.guardians.len(), 3);
        assert_eq!(profile.recovery_threshold, 2);

        profile.remove_guardians(&[guardians[0]]).unwrap();
        assert_eq!(profile.guardians.len(), 2);

        assert_err(
            profile.remove_guardians(&[Pubkey::new_unique()]),
            ErrorCode::GuardianNotFound,
        );
    }

    #[test]
    fn test_remove_guardian_mid_round_drops_signature() {
        let (mut profile, guardians) = profile_with_guardians(2, 3);
        let new_authority = Pubkey::new_unique();

        profile.sign_recovery(&guardians[0], &new_authority).unwrap();
        profile.remove_guardians(&[guardians[0]]).unwrap();
        assert_eq!(profile.guardians.signed_count(), 0);

        profile.add_guardians(&[guardians[0]]).unwrap();
        assert!(!profile.guardians.has_signed(&guardians[0]));
    }

    #[test]
    fn test_modify_threshold() {
        let (mut profile, _) = profile_with_guardians(1, 3);

        profile.set_recovery_threshold(3).unwrap();
        assert_eq!(profile.recovery_threshold, 3);

        assert_err(profile.set_recovery_threshold(4), ErrorCode::InvalidRecoveryThreshold);
        assert_err(profile.set_recovery_threshold(0), ErrorCode::InvalidRecoveryThreshold);
        assert_eq!(profile.recovery_threshold, 3);
    }

    #[test]
    fn test_finalize_requires_threshold() {
        let (mut profile, guardians) = profile_with_guardians(3, 3);
        let new_authority = Pubkey::new_unique();

        profile.sign_recovery(&guardians[0], &new_authority).unwrap();
        let progress = profile.sign_recovery(&guardians[1], &new_authority).unwrap();
        assert_eq!(progress, RecoveryProgress::Pending { signed: 2, threshold: 3 });
        assert_err(profile.finalize_recovery(None), ErrorCode::MissingGuardianSignatures);

        let progress = profile.sign_recovery(&guardians[2], &new_authority).unwrap();
        assert_eq!(progress, RecoveryProgress::Ready);

        assert_eq!(profile.finalize_recovery(None).unwrap(), new_authority);
        assert_eq!(profile.authority, new_authority);
        assert_eq!(profile.recovered_into, None);
        assert_eq!(profile.pending_new_authority, None);
        assert_eq!(profile.guardians.signed_count(), 0);
        assert_eq!(profile.guardians.len(), 3);
    }

    #[test]
    fn test_recovery_scenario_links_to_new_profile() {
        let mut profile = UserProfile::new(Pubkey::new_unique(), 3, 253).unwrap();
        let (g1, g2, g3) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        profile.add_guardians(&[g1, g2, g3]).unwrap();
        assert!(profile.guardians.iter().all(|g| !g.has_signed));

        let new_authority = Pubkey::new_unique();
        let new_profile = Pubkey::new_unique();
        profile.sign_recovery(&g1, &new_authority).unwrap();
        assert_eq!(profile.pending_new_authority, Some(new_authority));
        profile.sign_recovery(&g2, &new_authority).unwrap();
        assert_err(
            profile.require_recovered_into(&new_profile),
            ErrorCode::NotAuthorizedToRecover,
        );
        assert_eq!(
            profile.sign_recovery(&g3, &new_authority).unwrap(),
            RecoveryProgress::Ready
        );
        assert_eq!(
            profile.finalize_recovery(Some(new_profile)).unwrap(),
            new_authority
        );

        assert_eq!(profile.authority, new_authority);
        assert_ne!(profile.seed, new_authority);
        assert_eq!(profile.pending_new_authority, None);
        assert!(profile.guardians.iter().all(|g| !g.has_signed));
        profile.require_recovered_into(&new_profile).unwrap();
        assert_err(
            profile.require_recovered_into(&Pubkey::new_unique()),
            ErrorCode::NotAuthorizedToRecover,
        );
    }

    #[test]
    fn test_self_recovery_does_not_open_other_profiles() {
        // The authority of a guarded profile sets itself as the only
        // guardian of a throwaway profile and recovers it.
        let owner = Pubkey::new_unique();
        let owned = UserProfile::new(owner, 1, 255).unwrap();
        let (owned_key, throwaway_key) = (Pubkey::new_unique(), Pubkey::new_unique());

        let mut throwaway = UserProfile::new(Pubkey::new_unique(), 1, 255).unwrap();
        throwaway.add_guardians(&[owner]).unwrap();
        throwaway.sign_recovery(&owner, &owner).unwrap();
        throwaway.finalize_recovery(Some(owned_key)).unwrap();
        assert_eq!(throwaway.authority, owner);

        // Sweeping the owned profile into the throwaway one is not allowed.
        assert_err(
            owned.require_recovered_into(&throwaway_key),
            ErrorCode::NotAuthorizedToRecover,
        );
        throwaway.require_recovered_into(&owned_key).unwrap();
    }

    #[test]
    fn test_recovery_into_own_address_keeps_no_link() {
        let (mut profile, guardians) = profile_with_guardians(1, 1);
        let seed = profile.seed;
        let stolen = Pubkey::new_unique();

        profile.sign_recovery(&guardians[0], &stolen).unwrap();
        profile.finalize_recovery(None).unwrap();
        assert_eq!(profile.authority, stolen);

        profile.sign_recovery(&guardians[0], &seed).unwrap();
        assert_eq!(profile.finalize_recovery(None).unwrap(), seed);
        assert_eq!(profile.authority, profile.seed);
        assert_eq!(profile.recovered_into, None);
    }

    #[test]
    fn test_relink_follows_only_current_link() {
        let (first, second, third) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let (mut chained, guardians) = profile_with_guardians(1, 1);
        let authority = Pubkey::new_unique();
        chained.sign_recovery(&guardians[0], &authority).unwrap();
        chained.finalize_recovery(Some(first)).unwrap();

        let next_authority = Pubkey::new_unique();
        assert!(!chained.relink(&second, &third, next_authority));
        assert_eq!(chained.authority, authority);

        assert!(chained.relink(&first, &second, next_authority));
        assert_eq!(chained.authority, next_authority);
        assert_eq!(chained.recovered_into, Some(second));
    }

    #[test]
    fn test_resign_is_noop_until_finalized() {
        let (mut profile, guardians) = profile_with_guardians(2, 2);
        let new_authority = Pubkey::new_unique();

        profile.sign_recovery(&guardians[0], &new_authority).unwrap();
        let again = profile.sign_recovery(&guardians[0], &new_authority).unwrap();
        assert_eq!(again, RecoveryProgress::Pending { signed: 1, threshold: 2 });

        profile.sign_recovery(&guardians[1], &new_authority).unwrap();
        profile.finalize_recovery(None).unwrap();
        assert_err(
            profile.sign_recovery(&guardians[0], &new_authority),
            ErrorCode::GuardContextNotFound,
        );
    }

    #[test]
    fn test_competing_round_is_rejected() {
        let (mut profile, guardians) = profile_with_guardians(2, 2);
        let target = Pubkey::new_unique();

        profile.sign_recovery(&guardians[0], &target).unwrap();
        assert_err(
            profile.sign_recovery(&guardians[1], &Pubkey::new_unique()),
            ErrorCode::NotAuthorizedToRecover,
        );
        assert_eq!(profile.pending_new_authority, Some(target));
        assert!(!profile.guardians.has_signed(&guardians[1]));
    }

    #[test]
    fn test_non_guardian_cannot_open_round() {
        let (mut profile, _) = profile_with_guardians(1, 1);

        assert_err(
            profile.sign_recovery(&Pubkey::new_unique(), &Pubkey::new_unique()),
            ErrorCode::GuardianNotFound,
        );
        assert_eq!(profile.pending_new_authority, None);
    }

    #[test]
    fn test_cosign_recovery() {
        let (mut profile, guardians) = profile_with_guardians(2, 3);
        let new_authority = Pubkey::new_unique();

        profile.cosign_recovery(&new_authority, &[guardians[0]]).unwrap();
        assert_err(profile.finalize_recovery(None), ErrorCode::MissingGuardianSignatures);

        profile
            .cosign_recovery(&new_authority, &[guardians[1]])
            .unwrap();
        assert_eq!(profile.finalize_recovery(None).unwrap(), new_authority);
        assert_eq!(profile.authority, new_authority);
        assert_eq!(profile.guardians.signed_count(), 0);
    }

    #[test]
    fn test_cosign_recovery_needs_matching_round() {
        let (mut profile, guardians) = profile_with_guardians(1, 2);

        assert_err(
            profile.cosign_recovery(&Pubkey::new_unique(), &[]),
            ErrorCode::NotAuthorizedToRecover,
        );

        let target = Pubkey::new_unique();
        profile.sign_recovery(&guardians[0], &target).unwrap();
        profile.set_recovery_threshold(2).unwrap();
        assert_err(
            profile.cosign_recovery(&Pubkey::new_unique(), &[]),
            ErrorCode::NotAuthorizedToRecover,
        );
        assert_err(
            profile.cosign_recovery(&target, &[Pubkey::new_unique()]),
            ErrorCode::GuardianNotFound,
        );
        assert_eq!(profile.authority, profile.seed);
    }

    #[test]
    fn test_cancel_recovery() {
        let (mut profile, guardians) = profile_with_guardians(2, 2);
        profile
            .sign_recovery(&guardians[0], &Pubkey::new_unique())
            .unwrap();

        assert!(profile.cancel_recovery());
        assert_eq!(profile.pending_new_authority, None);
        assert_eq!(profile.guardians.signed_count(), 0);
        assert!(!profile.cancel_recovery());
        assert_err(profile.finalize_recovery(None), ErrorCode::NotAuthorizedToRecover);
    }

    #[test]
    fn test_lowered_threshold_makes_round_ready() {
        let (mut profile, guardians) = profile_with_guardians(3, 3);
        let new_authority = Pubkey::new_unique();
        profile.sign_recovery(&guardians[0], &new_authority).unwrap();
        assert!(!profile.is_recovery_ready());

        profile.set_recovery_threshold(1).unwrap();
        assert!(profile.is_recovery_ready());
        assert_eq!(profile.finalize_recovery(None).unwrap(), new_authority);
    }

    #[test]
    fn test_check_guard() {
        let (mut profile, _) = profile_with_guardians(1, 0);
        let guard = Pubkey::new_unique();

        profile.check_guard(None).unwrap();
        assert_err(profile.check_guard(Some(&guard)), ErrorCode::InvalidGuardTarget);

        profile.guard = Some(guard);
        profile.check_guard(Some(&guard)).unwrap();
        assert_err(profile.check_guard(None), ErrorCode::InvalidGuardTarget);
        assert_err(
            profile.check_guard(Some(&Pubkey::new_unique())),
            ErrorCode::InvalidGuardTarget,
        );
    }

    #[test]
    fn test_profile_serialization_round_trip() {
        let (mut profile, guardians) = profile_with_guardians(2, 4);
        profile
            .sign_recovery(&guardians[2], &Pubkey::new_unique())
            .unwrap();
        profile.guard = Some(Pubkey::new_unique());
        profile.recovered_into = Some(Pubkey::new_unique());
        profile.recovered.insert(Pubkey::new_unique()).unwrap();

        let mut data = Vec::new();
        profile.try_serialize(&mut data).unwrap();
        assert_eq!(data.len(), UserProfile::SPACE);
        assert_eq!(&data[..1], UserProfile::DISCRIMINATOR);

        let decoded = UserProfile::try_deserialize(&mut data.as_slice()).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_guard_account_serialization_round_trip() {
        let guard = GuardAccount {
            context: Some(GuardContext { balance_before: 77 }),
            ..GuardAccount::new(
                Pubkey::new_unique(),
                250,
                GuardPolicyArgs::NativeSolTransfer {
                    transfer_limit: 1_000,
                    transfer_interval: TransferInterval::Week,
                }
                .into_policy(9),
            )
        };

        let mut data = Vec::new();
        guard.try_serialize(&mut data).unwrap();
        assert!(data.len() <= GuardAccount::SPACE);

        let decoded = GuardAccount::try_deserialize(&mut data.as_slice()).unwrap();
        assert_eq!(decoded, guard);
    }

    #[test]
    fn test_guard_account_unknown_policy_tag_is_rejected() {
        let guard = GuardAccount::new(
            Pubkey::new_unique(),
            1,
            GuardPolicyArgs::NativeSolTransfer {
                transfer_limit: 5,
                transfer_interval: TransferInterval::Day,
            }
            .into_policy(0),
        );
        let mut data = Vec::new();
        guard.try_serialize(&mut data).unwrap();

        // discriminator + version + guarded + bump, then the policy tag
        let tag = 1 + 1 + 32 + 1;
        data[tag] = 9;
        assert!(GuardAccount::try_deserialize(&mut data.as_slice()).is_err());
    }

    #[test]
    fn test_profile_rejects_guard_buffer() {
        let guard = GuardAccount::new(
            Pubkey::new_unique(),
            1,
            GuardPolicyArgs::NativeSolTransfer {
                transfer_limit: 5,
                transfer_interval: TransferInterval::Day,
            }
            .into_policy(0),
        );
        let mut data = Vec::new();
        guard.try_serialize(&mut data).unwrap();

        assert!(UserProfile::try_deserialize(&mut data.as_slice()).is_err());
        assert!(UserProfile::try_deserialize(&mut [0u8; UserProfile::SPACE].as_slice()).is_err());
    }
}
