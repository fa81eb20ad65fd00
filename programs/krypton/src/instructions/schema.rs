//! Opcode tables per protocol version.
//!
//! Opcodes 1 and 6 changed meaning between versions, so raw instruction bytes
//! are only meaningful together with the version they were built for. The
//! program dispatches `ProtocolVersion::Current`; `Legacy` is kept for decoding
//! historical instructions.

use anchor_lang::prelude::*;

use super::errors::ErrorCode;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProtocolVersion {
    Legacy,
    Current,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstructionKind {
    InitializeWallet,
    TransferToken,
    TransferNativeSol,
    WrapInstruction,
    AddRecoveryGuardians,
    RecoverWallet,
    ModifyRecoveryThreshold,
    RemoveRecoveryGuardians,
    AddRecoverySign,
    RecoverToken,
    RecoverNativeSol,
    InitializeGuard,
    CancelRecovery,
}

const CURRENT: &[(u8, InstructionKind)] = &[
    (0, InstructionKind::InitializeWallet),
    (1, InstructionKind::TransferToken),
    (2, InstructionKind::TransferNativeSol),
    (3, InstructionKind::WrapInstruction),
    (4, InstructionKind::AddRecoveryGuardians),
    (5, InstructionKind::RecoverWallet),
    (6, InstructionKind::ModifyRecoveryThreshold),
    (7, InstructionKind::RemoveRecoveryGuardians),
    (8, InstructionKind::AddRecoverySign),
    (9, InstructionKind::RecoverToken),
    (10, InstructionKind::RecoverNativeSol),
    (11, InstructionKind::InitializeGuard),
    (12, InstructionKind::CancelRecovery),
];

const LEGACY: &[(u8, InstructionKind)] = &[
    (0, InstructionKind::InitializeWallet),
    (1, InstructionKind::AddRecoveryGuardians),
    (2, InstructionKind::ModifyRecoveryThreshold),
    (3, InstructionKind::RemoveRecoveryGuardians),
    (5, InstructionKind::RecoverWallet),
    (6, InstructionKind::RecoverToken),
    (8, InstructionKind::AddRecoverySign),
];

impl ProtocolVersion {
    fn table(&self) -> &'static [(u8, InstructionKind)] {
        match self {
            Self::Legacy => LEGACY,
            Self::Current => CURRENT,
        }
    }

    pub fn kind(&self, opcode: u8) -> Result<InstructionKind> {
        self.table()
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| error!(ErrorCode::UnknownInstruction))
    }

    pub fn opcode(&self, kind: InstructionKind) -> Option<u8> {
        self.table()
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(op, _)| *op)
    }

    /// Length of the argument bytes for layouts that have a fixed size.
    pub fn args_len(&self, kind: InstructionKind) -> Option<usize> {
        use InstructionKind::*;

        match (self, kind) {
            // account-length hint, then the threshold
            (Self::Legacy, InitializeWallet) => Some(2),
            (Self::Current, InitializeWallet) => Some(1),
            (_, ModifyRecoveryThreshold) => Some(1),
            (_, TransferToken | TransferNativeSol) => Some(8),
            (_, InitializeGuard | WrapInstruction) => None,
            (
                _,
                AddRecoveryGuardians
                | RemoveRecoveryGuardians
                | AddRecoverySign
                | RecoverWallet
                | RecoverToken
                | RecoverNativeSol
                | CancelRecovery,
            ) => Some(0),
        }
    }

    /// Splits raw instruction data into its kind and argument bytes.
    pub fn split<'a>(&self, data: &'a [u8]) -> Result<(InstructionKind, &'a [u8])> {
        let (opcode, args) = data
            .split_first()
            .ok_or_else(|| error!(ErrorCode::UnknownInstruction))?;
        let kind = self.kind(*opcode)?;

        if let Some(len) = self.args_len(kind) {
            require!(args.len() == len, ErrorCode::UnknownInstruction);
        }
        Ok((kind, args))
    }
}
