// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom seal configuration.
//!
//! This crate describes how the master key is currently split and protected:
//!
//! - [`SealConfig`]: the in-memory seal configuration entity and its validator
//! - [`SealConfigRecord`]: the persisted/transmitted schema for a configuration
//! - [`SealConfigType`] and [`resolve_seal_type`]: classification of the active
//!   seal from its encryption wrappers
//! - [`ShareEncryptor`]: the contract used to protect key shares handed to
//!   operators, with an OpenPGP implementation in [`PgpShareEncryptor`]
//!
//! Nothing in this crate performs I/O; the rekey protocol built on top of it
//! lives in `loom-server-seal`.

pub mod config;
pub mod error;
pub mod pgp;
pub mod record;
pub mod seal_type;
pub mod share_encryption;

pub use config::{SealConfig, MAX_SHARES};
pub use error::{RecordError, ValidationError};
pub use pgp::PgpShareEncryptor;
pub use record::SealConfigRecord;
pub use seal_type::{
	resolve_seal_type, AutosealKind, SealConfigType, WrapperDescriptor, WrapperKind,
};
pub use share_encryption::{encrypt_shares, ShareEncryptionError, ShareEncryptor};
