// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Seal type classification.
//!
//! The type of a seal follows from the encryption wrappers it is built on:
//!
//! - a default seal only has the Shamir wrapper, so its type is [`SealConfigType::Shamir`]
//! - an autoseal with one active wrapper takes that wrapper's type
//! - an autoseal with two or more active wrappers is [`SealConfigType::Multiseal`]
//! - a recovery seal is always [`SealConfigType::Recovery`], because recovery
//!   keys are split locally regardless of the primary seal's mechanism

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

// =============================================================================
// Wrapper kinds
// =============================================================================

/// Kinds of external encryption wrappers an autoseal can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AutosealKind {
	Pkcs11,
	AwsKms,
	/// Legacy alias for PKCS#11 HSM seals.
	HsmAutoDeprecated,
	Transit,
	GcpCkms,
	AzureKeyVault,
	OciKms,
	AliCloudKms,
}

impl AutosealKind {
	/// Returns all autoseal wrapper kinds.
	pub fn all() -> &'static [AutosealKind] {
		&[
			AutosealKind::Pkcs11,
			AutosealKind::AwsKms,
			AutosealKind::HsmAutoDeprecated,
			AutosealKind::Transit,
			AutosealKind::GcpCkms,
			AutosealKind::AzureKeyVault,
			AutosealKind::OciKms,
			AutosealKind::AliCloudKms,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AutosealKind::Pkcs11 => "pkcs11",
			AutosealKind::AwsKms => "awskms",
			AutosealKind::HsmAutoDeprecated => "hsm-auto",
			AutosealKind::Transit => "transit",
			AutosealKind::GcpCkms => "gcpckms",
			AutosealKind::AzureKeyVault => "azurekeyvault",
			AutosealKind::OciKms => "ocikms",
			AutosealKind::AliCloudKms => "alicloudkms",
		}
	}
}

impl fmt::Display for AutosealKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Kind of an encryption wrapper attached to a seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WrapperKind {
	/// The default wrapper used by Shamir seals.
	Shamir,
	Autoseal(AutosealKind),
}

/// An encryption wrapper as seen by the seal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperDescriptor {
	/// Configured name of the wrapper, unique within a seal.
	pub name: String,
	pub kind: WrapperKind,
	/// Disabled wrappers stay configured but take no part in encryption.
	pub disabled: bool,
}

impl WrapperDescriptor {
	pub fn new(name: impl Into<String>, kind: WrapperKind) -> Self {
		Self {
			name: name.into(),
			kind,
			disabled: false,
		}
	}

	pub fn disabled(mut self) -> Self {
		self.disabled = true;
		self
	}
}

// =============================================================================
// SealConfigType
// =============================================================================

/// The "type" of a seal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SealConfigType {
	Shamir,
	Multiseal,
	/// Recovery seals are Shamir-split; encoded as `shamir` on the wire.
	Recovery,
	Autoseal(AutosealKind),
	/// Placeholder for seals that cannot hold a recovery configuration.
	RecoveryUnsupported,
}

impl SealConfigType {
	pub fn as_str(&self) -> &'static str {
		match self {
			SealConfigType::Shamir | SealConfigType::Recovery => "shamir",
			SealConfigType::Multiseal => "multiseal",
			SealConfigType::Autoseal(kind) => kind.as_str(),
			SealConfigType::RecoveryUnsupported => "unsupported",
		}
	}

	/// Compare against a wire-format type string.
	pub fn is_same_as(&self, other: &str) -> bool {
		self.as_str() == other
	}

	/// True for types whose key is split into Shamir shares held by operators.
	pub fn is_shamir_split(&self) -> bool {
		matches!(self, SealConfigType::Shamir | SealConfigType::Recovery)
	}
}

impl fmt::Display for SealConfigType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SealConfigType {
	type Err = RecordError;

	/// Parses the wire form. `shamir` always yields [`SealConfigType::Shamir`];
	/// recovery configurations are decoded through
	/// [`SealConfigRecord::into_recovery_config`](crate::SealConfigRecord::into_recovery_config).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"shamir" => Ok(SealConfigType::Shamir),
			"multiseal" => Ok(SealConfigType::Multiseal),
			"unsupported" => Ok(SealConfigType::RecoveryUnsupported),
			other => AutosealKind::all()
				.iter()
				.find(|kind| kind.as_str() == other)
				.map(|kind| SealConfigType::Autoseal(*kind))
				.ok_or_else(|| RecordError::UnknownSealType(other.to_string())),
		}
	}
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolve the seal type from the wrappers attached to a seal.
///
/// Disabled wrappers and the default Shamir wrapper are ignored. The wrappers
/// are treated as a set of `(name, kind)` pairs, so the result does not depend
/// on the order they are listed in and a wrapper listed twice counts once.
pub fn resolve_seal_type(wrappers: &[WrapperDescriptor], is_recovery_seal: bool) -> SealConfigType {
	if is_recovery_seal {
		return SealConfigType::Recovery;
	}

	let active: BTreeSet<(&str, AutosealKind)> = wrappers
		.iter()
		.filter(|w| !w.disabled)
		.filter_map(|w| match w.kind {
			WrapperKind::Shamir => None,
			WrapperKind::Autoseal(kind) => Some((w.name.as_str(), kind)),
		})
		.collect();

	let mut kinds = active.iter().map(|(_, kind)| *kind);
	match (kinds.next(), kinds.next()) {
		(None, _) => SealConfigType::Shamir,
		(Some(kind), None) => SealConfigType::Autoseal(kind),
		(Some(_), Some(_)) => SealConfigType::Multiseal,
	}
}
