// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper type that prevents accidental logging of sensitive values.
//!
//! [`Secret<T>`] owns a value that must never reach logs, traces or error
//! messages:
//!
//! - `Debug` and `Display` always print [`REDACTED`]
//! - the inner value is zeroized when the wrapper is dropped
//! - with the `serde` feature, deserialization reads the real value while
//!   serialization writes the redaction marker
//!
//! Access to the inner value is explicit via [`Secret::expose`], which makes
//! every read of key material greppable.
//!
//! ```
//! use loom_common_secret::Secret;
//!
//! let key = Secret::new(vec![0x42u8; 32]);
//! assert_eq!(format!("{key:?}"), "[REDACTED]");
//! assert_eq!(key.expose().len(), 32);
//! ```

use std::fmt;

use zeroize::Zeroize;

/// Placeholder printed in place of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// A value that is redacted when formatted and zeroized when dropped.
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// Convenience alias for secret strings (tokens, passwords).
pub type SecretString = Secret<String>;

/// Convenience alias for secret byte buffers (keys, key shares).
pub type SecretBytes = Secret<Vec<u8>>;

impl<T: Zeroize> Secret<T> {
	/// Wrap a value.
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the inner value.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Mutably borrow the inner value.
	pub fn expose_mut(&mut self) -> &mut T {
		&mut self.inner
	}
}

impl<T: Zeroize + Default> Secret<T> {
	/// Move the inner value out, leaving a zeroized default behind.
	pub fn into_inner(mut self) -> T {
		std::mem::take(&mut self.inner)
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T: Zeroize> From<T> for Secret<T> {
	fn from(inner: T) -> Self {
		Self::new(inner)
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl SecretString {
	/// Returns true if the secret string is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, T: Zeroize + serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		T::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::io;
	use std::sync::{Arc, Mutex};

	#[derive(Clone, Default)]
	struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

	impl io::Write for CaptureWriter {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret:?}"), REDACTED);
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn expose_returns_inner_value() {
		let secret = Secret::new(vec![1u8, 2, 3]);
		assert_eq!(secret.expose(), &vec![1u8, 2, 3]);
	}

	#[test]
	fn clone_is_independent() {
		let original = Secret::new(vec![7u8; 4]);
		let mut copy = original.clone();
		copy.expose_mut()[0] = 0;
		assert_eq!(original.expose()[0], 7);
		assert_eq!(copy.expose()[0], 0);
	}

	#[test]
	fn into_inner_moves_value_out() {
		let secret = SecretString::new("token".to_string());
		assert_eq!(secret.into_inner(), "token");
	}

	#[test]
	fn serialize_writes_redaction_marker() {
		let secret = SecretString::new("api-key".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	#[test]
	fn deserialize_reads_real_value() {
		let secret: SecretString = serde_json::from_str("\"api-key\"").unwrap();
		assert_eq!(secret.expose(), "api-key");
	}

	#[test]
	fn secret_never_reaches_tracing_output() {
		let buffer = CaptureWriter::default();
		let writer = buffer.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_writer(move || writer.clone())
			.with_ansi(false)
			.finish();

		let secret = SecretString::new("correct-horse-battery-staple".to_string());
		tracing::subscriber::with_default(subscriber, || {
			tracing::info!(key = ?secret, shown = %secret, "handling key");
		});

		let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
		assert!(output.contains("handling key"));
		assert!(output.contains(REDACTED));
		assert!(!output.contains("correct-horse-battery-staple"));
	}

	proptest! {
		#[test]
		fn prop_debug_never_contains_value(value in "[a-zA-Z0-9]{12,64}") {
			let secret = SecretString::new(value.clone());
			let debug = format!("{secret:?}");
			prop_assert!(!debug.contains(&value));
		}
	}
}
