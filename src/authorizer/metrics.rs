// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how the authorizer coordinated its callers.
#[derive(Debug, Default)]
pub struct AuthorizerMetrics {
	flights: AtomicU64,
	joined: AtomicU64,
	refresh_fallbacks: AtomicU64,
	presentations: AtomicU64,
	revocations: AtomicU64,
}
impl AuthorizerMetrics {
	/// Returns the number of authenticate flights started.
	pub fn flights(&self) -> u64 {
		self.flights.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that joined a flight instead of starting one.
	pub fn joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Returns how often a failed refresh fell back to the interactive grant.
	pub fn refresh_fallbacks(&self) -> u64 {
		self.refresh_fallbacks.load(Ordering::Relaxed)
	}

	/// Returns how many interactive logins were presented.
	pub fn presentations(&self) -> u64 {
		self.presentations.load(Ordering::Relaxed)
	}

	/// Returns the number of revoke flights started.
	pub fn revocations(&self) -> u64 {
		self.revocations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_flight(&self) {
		self.flights.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_fallback(&self) {
		self.refresh_fallbacks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_presentation(&self) {
		self.presentations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revocation(&self) {
		self.revocations.fetch_add(1, Ordering::Relaxed);
	}
}
