//! At-most-one in-flight operation, shared by every concurrent caller.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::_prelude::*;

/// Handle a caller awaits; cloning it does not restart the work.
pub(crate) type FlightHandle<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Flight<T>
where
	T: Clone,
{
	id: u64,
	handle: FlightHandle<T>,
}

/// Slot holding the current flight, if any.
///
/// The slot lock is only held to inspect or swap the handle, never across an `.await`. The
/// flight clears its own slot when it completes, so the next caller starts fresh work.
pub(crate) struct SingleFlight<T>
where
	T: Clone,
{
	slot: Arc<Mutex<Option<Flight<T>>>>,
	next_id: AtomicU64,
}
impl<T> SingleFlight<T>
where
	T: 'static + Clone + Send + Sync,
{
	/// Returns the in-flight handle, or starts `work` and returns its handle.
	///
	/// The boolean is `true` when this call started the flight.
	pub(crate) fn join_or_start<F>(&self, work: F) -> (FlightHandle<T>, bool)
	where
		F: FnOnce() -> BoxFuture<'static, Result<T>>,
	{
		let mut slot = self.slot.lock();

		if let Some(flight) = slot.as_ref() {
			return (flight.handle.clone(), false);
		}

		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let owner = self.slot.clone();
		let work = work();
		let handle = async move {
			let result = work.await;
			let mut slot = owner.lock();

			if slot.as_ref().is_some_and(|flight| flight.id == id) {
				*slot = None;
			}

			result
		}
		.boxed()
		.shared();

		*slot = Some(Flight { id, handle: handle.clone() });

		(handle, true)
	}

	/// Returns `true` while a flight is running.
	pub(crate) fn in_flight(&self) -> bool {
		self.slot.lock().is_some()
	}
}
impl<T> Default for SingleFlight<T>
where
	T: Clone,
{
	fn default() -> Self {
		Self { slot: Arc::new(Mutex::new(None)), next_id: AtomicU64::new(0) }
	}
}
impl<T> Debug for SingleFlight<T>
where
	T: Clone,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SingleFlight").field("in_flight", &self.slot.lock().is_some()).finish()
	}
}
