//! Request-scoped single-flight memoization

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Memoizes results by key for the lifetime of one value of this type.
///
/// Create one per rendering pass. Concurrent callers asking for the same key
/// share a single execution of the initializer and all receive a clone of
/// its result; later callers get the memoized value without running it.
/// Results are memoized whether they are successes or failures, so every
/// component in one pass sees the same answer.
///
/// # Examples
///
/// ```
/// use wayfare_cache::RequestMemo;
///
/// # async fn example() {
/// let memo: RequestMemo<u32> = RequestMemo::new();
/// let a = memo.get_or_init("answer", || async { 42 }).await;
/// let b = memo.get_or_init("answer", || async { 0 }).await;
/// assert_eq!((a, b), (42, 42));
/// # }
/// ```
pub struct RequestMemo<V> {
	cells: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> std::fmt::Debug for RequestMemo<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RequestMemo")
			.field("keys", &self.cells.lock().len())
			.finish()
	}
}

impl<V: Clone> RequestMemo<V> {
	/// Create an empty memo
	pub fn new() -> Self {
		Self {
			cells: Mutex::new(HashMap::new()),
		}
	}

	/// Return the memoized value for `key`, running `init` if no caller has yet.
	pub async fn get_or_init<F, Fut>(&self, key: &str, init: F) -> V
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = V>,
	{
		let cell = {
			let mut cells = self.cells.lock();
			Arc::clone(cells.entry(key.to_string()).or_default())
		};
		cell.get_or_init(init).await.clone()
	}

	/// Whether a value for `key` has already been resolved
	pub fn contains(&self, key: &str) -> bool {
		self.cells
			.lock()
			.get(key)
			.is_some_and(|cell| cell.initialized())
	}

	/// Number of distinct keys requested so far
	pub fn len(&self) -> usize {
		self.cells.lock().len()
	}

	/// Whether no key has been requested yet
	pub fn is_empty(&self) -> bool {
		self.cells.lock().is_empty()
	}
}

impl<V: Clone> Default for RequestMemo<V> {
	fn default() -> Self {
		Self::new()
	}
}
