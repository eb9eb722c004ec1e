/// Batch-level retry state
///
/// Carried from one pass of a batch to the next. Every escalated pass bumps
/// `retry_attempt`; only a proxy change moves `proxy_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    /// Number of escalated passes run so far
    pub retry_attempt: u32,

    /// Proxy in use; `None` means a direct connection
    pub proxy_index: Option<usize>,
}

impl RetryContext {
    /// Context of the first pass: no retries, direct connection
    pub fn initial() -> Self {
        Self::default()
    }

    /// Returns true once more escalated passes were run than allowed
    pub fn exceeds(&self, max_batch_retries: u32) -> bool {
        self.retry_attempt > max_batch_retries
    }

    /// The proxy index the next proxy rotation would use
    pub fn next_proxy_index(&self) -> usize {
        self.proxy_index.map_or(0, |i| i + 1)
    }

    /// Context for a pass through the next proxy
    ///
    /// # Returns
    ///
    /// * `Some(RetryContext)` - The next proxy exists
    /// * `None` - All `available` proxies have been used
    pub fn rotate_proxy(&self, available: usize) -> Option<Self> {
        let next = self.next_proxy_index();
        (next < available).then(|| Self {
            retry_attempt: self.retry_attempt + 1,
            proxy_index: Some(next),
        })
    }

    /// Context for a pass with a fresh browser on the same proxy
    pub fn relaunch(&self) -> Self {
        Self {
            retry_attempt: self.retry_attempt + 1,
            proxy_index: self.proxy_index,
        }
    }
}
