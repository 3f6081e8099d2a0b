//! Read model trait for query-side views.

pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Entries currently held. Returns 0 while the view is being written.
    fn count(&self) -> usize;
}
