/// State owned by the read cycle.
///
/// Only the task currently running a connection's read cycle touches it;
/// the lock around it is never contended.
#[derive(Debug, Default)]
pub(super) struct ReadState {
    /// Undecoded bytes from the previous cycle: a partial request
    /// header block, or a partial frame.
    pub carry: Vec<u8>,
}

impl ReadState {
    #[inline]
    pub fn new(carry: Vec<u8>) -> Self { Self { carry } }
}
