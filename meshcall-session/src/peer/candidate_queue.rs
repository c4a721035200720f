use meshcall_core::IceCandidate;

/// Holds remote candidates that arrive before the remote description.
///
/// Candidates are released in arrival order, once, when the description lands.
#[derive(Debug, Default)]
pub(crate) struct CandidateQueue {
    remote_description_set: bool,
    pending: Vec<IceCandidate>,
}

impl CandidateQueue {
    /// Returns the candidate back if it can be applied now, otherwise keeps it.
    pub(crate) fn push(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_description_set {
            Some(candidate)
        } else {
            self.pending.push(candidate);
            None
        }
    }

    pub(crate) fn remote_description_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_description_set = true;
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
