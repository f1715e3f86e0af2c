use std::fmt;

use super::Credential;
use super::GenerationRequest;

/// Identifies one dispatched generation. Completions carrying an id other
/// than the one currently awaited are discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    pub fn new(id: u64) -> GenerationId {
        return GenerationId(id);
    }

    pub fn next(&self) -> GenerationId {
        return GenerationId(self.0 + 1);
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

/// Everything a worker needs to run an accepted submission.
#[derive(Clone, Debug)]
pub struct GenerationTicket {
    pub id: GenerationId,
    pub request: GenerationRequest,
    pub credential: Credential,
}
