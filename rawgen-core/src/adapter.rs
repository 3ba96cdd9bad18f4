//! Backend adapter trait.

use crate::error::GenError;
use crate::types::*;
use std::fmt::Debug;

/// Per-backend strategy pairing request construction with response extraction.
///
/// Adapters are self-contained: everything they need arrives through the
/// arguments, so they can be exercised without a live host.
pub trait BackendAdapter: Send + Sync + Debug + 'static {
    /// The backend this adapter serves
    fn backend(&self) -> BackendId;

    /// Turn a validated prompt and host parameters into a transport-ready payload.
    ///
    /// The payload carries only the prompt itself; no history or persona.
    fn build_payload(
        &self,
        req: &GenerationRequest,
        params: &GenerationParams,
    ) -> Result<Payload, GenError>;

    /// Pull the generated text out of a response body.
    ///
    /// Returns `None` when the body has no recognizable text.
    fn extract(&self, body: &ResponseBody) -> Option<String>;
}
