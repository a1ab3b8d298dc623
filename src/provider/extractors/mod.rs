// Video extractors - turn a host's embed URL into playable sources
//
// Each video host gets one `VideoExtractor`. The registry picks the
// extractor from the embed URL's host, so sites never name a host directly.

mod crypto;
mod rapidcloud;
mod registry;
mod traits;

pub use crypto::decrypt_passphrase;
pub use rapidcloud::RapidCloud;
pub use registry::ExtractorRegistry;
pub use traits::{ExtractionContext, VideoExtractor};

#[cfg(test)]
pub(crate) use crypto::{FIXTURE, FIXTURE_KEY};
