pub mod handlers;
pub mod intake;
pub mod materializer;
pub mod pipeline;
pub mod poller;
pub mod references;
pub mod router;
pub mod types;
pub mod veo;

pub use router::videogen_router;
