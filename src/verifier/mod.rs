mod in_flight;
mod pipeline;

pub use pipeline::VerificationPipeline;
