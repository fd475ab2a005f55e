mod signature;

pub use signature::{StripeSignatureMiddlewareFactory, StripeSignatureMiddlewareService};
