// Authentication module
// Sign-in flows for the two credentials and the code exchange endpoint

mod exchange;
mod flow;
mod types;

pub use exchange::exchange_code;
pub use flow::{AuthFlow, CallbackOutcome};
pub use types::{CallbackParams, FlowKind, ProviderConfig, TokenExchangeRequest, TokenResponse};
