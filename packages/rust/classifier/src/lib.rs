//! Classifier adapter over an external reasoning service.
//!
//! - [`ReasoningService`] is the backend boundary; [`OpenRouterService`] is
//!   the production implementation.
//! - [`Classifier`] turns one prompt into one typed verdict, retrying per
//!   [`RetryPolicy`] and yielding `None` when it gives up.
//! - [`prompts`] holds the relevance, media, and composition templates.

pub mod adapter;
pub mod openrouter;
pub mod prompts;
pub mod retry;
pub mod service;

pub use adapter::{Classifier, parse_structured, strip_code_fences};
pub use openrouter::OpenRouterService;
pub use prompts::{GeneratedCopy, MediaVerdict, RelevanceVerdict};
pub use retry::RetryPolicy;
pub use service::{ImageAttachment, ReasoningRequest, ReasoningService, ServiceError};
