//! Posting API boundary.
//!
//! [`Poster`] sends one message and returns the id the channel assigned.
//! [`XPoster`] implements it for the X API v2. [`compose_message`] builds
//! the outbound text within the channel's character limit.

pub mod message;
pub mod poster;

pub use message::compose_message;
pub use poster::{PostError, PostReceipt, Poster, XPoster};
