//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (keys, identity, errors)
//! - `profile` - Attendee profile aggregate and list membership
//! - `conference` - Conference aggregate and seat accounting
//! - `session` - Conference session aggregate and field normalization

pub mod conference;
pub mod foundation;
pub mod profile;
pub mod session;
