//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `OutstandingResolver`, which turns a billing
//! profile and its payment history into the charge currently due, and the
//! `SessionManager`, which owns every live scan-to-confirm handshake and
//! serializes all racing events (claim, decision, timeout, cancel) per
//! session.

pub mod resolver;
pub mod session;
