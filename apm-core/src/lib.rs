#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Core domain models for the marketplace.
///
/// The types in this module are plain data structures with minimal behavior,
/// keeping domain entities separate from their persistence and transport
/// representations.
pub mod models;

/// Interface traits for the marketplace.
///
/// These traits define the contract between the domain logic and external
/// adapters (the database, object storage, the identity provider) without
/// specifying implementation details.
pub mod ports;

/// Bid acceptance and listing lifecycle rules.
pub mod bidding;
