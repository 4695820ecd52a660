//! # Regatta — Registration and Event Lifecycle Core
//!
//! Backend core for multi-discipline paddle-sport regattas: boat-class
//! cataloguing, participant registration with crew-composition rules, team
//! cost allocation, and a timed event lifecycle scheduler, all backed by
//! PostgreSQL.
//!
//! ## Modules
//!
//! - [`catalog`] — boat-class identifiers, capacities, and crew role layouts
//! - [`domain`] — shared value types (sex buckets, roles, statuses, distances)
//! - [`dates`] — Russian free-text event date parsing and lifecycle instants
//! - [`db`] — the PostgreSQL storage layer
//! - [`roster`] — pure crew admission and completeness rules
//! - [`ledger`] — transactional team service built on top of the roster
//! - [`registration`] — the entry engine with its caller-facing error taxonomy
//! - [`cost`] — per-registration fee allocation
//! - [`lifecycle`] — the idempotent status-advancement tick
//! - [`audit`] — append-only operational audit records

pub mod audit;
pub mod catalog;
pub mod cost;
pub mod dates;
pub mod db;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod registration;
pub mod roster;
