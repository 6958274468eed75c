//! Core business logic for Fintrack.
//!
//! This crate contains pure business logic with ZERO storage or async dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, income/expense transactions, validation and balance deltas
//! - `recurring` - Next-occurrence date arithmetic and catch-up planning
//! - `reports` - Time-bucketed chart reports over a transaction snapshot

pub mod ledger;
pub mod recurring;
pub mod reports;
