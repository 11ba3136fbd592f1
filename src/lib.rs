//! Weekly Driver Billing & Ledger Engine
//!
//! This crate computes a fleet-rental operator's weekly driver billing:
//! prorated rent by modality, guarantee-deposit installments, km-excess
//! penalties, toll pass-throughs, ticket credits, mora on carried
//! balances and the per-driver running balance ledger, with an idempotent
//! weekly period lifecycle and one-shot termination settlements.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
