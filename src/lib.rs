//! Lead Capture Library
//!
//! This library provides the lead intake wizard (field validators, branching
//! step engine, webhook submission) and the conversion reporting pipeline
//! (pixel + server-side relay to the Meta Conversions API).
//!
//! # Modules
//!
//! - `api`: HTTP-facing components of the relay.
//! - `core`: Form logic: validators, wizard engine, submission, reporting.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `conversion`: Client-side conversion reporter (pixel + relay POST).
//! - `errors`: Error handling types.
//! - `handlers`: Application state and route wiring.
//! - `hashing`: Hash policy and normalization of contact fields.
//! - `lead_models`: Lead payload posted to the webhook.
//! - `meta_client`: Meta Conversions API client.
//! - `meta_lead_handler`: Conversion relay endpoint.
//! - `meta_models`: Relay and Conversions API data models.
//! - `submission`: Lead submission pipeline.
//! - `validators`: CNPJ, phone and e-mail validators and masks.
//! - `wizard`: Wizard session and step engine.
//! - `wizard_models`: Steps, branches, fields and the transition table.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod conversion;
pub mod errors;
pub mod handlers;
pub mod hashing;
pub mod lead_models;
pub mod meta_client;
pub mod meta_lead_handler;
pub mod meta_models;
pub mod submission;
pub mod validators;
pub mod wizard;
pub mod wizard_models;
