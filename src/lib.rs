//! KYC Verification Integration API Library
//!
//! This library provides the core functionality for the KYC verification
//! integration API: HMAC request signing for the provider, status payload
//! normalization, database persistence, and HTTP handlers.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `normalizer`: Provider status payload normalization.
//! - `signer`: Provider request signing.
//! - `storage`: Verification record storage operations.
//! - `sumsub_client`: Verification provider client.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod signer;
pub mod storage;
pub mod sumsub_client;
