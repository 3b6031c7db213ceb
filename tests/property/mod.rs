// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Path derivation, provisional item migration, finalization, result
//! collection and reconciliation payloads.

mod drift_payload;
mod finalization;
mod item_migration;
mod path_uniqueness;
mod result_collection;
