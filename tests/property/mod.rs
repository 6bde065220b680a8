// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Validation, tagging and partition naming properties.

mod partitions;
mod validation;
