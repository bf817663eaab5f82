// Copyright 2026 Imgharvest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Imgharvest library: find the images a set of web pages references and
//! bundle a chosen subset into a single zip archive.
//!
//! This library crate exposes the core modules for integration testing.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod discover;
pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod rest;
