//! Unit tests for quant-deploy
//!
//! These tests use mocked ports and run fast without touching the host.

mod bootstrap_service;
mod preflight_service;
