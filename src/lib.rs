// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Momentum - goal, challenge and habit coaching service
//!
//! This crate provides the HTTP backend for a personal growth app: 30-day
//! goals broken into daily challenges, habit tracking with spoken check-ins,
//! a voice diary and AI coach conversations.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password accounts and signed cookie sessions
//! - `ai` - Chat, transcription and speech provider client
//! - `http` - Bounded outbound fetches
//! - `storage` - JSON document store on the local filesystem

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod demo;
pub mod error;
pub mod http;
pub mod models;
pub mod state;
pub mod storage;
