//! Folio Server Library
//!
//! On-demand rendering of catalog PDF pages to watermarked PNG images, with
//! access control for restricted (premium) documents.
//!
//! # Modules
//!
//! - `auth`: bearer token verification (HS256 identity claims)
//! - `catalog`: read-only document metadata store
//! - `storage`: filesystem asset store for document bytes
//! - `render`: the render pipeline (sandbox pool, rasterizer, compositor)
//! - `routes`: HTTP surface
//! - `events`: broadcast notifications for rendered pages
//!
//! The binary in `src/bin/page_worker.rs` is the sandboxed rasterizer: the
//! server never decodes untrusted PDF bytes in-process.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod render;
pub mod routes;
pub mod state;
pub mod storage;
