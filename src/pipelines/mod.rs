// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ PNG data URI │
//! │   (RGBA)     │     │  - Region crop    │     │              │
//! │              │     │  - Overlay/stamp  │     │              │
//! │              │     │  - PNG encoding   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Compositing a frame onto the print surface and encoding it

pub mod photo;
