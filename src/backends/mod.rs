// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! The booth never talks to hardware directly. A backend acquires a live feed
//! and every later frame read goes through that feed:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Booth Layer                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────┐ ┌──────────────┐ ┌─────────┐  │
//! │  │   V4L2   │ │ Test pattern │ │  Still  │  │
//! │  └──────────┘ └──────────────┘ └─────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera backends, device enumeration and live feeds

pub mod camera;
