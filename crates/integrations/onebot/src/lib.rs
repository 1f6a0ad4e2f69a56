//! OneBot v11 adapter for RecallGuard.
//!
//! [`OneBotPlatform`] implements the [`Platform`](recallguard_platform::Platform)
//! trait over the OneBot HTTP API (`get_image`, `get_record`,
//! `send_group_msg`, `send_private_msg`, `send_group_forward_msg`), and
//! [`parse_event`] turns raw OneBot event reports into core events.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use recallguard_onebot::{OneBotConfig, OneBotPlatform};
//!
//! let config = OneBotConfig::new("http://127.0.0.1:5700").with_access_token("secret");
//! let platform = OneBotPlatform::new(config).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod provider;
pub mod types;

pub use config::OneBotConfig;
pub use error::OneBotError;
pub use event::parse_event;
pub use provider::OneBotPlatform;
pub use types::{ApiResponse, WireSegment};
