//! LINE Messaging API surface for rentquote
//!
//! - **Signatures** (`signature`) - `x-line-signature` HMAC check of raw webhook bodies
//! - **Events** (`events`) - the subset of the webhook payload the dialogue reads
//! - **Messages** (`messages`) - quick-reply prompts, postback payloads and the price card
//! - **Handler** (`handler`) - maps one event to one reply through the dialogue engine
//! - **Client** (`client`) - reply API transport behind the `LineReplyClient` trait
//!
//! # Flow
//!
//! ```text
//! POST /webhook → SignatureVerifier → WebhookPayload → DialogueHandler → DialogueEngine
//!                                                            ↓
//!                                       LineReplyClient ← Reply (quick reply / Flex card)
//! ```

pub mod client;
pub mod events;
pub mod handler;
pub mod messages;
pub mod signature;

pub use client::{HttpReplyClient, LineReplyClient, NoopReplyClient, RecordingReplyClient, Reply, ReplyError};
pub use events::{WebhookEvent, WebhookPayload};
pub use handler::DialogueHandler;
pub use messages::LineMessage;
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};
