//! Response decoder module
//!
//! # Overview
//!
//! Decoders turn raw page bodies into typed items; [`dispatch`] forwards
//! those items into a pagination run. The paginator never knows the item
//! type, only the decoder does.

mod decoders;
mod dispatch;
mod types;

pub use decoders::JsonDecoder;
pub use dispatch::{dispatch, Dispatched};
pub use types::{MapItems, RecordDecoder, RecordDecoderExt};
