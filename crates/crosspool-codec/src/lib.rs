//! # crosspool-codec
//!
//! **Pure, deterministic encoding for Crosspool.**
//!
//! Everything that crosses between the two ledgers is identified by a
//! Keccak-256 digest over fixed-width, big-endian 32-byte words:
//!
//! - **Report digests**: the remote→local digest that authenticates a
//!   [`ReportBatch`](crosspool_types::ReportBatch) and the local→remote
//!   digest that acknowledges its outcome
//! - **Message keys**: the relay keys under which an inbound report is
//!   pending and an outbound acknowledgement is recorded
//!
//! No state, no I/O: the same input always yields the same word.

pub mod message;
pub mod report_hash;

pub use message::{
    acknowledgement_payload, address_word, inbound_message_key, outbound_message_key, split_u256,
};
pub use report_hash::{
    DigestMode, WordEncoder, acknowledgement_digest, hash_from_report, report_digest,
};
