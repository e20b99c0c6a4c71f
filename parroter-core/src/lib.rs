#![doc = "parroter-core: core logic library for em-slack-parroter."]

//! This crate contains the business logic for bulk-installing "Cult of the
//! Party Parrot" emoji into a Slack team: catalog retrieval and parsing,
//! slug derivation, the diff against the team's installed emoji, the
//! sequential install pipeline, and notification formatting.
//!
//! The Slack private web API itself lives behind the [`contract::EmojiService`]
//! trait; the CLI crate supplies the concrete client, and tests supply mocks.

pub mod catalog;
pub mod contract;
pub mod diff;
pub mod install;
pub mod notify;
