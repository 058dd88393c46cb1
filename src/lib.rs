//! MCP server that lets LLMs manage data in Redis and Valkey.
//!
//! Connection parameters are merged from defaults, `REDIS_*` environment
//! variables, an optional `redis://`/`rediss://` URI, and CLI flags; a
//! single lazily-constructed standalone or cluster client is shared by
//! every tool call. The tool surface covers strings, hashes, lists, sets,
//! sorted sets, streams, pub/sub, JSON documents, and vector search.

pub mod config;
pub mod connection;
pub mod error;
pub mod server;
pub mod tools;
