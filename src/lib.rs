//! Token-protected image upload service.
//!
//! Accepts a multipart upload on `POST /upload`, checks the shared token, the
//! file size and the extension, stores the file under the MD5 of its original
//! name and answers with the public URL of the stored copy.

pub mod backend;
pub mod cli;
pub mod config;
pub mod consts;
pub mod server;
pub mod utils;
