//! Deployment packaging: resolves configured source paths into archive
//! entries and writes them into a single compressed zip archive.

pub mod fs_utils;
pub mod naming;
pub mod packaging;
pub mod shell_exec;
