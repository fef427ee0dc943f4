//! Retrieval and download of Shanghai Stock Exchange disclosure announcements.

pub mod browser;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod models;
pub mod sse;
pub mod storage;
