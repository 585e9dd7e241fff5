pub mod downloader;
pub mod html;
pub mod patcher;
