#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod flags;
mod fs;
mod mount;
pub mod registry;
mod stat;

pub use self::{
    dirent::{DirEntry, DirEntryType},
    error::{Error, Result},
    flags::{fcntl, whence, FileFlag, OpenFlag},
    fs::FileSystem,
    mount::{Device, FileCtx, Mount, OpenFile},
    stat::{mode, Stat, StatVfs},
};

/// 挂载点根目录在驱动看来的路径
///
/// VFS去掉挂载点前缀后，根目录可能表现为空串或`/`。
#[inline]
pub fn path_is_root(path: &str) -> bool {
    path.is_empty() || path == "/"
}
