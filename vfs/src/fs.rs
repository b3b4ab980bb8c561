//! 文件系统驱动的操作表
//!
//! 每个驱动实现一次[`FileSystem`]并注册到VFS；
//! 驱动不支持的操作保留默认实现，返回[`Error::Unsupported`]。

use alloc::sync::Arc;

use crate::{Device, DirEntry, Error, Mount, OpenFile, Result, Stat, StatVfs};

#[allow(unused_variables)]
pub trait FileSystem: Send + Sync {
    /// 驱动名，注册与`statvfs`共用
    fn name(&self) -> &'static str;

    // 挂载生命周期

    fn mount(&self, mnt: &mut Mount, dev: &Arc<Device>, param: Option<&str>) -> Result<()>;

    fn unmount(&self, mnt: &mut Mount, force: bool) -> Result<()>;

    fn mkfs(&self, mnt: &Mount, param: Option<&str>) -> Result<()> {
        Err(Error::Unsupported)
    }

    // 路径操作

    fn link(&self, mnt: &Mount, old: &str, new: &str) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn unlink(&self, mnt: &Mount, path: &str) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn mkdir(&self, mnt: &Mount, path: &str, mode: u32) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn rmdir(&self, mnt: &Mount, path: &str) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn rename(&self, mnt: &Mount, old: &str, new: &str) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn sync(&self, mnt: &Mount) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn truncate(&self, mnt: &Mount, path: &str, len: u64) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn stat(&self, mnt: &Mount, path: &str) -> Result<Stat> {
        Err(Error::Unsupported)
    }

    fn lstat(&self, mnt: &Mount, path: &str) -> Result<Stat> {
        self.stat(mnt, path)
    }

    fn statvfs(&self, mnt: &Mount) -> Result<StatVfs> {
        Err(Error::Unsupported)
    }

    // 文件操作

    fn open(
        &self,
        mnt: &Mount,
        file: &mut OpenFile,
        path: &str,
        oflag: u32,
        mode: u32,
    ) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn close(&self, mnt: &Mount, file: &mut OpenFile) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn read(&self, mnt: &Mount, file: &OpenFile, buf: &mut [u8]) -> Result<usize> {
        Err(Error::Unsupported)
    }

    fn write(&self, mnt: &Mount, file: &OpenFile, buf: &[u8]) -> Result<usize> {
        Err(Error::Unsupported)
    }

    fn ioctl(&self, mnt: &Mount, file: &OpenFile, cmd: i32, arg: usize) -> Result<i32> {
        Err(Error::Unsupported)
    }

    fn fcntl(&self, mnt: &Mount, file: &mut OpenFile, cmd: i32, arg: u32) -> Result<u32> {
        Err(Error::Unsupported)
    }

    fn fstat(&self, mnt: &Mount, file: &OpenFile) -> Result<Stat> {
        Err(Error::Unsupported)
    }

    fn isatty(&self, mnt: &Mount, file: &OpenFile) -> bool {
        false
    }

    fn fsync(&self, mnt: &Mount, file: &OpenFile) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn fdatasync(&self, mnt: &Mount, file: &OpenFile) -> Result<()> {
        self.fsync(mnt, file)
    }

    fn ftruncate(&self, mnt: &Mount, file: &OpenFile, len: u64) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// 返回新的文件偏移
    fn lseek(&self, mnt: &Mount, file: &OpenFile, offset: i64, whence: i32) -> Result<u64> {
        Err(Error::Unsupported)
    }

    fn poll(&self, mnt: &Mount, file: &OpenFile) -> Result<u32> {
        Err(Error::Unsupported)
    }

    // 目录操作

    fn opendir(&self, mnt: &Mount, file: &mut OpenFile, path: &str) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn closedir(&self, mnt: &Mount, file: &mut OpenFile) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// 读到目录末尾时返回`Ok(None)`
    fn readdir(&self, mnt: &Mount, file: &OpenFile) -> Result<Option<DirEntry>> {
        Err(Error::Unsupported)
    }

    fn rewinddir(&self, mnt: &Mount, file: &OpenFile) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// `loc`是[`FileSystem::telldir`]给出的不透明游标
    fn seekdir(&self, mnt: &Mount, file: &OpenFile, loc: u64) -> Result<()> {
        Err(Error::Unsupported)
    }

    fn telldir(&self, mnt: &Mount, file: &OpenFile) -> Result<u64> {
        Err(Error::Unsupported)
    }
}
