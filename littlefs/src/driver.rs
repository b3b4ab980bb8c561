//! # 文件系统操作表
//!
//! [`LittleFs`]把VFS的每个入口翻译成一次加锁的引擎调用。
//! 锁只覆盖引擎调用本身，错误转换与文件对象的修改都在解锁之后。

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::marker::PhantomData;

use enumflags2::BitFlags;
use vfs::{
    fcntl, mode, Device, DirEntry, Error, FileFlag, FileSystem, Mount, OpenFile, Result, Stat,
    StatVfs,
};

use crate::engine::Storage;
use crate::handle::Handle;
use crate::translate;
use crate::volume::Volume;
use crate::NAME;

/// 引擎不保存权限，所有条目一律报告为全权限
const PERMISSION: u32 = mode::S_IRWXU | mode::S_IRWXG | mode::S_IRWXO;

/// littlefs驱动
pub struct LittleFs<E>(PhantomData<fn() -> E>);

impl<E: Storage> LittleFs<E> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Storage> Default for LittleFs<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// 未挂载的挂载点没有上下文
fn volume<E: Storage>(mnt: &Mount) -> Result<&Volume<E>> {
    mnt.ctx::<Volume<E>>().ok_or(Error::Fault)
}

#[inline]
fn normalize(path: &str) -> &str {
    if vfs::path_is_root(path) { "/" } else { path }
}

impl<E: Storage> FileSystem for LittleFs<E> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mount(&self, mnt: &mut Mount, dev: &Arc<Device>, _param: Option<&str>) -> Result<()> {
        let cfg = dev.ctx::<E::Config>().ok_or(Error::Fault)?;
        let volume = Volume::<E>::mount(cfg)?;
        mnt.ctx = Some(Box::new(volume));
        log::info!("littlefs: mounted {} on {}", dev.name, mnt.name);
        Ok(())
    }

    fn unmount(&self, mnt: &mut Mount, _force: bool) -> Result<()> {
        let volume = volume::<E>(mnt)?;
        let (ret, open) = {
            let mut inner = volume.lock();
            (inner.lfs.unmount(), inner.handles.len())
        };
        ret?;
        // 锁与未关闭的句柄随上下文一起释放
        mnt.ctx = None;
        log::info!("littlefs: unmounted {} ({open} handles dropped)", mnt.name);
        Ok(())
    }

    fn mkfs(&self, mnt: &Mount, _param: Option<&str>) -> Result<()> {
        volume::<E>(mnt)?.mkfs()?;
        log::info!("littlefs: formatted {}", mnt.dev.name);
        Ok(())
    }

    fn unlink(&self, mnt: &Mount, path: &str) -> Result<()> {
        let ret = volume::<E>(mnt)?.lock().lfs.remove(path);
        Ok(ret?)
    }

    fn mkdir(&self, mnt: &Mount, path: &str, _mode: u32) -> Result<()> {
        let ret = volume::<E>(mnt)?.lock().lfs.mkdir(path);
        Ok(ret?)
    }

    fn rmdir(&self, mnt: &Mount, path: &str) -> Result<()> {
        self.unlink(mnt, path)
    }

    fn rename(&self, mnt: &Mount, old: &str, new: &str) -> Result<()> {
        let ret = volume::<E>(mnt)?.lock().lfs.rename(old, new);
        Ok(ret?)
    }

    fn sync(&self, mnt: &Mount) -> Result<()> {
        Ok(volume::<E>(mnt)?.sync()?)
    }

    /// 引擎没有按路径截断的接口，在同一临界区内打开、截断、关闭
    fn truncate(&self, mnt: &Mount, path: &str, len: u64) -> Result<()> {
        let volume = volume::<E>(mnt)?;
        let flags = translate::open_flags(vfs::OpenFlag::WRONLY as u32);

        let ret = {
            let mut inner = volume.lock();
            let lfs = &mut inner.lfs;
            lfs.file_open(path, flags).and_then(|mut file| {
                let ret = lfs.file_truncate(&mut file, len);
                // 报告的是截断的结果
                let _ = lfs.file_close(&mut file);
                ret
            })
        };
        Ok(ret?)
    }

    fn stat(&self, mnt: &Mount, path: &str) -> Result<Stat> {
        let ret = volume::<E>(mnt)?.lock().lfs.stat(normalize(path));
        let info = ret?;
        Ok(Stat {
            mode: PERMISSION | translate::entry_mode(info.ty),
            size: if info.is_reg() { info.size as u64 } else { 0 },
        })
    }

    /// 文件与节点个数引擎并不记录，报告为0
    fn statvfs(&self, mnt: &Mount) -> Result<StatVfs> {
        let volume = volume::<E>(mnt)?;
        let ret = volume.lock().lfs.fs_size();
        let in_use = ret? as u64;

        let geometry = volume.cfg().as_ref();
        let blocks = geometry.block_count as u64;
        Ok(StatVfs {
            block_size: geometry.block_size as u64,
            frag_size: geometry.prog_size as u64,
            blocks,
            blocks_free: blocks.saturating_sub(in_use),
            files: 0,
            files_free: 0,
            dev: mnt.dev.name.clone(),
            mount: mnt.name.clone(),
            fs_name: NAME,
        })
    }

    fn open(
        &self,
        mnt: &Mount,
        file: &mut OpenFile,
        path: &str,
        oflag: u32,
        _mode: u32,
    ) -> Result<()> {
        let flags = translate::open_flags(oflag);
        let ctx = volume::<E>(mnt)?
            .open_handle(|lfs| lfs.file_open(path, flags).map(Handle::File))?;
        file.ctx = Some(ctx);
        Ok(())
    }

    fn close(&self, mnt: &Mount, file: &mut OpenFile) -> Result<()> {
        volume::<E>(mnt)?.close_handle(file, |lfs, handle| lfs.file_close(handle.as_file_mut()?))
    }

    fn read(&self, mnt: &Mount, file: &OpenFile, buf: &mut [u8]) -> Result<usize> {
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_read(f, buf));
        Ok(ret?)
    }

    fn write(&self, mnt: &Mount, file: &OpenFile, buf: &[u8]) -> Result<usize> {
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_write(f, buf));
        Ok(ret?)
    }

    /// 只操作VFS的文件状态标志，不触及引擎
    fn fcntl(&self, _mnt: &Mount, file: &mut OpenFile, cmd: i32, arg: u32) -> Result<u32> {
        match cmd {
            fcntl::F_GETFL => Ok(file.flags.bits()),
            fcntl::F_SETFL => {
                let flags = BitFlags::<FileFlag>::from_bits_truncate(arg);
                if !file.writable() && flags.contains(FileFlag::WRITE) {
                    return Err(Error::PermissionDenied);
                }
                file.flags = flags;
                Ok(0)
            }
            _ => Err(Error::InvalidArgument),
        }
    }

    fn fstat(&self, mnt: &Mount, file: &OpenFile) -> Result<Stat> {
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_size(f));
        Ok(Stat {
            mode: PERMISSION | mode::S_IFREG,
            size: ret?,
        })
    }

    fn fsync(&self, mnt: &Mount, file: &OpenFile) -> Result<()> {
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_sync(f));
        Ok(ret?)
    }

    fn ftruncate(&self, mnt: &Mount, file: &OpenFile, len: u64) -> Result<()> {
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_truncate(f, len));
        Ok(ret?)
    }

    fn lseek(&self, mnt: &Mount, file: &OpenFile, offset: i64, whence: i32) -> Result<u64> {
        let whence = translate::seek_origin(whence).ok_or(Error::InvalidArgument)?;
        let ret = volume::<E>(mnt)?.with_file(file, |lfs, f| lfs.file_seek(f, offset, whence));
        Ok(ret?)
    }

    fn opendir(&self, mnt: &Mount, file: &mut OpenFile, path: &str) -> Result<()> {
        let path = normalize(path);
        let ctx = volume::<E>(mnt)?.open_handle(|lfs| lfs.dir_open(path).map(Handle::Dir))?;
        file.ctx = Some(ctx);
        Ok(())
    }

    fn closedir(&self, mnt: &Mount, file: &mut OpenFile) -> Result<()> {
        volume::<E>(mnt)?.close_handle(file, |lfs, handle| lfs.dir_close(handle.as_dir_mut()?))
    }

    fn readdir(&self, mnt: &Mount, file: &OpenFile) -> Result<Option<DirEntry>> {
        let ret = volume::<E>(mnt)?.with_dir(file, |lfs, dir| lfs.dir_read(dir));
        Ok(ret?.map(|info| DirEntry::new(translate::entry_type(info.ty), &info.name)))
    }

    fn rewinddir(&self, mnt: &Mount, file: &OpenFile) -> Result<()> {
        let ret = volume::<E>(mnt)?.with_dir(file, |lfs, dir| lfs.dir_rewind(dir));
        Ok(ret?)
    }

    fn seekdir(&self, mnt: &Mount, file: &OpenFile, loc: u64) -> Result<()> {
        let ret = volume::<E>(mnt)?.with_dir(file, |lfs, dir| lfs.dir_seek(dir, loc));
        Ok(ret?)
    }

    fn telldir(&self, mnt: &Mount, file: &OpenFile) -> Result<u64> {
        let ret = volume::<E>(mnt)?.with_dir(file, |lfs, dir| lfs.dir_tell(dir));
        Ok(ret?)
    }
}
