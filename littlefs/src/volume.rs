//! # 挂载上下文
//!
//! 每个挂载的卷拥有一个引擎实例与一把锁，
//! 所有触及引擎的操作都在这把锁内进行，锁内不做错误转换。

use alloc::sync::Arc;

use spin::{Mutex, MutexGuard};
use vfs::{FileCtx, OpenFile};

use crate::engine::{LfsError, LfsResult, Storage, TYPE_MASK, TYPE_REG};
use crate::handle::{Handle, SlotVec};

pub struct Volume<E: Storage> {
    cfg: Arc<E::Config>,
    inner: Mutex<Inner<E>>,
}

pub struct Inner<E: Storage> {
    pub lfs: E,
    pub handles: SlotVec<Handle<E>>,
}

impl<E: Storage> Volume<E> {
    /// 挂载失败时格式化设备并再挂载一次
    ///
    /// 无法识别的镜像同样会被格式化，原有数据随之丢失。
    pub fn mount(cfg: Arc<E::Config>) -> LfsResult<Self> {
        let mut volume = Self {
            cfg,
            inner: Mutex::new(Inner {
                lfs: E::default(),
                handles: SlotVec::new(),
            }),
        };

        let lfs = &mut volume.inner.get_mut().lfs;
        if let Err(err) = lfs.mount(&volume.cfg) {
            log::warn!("littlefs: mount failed ({err}), formatting");
            lfs.format(&volume.cfg)?;
            lfs.mount(&volume.cfg)?;
        }

        Ok(volume)
    }

    #[inline]
    pub fn cfg(&self) -> &E::Config {
        &self.cfg
    }

    /// 阻塞直至拿到锁，不会失败
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Inner<E>> {
        self.inner.lock()
    }

    /// 卸载、格式化、再挂载，任一步失败即中止
    pub fn mkfs(&self) -> LfsResult<()> {
        let mut inner = self.lock();
        inner.lfs.unmount()?;
        inner.lfs.format(&self.cfg)?;
        inner.lfs.mount(&self.cfg)
    }

    /// 同步所有打开的普通文件，遇到第一个失败即停止
    ///
    /// 失败点之后的文件不会被同步。
    pub fn sync(&self) -> LfsResult<()> {
        let mut inner = self.lock();
        let nodes = inner.lfs.mlist();
        nodes
            .into_iter()
            .filter(|node| node.ty & TYPE_MASK == TYPE_REG)
            .try_for_each(|node| inner.lfs.node_sync(node.id))
    }

    /// 分配句柄并打开引擎对象
    ///
    /// 句柄槽位先于引擎调用分配，内存不足时不会触及引擎；
    /// 引擎打开失败时槽位保持空闲。
    pub fn open_handle(
        &self,
        open: impl FnOnce(&mut E) -> LfsResult<Handle<E>>,
    ) -> Result<FileCtx, vfs::Error> {
        let ret = {
            let mut inner = self.lock();
            let Inner { lfs, handles } = &mut *inner;
            let Ok(slot) = handles.reserve() else {
                return Err(vfs::Error::OutOfMemory);
            };
            open(lfs).map(|handle| handles.fill(slot, handle))
        };
        Ok(ret?)
    }

    /// 关闭成功后才释放句柄并解绑，失败时句柄保持绑定以便重试
    pub fn close_handle(
        &self,
        file: &mut OpenFile,
        close: impl FnOnce(&mut E, &mut Handle<E>) -> LfsResult<()>,
    ) -> Result<(), vfs::Error> {
        let ctx = file.ctx.ok_or(vfs::Error::BadFileDescriptor)?;
        let ret = {
            let mut inner = self.lock();
            let Inner { lfs, handles } = &mut *inner;
            let ret = match handles.get_mut(ctx) {
                Some(handle) => close(lfs, handle),
                None => Err(LfsError::BADF),
            };
            if ret.is_ok() {
                handles.remove(ctx);
            }
            ret
        };
        ret?;
        file.ctx = None;
        Ok(())
    }

    pub fn with_file<T>(
        &self,
        file: &OpenFile,
        f: impl FnOnce(&mut E, &mut E::File) -> LfsResult<T>,
    ) -> LfsResult<T> {
        self.with_handle(file, |lfs, handle| f(lfs, handle.as_file_mut()?))
    }

    pub fn with_dir<T>(
        &self,
        file: &OpenFile,
        f: impl FnOnce(&mut E, &mut E::Dir) -> LfsResult<T>,
    ) -> LfsResult<T> {
        self.with_handle(file, |lfs, handle| f(lfs, handle.as_dir_mut()?))
    }

    fn with_handle<T>(
        &self,
        file: &OpenFile,
        f: impl FnOnce(&mut E, &mut Handle<E>) -> LfsResult<T>,
    ) -> LfsResult<T> {
        let ctx = file.ctx.ok_or(LfsError::BADF)?;
        let mut inner = self.lock();
        let Inner { lfs, handles } = &mut *inner;
        let handle = handles.get_mut(ctx).ok_or(LfsError::BADF)?;
        f(lfs, handle)
    }
}
