//! VFS交给驱动的对象：设备、挂载点与已打开的文件
//!
//! 三者都带有一个不透明的上下文槽位，驱动把自己的状态放进去，
//! VFS只负责保管，不关心其内容。

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;

use enumflags2::BitFlags;

use crate::FileFlag;

/// 可挂载的设备
pub struct Device {
    pub name: String,
    /// 设备驱动提供的配置块，由文件系统驱动解释
    ctx: Option<Arc<dyn Any + Send + Sync>>,
}

impl Device {
    pub fn new(name: &str, ctx: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            name: String::from(name),
            ctx: Some(ctx),
        }
    }

    /// 没有配置块的设备
    pub fn bare(name: &str) -> Self {
        Self {
            name: String::from(name),
            ctx: None,
        }
    }

    /// 配置块不存在或类型不符时返回`None`
    pub fn ctx<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.ctx.clone()?.downcast().ok()
    }
}

/// 挂载点
pub struct Mount {
    pub name: String,
    pub dev: Arc<Device>,
    /// 驱动的挂载上下文，挂载成功后才存在
    pub ctx: Option<Box<dyn Any + Send + Sync>>,
}

impl Mount {
    pub fn new(name: &str, dev: Arc<Device>) -> Self {
        Self {
            name: String::from(name),
            dev,
            ctx: None,
        }
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn ctx<T: Any>(&self) -> Option<&T> {
        self.ctx.as_deref()?.downcast_ref()
    }
}

/// 驱动保存在[`OpenFile`]中的不透明令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileCtx(u64);

impl FileCtx {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// 进程打开的文件或目录
#[derive(Debug, Default)]
pub struct OpenFile {
    /// 文件状态标志
    pub flags: BitFlags<FileFlag>,
    /// 打开成功后由驱动绑定，关闭成功后解绑
    pub ctx: Option<FileCtx>,
}

impl OpenFile {
    pub fn new(oflag: u32) -> Self {
        Self {
            flags: FileFlag::from_open(oflag),
            ctx: None,
        }
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.flags.contains(FileFlag::READ)
    }

    #[inline]
    pub fn writable(&self) -> bool {
        self.flags.contains(FileFlag::WRITE)
    }
}
