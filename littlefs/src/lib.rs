//! littlefs与VFS之间的绑定层
//!
//! 自下而上：
//!
//! 1. 存储引擎接口：[`Storage`]，引擎本身不在本crate内
//! 2. 词汇转换：错误码、打开标志、定位起点、条目类型
//! 3. 挂载上下文：一个引擎实例加一把锁
//! 4. 句柄：每个打开的文件或目录独占一个引擎对象
//! 5. 操作表：[`LittleFs`]，以驱动的身份注册到VFS

#![no_std]

extern crate alloc;

pub mod config;
mod driver;
mod engine;
mod handle;
pub mod translate;
mod volume;

use alloc::sync::Arc;

pub use self::{
    driver::LittleFs,
    engine::{
        Info, LfsError, LfsResult, Node, NodeId, OpenFlag, Storage, Whence, TYPE_DIR, TYPE_MASK,
        TYPE_REG,
    },
};

/// 驱动名，注册与`statvfs`共用
pub const NAME: &str = "littlefs";

/// 以[`NAME`]注册驱动，重复注册返回[`vfs::Error::AlreadyExists`]
pub fn register<E: Storage>() -> vfs::Result<()> {
    vfs::registry::register(Arc::new(LittleFs::<E>::new()))
}
