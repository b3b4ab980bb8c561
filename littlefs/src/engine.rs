//! # 存储引擎接口
//!
//! 绑定层只通过[`Storage`]访问存储引擎，引擎的块分配、磨损均衡、
//! 写时复制提交与掉电恢复都不在本层。
//!
//! 引擎本身不是线程安全的，调用方必须保证同一实例上的调用互斥。

use alloc::string::String;
use alloc::vec::Vec;

use block_dev::Geometry;
use derive_more::{Display, From, Into};
use enumflags2::{bitflags, make_bitflags, BitFlags};

pub type LfsResult<T> = Result<T, LfsError>;

/// 引擎返回的负数状态码
///
/// 引擎可能返回下列常量之外的状态码，因此不用枚举表示。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "lfs error {}", _0)]
#[repr(transparent)]
pub struct LfsError(i32);

impl LfsError {
    /// Error during device operation
    pub const IO: Self = Self(-5);
    /// Corrupted
    pub const CORRUPT: Self = Self(-84);
    /// No directory entry
    pub const NOENT: Self = Self(-2);
    /// Entry already exists
    pub const EXIST: Self = Self(-17);
    /// Entry is not a dir
    pub const NOTDIR: Self = Self(-20);
    /// Entry is a dir
    pub const ISDIR: Self = Self(-21);
    /// Dir is not empty
    pub const NOTEMPTY: Self = Self(-39);
    /// Bad file number
    pub const BADF: Self = Self(-9);
    /// File too large
    pub const FBIG: Self = Self(-27);
    /// Invalid parameter
    pub const INVAL: Self = Self(-22);
    /// No space left on device
    pub const NOSPC: Self = Self(-28);
    /// No more memory available
    pub const NOMEM: Self = Self(-12);
    /// No data/attr available
    pub const NOATTR: Self = Self(-61);
    /// File name too long
    pub const NAMETOOLONG: Self = Self(-36);

    #[inline]
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }
}

/// 引擎的打开标志，读写兼备即`RDONLY | WRONLY`
#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    RDONLY = 0x0001,
    WRONLY = 0x0002,
    /// 不存在时创建
    CREAT  = 0x0100,
    /// 与`CREAT`连用，已存在时失败
    EXCL   = 0x0200,
    /// 打开时截断为0
    TRUNC  = 0x0400,
    /// 每次写入都追加到末尾
    APPEND = 0x0800,
}

impl OpenFlag {
    pub const RDWR: BitFlags<OpenFlag> = make_bitflags!(OpenFlag::{RDONLY | WRONLY});
}

/// 引擎的定位起点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// 相对文件开头
    Set,
    /// 相对当前位置
    Cur,
    /// 相对文件末尾
    End,
}

/// 目录项类型，只有最低两位有意义
pub const TYPE_REG: u8 = 0x01;
pub const TYPE_DIR: u8 = 0x02;
pub const TYPE_MASK: u8 = 0x03;

/// `stat`与`dir_read`给出的条目信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub ty: u8,
    /// 仅对普通文件有效
    pub size: u32,
    pub name: String,
}

impl Info {
    #[inline]
    pub fn is_reg(&self) -> bool {
        self.ty & TYPE_MASK == TYPE_REG
    }
}

/// 引擎内部登记的打开对象的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct NodeId(pub u64);

/// 打开对象链表上的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub ty: u8,
}

/// 存储引擎的操作集合
///
/// 成功时返回非负值，失败时返回[`LfsError`]。文件与目录对象由调用方持有，
/// 但引擎仍把它们登记在自己的打开对象链表上，见[`Storage::mlist`]。
pub trait Storage: Default + Send + 'static {
    /// 设备的配置块，挂载期间不变
    type Config: AsRef<Geometry> + Send + Sync + 'static;
    type File: Send + 'static;
    type Dir: Send + 'static;

    fn mount(&mut self, cfg: &Self::Config) -> LfsResult<()>;
    fn unmount(&mut self) -> LfsResult<()>;
    /// 格式化后引擎处于未挂载状态
    fn format(&mut self, cfg: &Self::Config) -> LfsResult<()>;

    fn file_open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> LfsResult<Self::File>;
    /// 失败时对象仍然有效，可以重试
    fn file_close(&mut self, file: &mut Self::File) -> LfsResult<()>;
    fn file_read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> LfsResult<usize>;
    fn file_write(&mut self, file: &mut Self::File, buf: &[u8]) -> LfsResult<usize>;
    /// 返回新的位置
    fn file_seek(&mut self, file: &mut Self::File, off: i64, whence: Whence) -> LfsResult<u64>;
    fn file_truncate(&mut self, file: &mut Self::File, size: u64) -> LfsResult<()>;
    fn file_sync(&mut self, file: &mut Self::File) -> LfsResult<()>;
    /// 包含尚未提交的写入
    fn file_size(&mut self, file: &mut Self::File) -> LfsResult<u64>;

    fn dir_open(&mut self, path: &str) -> LfsResult<Self::Dir>;
    fn dir_close(&mut self, dir: &mut Self::Dir) -> LfsResult<()>;
    /// 读到末尾返回`Ok(None)`
    fn dir_read(&mut self, dir: &mut Self::Dir) -> LfsResult<Option<Info>>;
    fn dir_rewind(&mut self, dir: &mut Self::Dir) -> LfsResult<()>;
    /// `off`只能来自[`Storage::dir_tell`]
    fn dir_seek(&mut self, dir: &mut Self::Dir, off: u64) -> LfsResult<()>;
    fn dir_tell(&mut self, dir: &mut Self::Dir) -> LfsResult<u64>;

    fn stat(&mut self, path: &str) -> LfsResult<Info>;
    /// 已使用的块数
    fn fs_size(&mut self) -> LfsResult<u32>;
    /// 文件与空目录都由此删除
    fn remove(&mut self, path: &str) -> LfsResult<()>;
    fn mkdir(&mut self, path: &str) -> LfsResult<()>;
    fn rename(&mut self, old: &str, new: &str) -> LfsResult<()>;

    /// 当前登记的全部打开对象，按链表顺序
    fn mlist(&self) -> Vec<Node>;
    /// 同步链表上的一个文件对象
    fn node_sync(&mut self, node: NodeId) -> LfsResult<()>;
}
