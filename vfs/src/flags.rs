use enumflags2::{bitflags, BitFlags};

/// `open`的标志位
///
/// 访问模式占最低两位：两位都为0表示只读，因此只读没有对应的变体。
#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 只写
    WRONLY = 0o0000_0001,
    /// 读写兼备
    RDWR   = 0o0000_0002,
    /// 文件不存在时创建
    CREAT  = 0o0000_0100,
    /// 与`CREAT`连用，文件已存在则失败
    EXCL   = 0o0000_0200,
    /// 先清空文件，再交给用户
    TRUNC  = 0o0000_1000,
    /// 每次写入前定位到文件末尾
    APPEND = 0o0000_2000,
}

impl OpenFlag {
    // enumflags2拒绝值为0的标志
    /// 只读
    pub const RDONLY: u32 = 0;
    /// 访问模式的掩码
    pub const ACCMODE: u32 = 0o3;

    /// 未知的位被丢弃
    #[inline]
    pub fn from_raw(raw: u32) -> BitFlags<OpenFlag> {
        BitFlags::from_bits_truncate(raw)
    }
}

/// 已打开文件的状态标志，由`fcntl`读写
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFlag {
    READ = 0b0001,
    WRITE = 0b0010,
    APPEND = 0b0100,
    NONBLOCK = 0b1000,
}

impl FileFlag {
    /// 由`open`的标志推出文件状态标志
    pub fn from_open(oflag: u32) -> BitFlags<FileFlag> {
        let mut flags = match oflag & OpenFlag::ACCMODE {
            OpenFlag::RDONLY => BitFlags::from(FileFlag::READ),
            0o1 => BitFlags::from(FileFlag::WRITE),
            0o2 => FileFlag::READ | FileFlag::WRITE,
            _ => BitFlags::empty(),
        };
        if oflag & OpenFlag::APPEND as u32 != 0 {
            flags |= FileFlag::APPEND;
        }
        flags
    }
}

/// `lseek`的起点
pub mod whence {
    pub const SEEK_SET: i32 = 0;
    pub const SEEK_CUR: i32 = 1;
    pub const SEEK_END: i32 = 2;
}

/// `fcntl`的命令
pub mod fcntl {
    pub const F_GETFL: i32 = 3;
    pub const F_SETFL: i32 = 4;
}
