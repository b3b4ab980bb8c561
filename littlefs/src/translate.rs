//! 引擎与VFS之间的词汇转换
//!
//! 全部是纯函数，不访问引擎。

use enumflags2::BitFlags;
use vfs::{mode, whence, DirEntryType, Error};

use crate::engine::{LfsError, OpenFlag, Whence, TYPE_DIR, TYPE_MASK, TYPE_REG};

impl From<LfsError> for Error {
    fn from(err: LfsError) -> Self {
        match err {
            LfsError::IO => Error::Io,
            LfsError::CORRUPT => Error::Fault,
            LfsError::NOENT => Error::NotFound,
            LfsError::EXIST => Error::AlreadyExists,
            LfsError::NOTDIR => Error::NotADirectory,
            LfsError::ISDIR => Error::IsADirectory,
            LfsError::NOTEMPTY => Error::DirectoryNotEmpty,
            LfsError::BADF => Error::BadFileDescriptor,
            LfsError::FBIG => Error::FileTooLarge,
            LfsError::INVAL => Error::InvalidArgument,
            LfsError::NOSPC => Error::NoSpace,
            LfsError::NOMEM => Error::OutOfMemory,
            LfsError::NOATTR => Error::InvalidArgument,
            LfsError::NAMETOOLONG => Error::NameTooLong,
            _ => Error::Fault,
        }
    }
}

/// 引擎状态码转为errno，`0`表示成功
pub fn status(code: i32) -> i32 {
    match code {
        0 => 0,
        code => Error::from(LfsError::from_raw(code)).errno(),
    }
}

/// VFS的`open`标志转为引擎的打开标志，未知的位被丢弃
pub fn open_flags(oflag: u32) -> BitFlags<OpenFlag> {
    let mut flags = match oflag & vfs::OpenFlag::ACCMODE {
        vfs::OpenFlag::RDONLY => BitFlags::from(OpenFlag::RDONLY),
        acc if acc == vfs::OpenFlag::WRONLY as u32 => BitFlags::from(OpenFlag::WRONLY),
        acc if acc == vfs::OpenFlag::RDWR as u32 => OpenFlag::RDWR,
        _ => BitFlags::empty(),
    };

    let oflag = vfs::OpenFlag::from_raw(oflag);
    for (os, lfs) in [
        (vfs::OpenFlag::APPEND, OpenFlag::APPEND),
        (vfs::OpenFlag::TRUNC, OpenFlag::TRUNC),
        (vfs::OpenFlag::EXCL, OpenFlag::EXCL),
        (vfs::OpenFlag::CREAT, OpenFlag::CREAT),
    ] {
        if oflag.contains(os) {
            flags |= lfs;
        }
    }

    flags
}

/// 无法识别的起点返回`None`，调用方须报告`EINVAL`
pub fn seek_origin(origin: i32) -> Option<Whence> {
    match origin {
        whence::SEEK_SET => Some(Whence::Set),
        whence::SEEK_CUR => Some(Whence::Cur),
        whence::SEEK_END => Some(Whence::End),
        _ => None,
    }
}

/// 目录项类型转为`st_mode`的类型位，未知类型为`0`
pub fn entry_mode(ty: u8) -> u32 {
    match ty & TYPE_MASK {
        TYPE_REG => mode::S_IFREG,
        TYPE_DIR => mode::S_IFDIR,
        _ => 0,
    }
}

pub fn entry_type(ty: u8) -> DirEntryType {
    match ty & TYPE_MASK {
        TYPE_REG => DirEntryType::Regular,
        TYPE_DIR => DirEntryType::Directory,
        _ => DirEntryType::Unknown,
    }
}
