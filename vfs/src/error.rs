use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

/// 文件系统驱动向VFS报告的错误
///
/// 每个变体对应一个POSIX错误码，见[`Error::errno`]。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "I/O error")]
    Io,
    /// 硬件故障或数据损坏的统称
    #[display(fmt = "Bad address")]
    Fault,
    #[display(fmt = "No such file or directory")]
    NotFound,
    #[display(fmt = "File exists")]
    AlreadyExists,
    #[display(fmt = "Not a directory")]
    NotADirectory,
    #[display(fmt = "Is a directory")]
    IsADirectory,
    #[display(fmt = "Directory not empty")]
    DirectoryNotEmpty,
    #[display(fmt = "Bad file descriptor")]
    BadFileDescriptor,
    #[display(fmt = "File too large")]
    FileTooLarge,
    #[display(fmt = "Invalid argument")]
    InvalidArgument,
    #[display(fmt = "No space left on device")]
    NoSpace,
    #[display(fmt = "Out of memory")]
    OutOfMemory,
    #[display(fmt = "File name too long")]
    NameTooLong,
    #[display(fmt = "Permission denied")]
    PermissionDenied,
    /// 驱动未提供该操作
    #[display(fmt = "Function not implemented")]
    Unsupported,
}

impl Error {
    pub const fn errno(self) -> i32 {
        match self {
            Self::NotFound => 2,
            Self::Io => 5,
            Self::BadFileDescriptor => 9,
            Self::OutOfMemory => 12,
            Self::PermissionDenied => 13,
            Self::Fault => 14,
            Self::AlreadyExists => 17,
            Self::NotADirectory => 20,
            Self::IsADirectory => 21,
            Self::InvalidArgument => 22,
            Self::FileTooLarge => 27,
            Self::NoSpace => 28,
            Self::NameTooLong => 36,
            Self::Unsupported => 38,
            Self::DirectoryNotEmpty => 39,
        }
    }
}
