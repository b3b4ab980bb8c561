use alloc::string::String;

/// `st_mode`中的类型与权限位
pub mod mode {
    /// 文件类型的掩码
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFREG: u32 = 0o100000;

    pub const S_IRWXU: u32 = 0o700;
    pub const S_IRWXG: u32 = 0o070;
    pub const S_IRWXO: u32 = 0o007;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    /// 类型与权限位，见[`mode`]
    pub mode: u32,
    /// File size
    pub size: u64,
}

impl Stat {
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.mode & mode::S_IFMT == mode::S_IFDIR
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.mode & mode::S_IFMT == mode::S_IFREG
    }
}

/// 文件系统统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatVfs {
    /// 块大小
    pub block_size: u64,
    /// 片段大小
    pub frag_size: u64,
    /// 总块数
    pub blocks: u64,
    /// 空闲块数
    pub blocks_free: u64,
    /// 文件节点总数
    pub files: u64,
    /// 空闲文件节点数
    pub files_free: u64,
    /// 设备名
    pub dev: String,
    /// 挂载点名
    pub mount: String,
    /// 文件系统驱动名
    pub fs_name: &'static str,
}
