//! 编译期配置
//!
//! 这三个上限会写入超级块，挂载同一镜像的其它驱动也必须遵守。

/// 文件名的最大长度，不超过1022
pub const NAME_MAX: usize = vfs::DirEntry::NAME_CAP;

/// 单个文件的最大长度
///
/// 超过`i32::MAX`后`seek`、`size`等接口的返回值不再可靠。
pub const FILE_MAX: u64 = 64 * 1024 * 1024;

/// 自定义属性的最大长度，本驱动不使用自定义属性
pub const ATTR_MAX: usize = 0;
