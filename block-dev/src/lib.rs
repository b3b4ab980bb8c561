//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如NOR/NAND闪存、SD卡等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统通过块设备驱动读写块设备，通过 [`Geometry`] 得知设备的形状。

#![no_std]

use core::any::Any;

/// 块设备驱动特质
///
/// `buf` 的长度总是等于 [`Geometry::block_size`]。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
}

/// 块设备的几何参数，挂载后不再变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 最小读取单元
    pub read_size: u32,
    /// 最小编程（写入）单元
    pub prog_size: u32,
    /// 擦除块大小
    pub block_size: u32,
    /// 擦除块个数
    pub block_count: u32,
}

impl Geometry {
    pub const fn new(read_size: u32, prog_size: u32, block_size: u32, block_count: u32) -> Self {
        Self {
            read_size,
            prog_size,
            block_size,
            block_count,
        }
    }

    /// 设备总容量，单位为字节
    #[inline]
    pub const fn capacity(&self) -> u64 {
        self.block_size as u64 * self.block_count as u64
    }
}
