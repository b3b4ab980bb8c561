//! 超级块：
//! - 校验镜像的合法性；
//! - 记录设备形状与限制；
//! - 定位提交的镜像
//!
//! 块0与块1各存一份，修订号较大的合法副本有效。

use block_dev::Geometry;

pub const MAGIC: [u8; 8] = *b"littlefs";
/// 高16位为主版本号
pub const VERSION: u32 = 0x0002_0000;
/// 序列化后的字节数
pub const SIZE: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub version: u32,
    pub block_size: u32,
    pub block_count: u32,
    pub name_max: u32,
    pub file_max: u32,
    pub attr_max: u32,
    pub revision: u32,
    /// 镜像的字节数，镜像从块2开始连续存放
    pub image_len: u32,
}

impl SuperBlock {
    pub fn new(geometry: &Geometry, revision: u32, image_len: u32) -> Self {
        Self {
            version: VERSION,
            block_size: geometry.block_size,
            block_count: geometry.block_count,
            name_max: littlefs::config::NAME_MAX as u32,
            file_max: littlefs::config::FILE_MAX as u32,
            attr_max: littlefs::config::ATTR_MAX as u32,
            revision,
            image_len,
        }
    }

    #[inline]
    pub fn major(&self) -> u16 {
        (self.version >> 16) as u16
    }

    pub fn fits(&self, geometry: &Geometry) -> bool {
        self.block_size == geometry.block_size && self.block_count == geometry.block_count
    }

    /// `buf`至少有[`SIZE`]字节
    pub fn encode(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&MAGIC);
        let fields = [
            self.version,
            self.block_size,
            self.block_count,
            self.name_max,
            self.file_max,
            self.attr_max,
            self.revision,
            self.image_len,
        ];
        for (chunk, field) in buf[8..SIZE - 4].chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        let sum = checksum(&buf[..SIZE - 4]);
        buf[SIZE - 4..SIZE].copy_from_slice(&sum.to_le_bytes());
    }

    /// 魔数或校验和不对时返回`None`
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let buf = buf.get(..SIZE)?;
        if buf[..8] != MAGIC || checksum(&buf[..SIZE - 4]) != read_u32(buf, SIZE - 4) {
            return None;
        }

        let field = |i: usize| read_u32(buf, 8 + 4 * i);
        Some(Self {
            version: field(0),
            block_size: field(1),
            block_count: field(2),
            name_max: field(3),
            file_max: field(4),
            attr_max: field(5),
            revision: field(6),
            image_len: field(7),
        })
    }
}

#[inline]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

/// FNV-1a
fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5, |hash, &b| {
        (hash ^ b as u32).wrapping_mul(0x0100_0193)
    })
}
