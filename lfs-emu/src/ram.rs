use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use block_dev::{BlockDevice, Geometry};
use spin::Mutex;

/// 内存中的块设备，初始全为0
pub struct RamDisk {
    block_size: usize,
    data: Mutex<Vec<u8>>,
    /// 写入的块数
    writes: AtomicUsize,
}

impl RamDisk {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            block_size: geometry.block_size as usize,
            data: Mutex::new(vec![0; geometry.capacity() as usize]),
            writes: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// 用`byte`填满整个设备，模拟出厂或损坏的闪存
    pub fn fill(&self, byte: u8) {
        self.data.lock().fill(byte);
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let start = block_id * self.block_size;
        buf.copy_from_slice(&self.data.lock()[start..start + self.block_size]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let start = block_id * self.block_size;
        self.data.lock()[start..start + self.block_size].copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}
