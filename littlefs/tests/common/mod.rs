#![allow(dead_code)]

use std::sync::Arc;

use block_dev::Geometry;
use lfs_emu::{EmuConfig, EmuLfs, FaultPoint, RamDisk};
use littlefs::LittleFs;
use vfs::{Device, FileSystem, Mount, OpenFile, OpenFlag};

pub type Fs = LittleFs<EmuLfs>;

pub const GEOMETRY: Geometry = Geometry::new(16, 16, 256, 64);

pub const O_RDONLY: u32 = OpenFlag::RDONLY;
pub const O_WRONLY: u32 = OpenFlag::WRONLY as u32;
pub const O_RDWR: u32 = OpenFlag::RDWR as u32;
pub const O_CREAT: u32 = OpenFlag::CREAT as u32;
pub const O_EXCL: u32 = OpenFlag::EXCL as u32;
pub const O_TRUNC: u32 = OpenFlag::TRUNC as u32;
pub const O_APPEND: u32 = OpenFlag::APPEND as u32;

pub struct Fixture {
    pub fs: Fs,
    pub mnt: Mount,
    pub dev: Arc<Device>,
    pub cfg: Arc<EmuConfig>,
    pub disk: Arc<RamDisk>,
}

impl Fixture {
    /// 空白设备，尚未挂载
    pub fn blank() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let disk = Arc::new(RamDisk::new(&GEOMETRY));
        let cfg = Arc::new(EmuConfig::new(GEOMETRY, disk.clone()));
        let dev = Arc::new(Device::new("flash0", cfg.clone()));
        Self {
            fs: Fs::new(),
            mnt: Mount::new("/data", dev.clone()),
            dev,
            cfg,
            disk,
        }
    }

    pub fn mounted() -> Self {
        let mut fx = Self::blank();
        fx.mount().unwrap();
        fx
    }

    pub fn mount(&mut self) -> vfs::Result<()> {
        self.fs.mount(&mut self.mnt, &self.dev, None)
    }

    pub fn unmount(&mut self) -> vfs::Result<()> {
        self.fs.unmount(&mut self.mnt, false)
    }

    pub fn arm(&self, point: FaultPoint) {
        self.cfg.faults.arm(point);
    }

    pub fn open(&self, path: &str, oflag: u32) -> vfs::Result<OpenFile> {
        let mut file = OpenFile::new(oflag);
        self.fs.open(&self.mnt, &mut file, path, oflag, 0o644)?;
        Ok(file)
    }

    pub fn opendir(&self, path: &str) -> vfs::Result<OpenFile> {
        let mut dir = OpenFile::new(O_RDONLY);
        self.fs.opendir(&self.mnt, &mut dir, path)?;
        Ok(dir)
    }

    /// 创建文件，写入`data`后关闭
    pub fn put(&self, path: &str, data: &[u8]) {
        let mut file = self.open(path, O_WRONLY | O_CREAT | O_TRUNC).unwrap();
        assert_eq!(self.fs.write(&self.mnt, &file, data), Ok(data.len()));
        self.fs.close(&self.mnt, &mut file).unwrap();
    }

    pub fn get(&self, path: &str) -> Vec<u8> {
        let mut file = self.open(path, O_RDONLY).unwrap();
        let mut data = Vec::new();
        let mut buf = [0; 100];
        loop {
            match self.fs.read(&self.mnt, &file, &mut buf).unwrap() {
                0 => break,
                n => data.extend_from_slice(&buf[..n]),
            }
        }
        self.fs.close(&self.mnt, &mut file).unwrap();
        data
    }

    pub fn size(&self, path: &str) -> u64 {
        self.fs.stat(&self.mnt, path).unwrap().size
    }
}
