//! 已注册的文件系统驱动

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{Error, FileSystem, Result};

static DRIVERS: Mutex<Vec<Arc<dyn FileSystem>>> = Mutex::new(Vec::new());

/// 同名驱动只能注册一次
pub fn register(fs: Arc<dyn FileSystem>) -> Result<()> {
    let mut drivers = DRIVERS.lock();
    if drivers.iter().any(|drv| drv.name() == fs.name()) {
        return Err(Error::AlreadyExists);
    }
    drivers.push(fs);
    Ok(())
}

pub fn lookup(name: &str) -> Option<Arc<dyn FileSystem>> {
    DRIVERS
        .lock()
        .iter()
        .find(|drv| drv.name() == name)
        .cloned()
}
