//! 一次性的故障注入
//!
//! 每个装填的故障点只触发一次，触发时引擎返回`IO`错误。

use alloc::string::String;
use alloc::vec::Vec;

use derive_more::Display;
use spin::Mutex;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum FaultPoint {
    #[display(fmt = "mount")]
    Mount,
    #[display(fmt = "unmount")]
    Unmount,
    #[display(fmt = "format")]
    Format,
    /// 同步指定路径的文件，关闭时的隐式同步也算
    #[display(fmt = "sync {}", _0)]
    Sync(String),
}

#[derive(Debug, Default)]
pub struct Faults(Mutex<Vec<FaultPoint>>);

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, point: FaultPoint) {
        self.0.lock().push(point);
    }

    /// 故障点已装填则卸下并返回`true`
    pub fn fire(&self, point: &FaultPoint) -> bool {
        let mut armed = self.0.lock();
        match armed.iter().position(|p| p == point) {
            Some(index) => {
                armed.remove(index);
                log::debug!("lfs-emu: fault injected at {point}");
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}
