//! 仿真的littlefs存储引擎
//!
//! 在内存块设备上实现[`littlefs::Storage`]，镜像格式与真正的littlefs无关，
//! 但挂载、格式化、写时复制提交与错误码的行为与之一致。
//! 另外提供一次性的故障注入，用于触发绑定层的错误路径。

#![no_std]

extern crate alloc;

mod emu;
mod fault;
mod image;
mod path;
mod ram;
mod superblock;

pub use self::{
    emu::{EmuConfig, EmuDir, EmuFile, EmuLfs},
    fault::{FaultPoint, Faults},
    ram::RamDisk,
};
