//! 打开的文件与目录
//!
//! 每个句柄独占一个引擎对象。VFS的文件对象里只保存[`FileCtx`]令牌：
//! 低32位是槽位索引，高32位是槽位的代数，槽位每次释放都换代，
//! 因此过期的令牌不会误用新句柄。

use alloc::collections::TryReserveError;
use alloc::vec::Vec;

use vfs::FileCtx;

use crate::engine::{LfsError, LfsResult, Storage};

pub enum Handle<E: Storage> {
    File(E::File),
    Dir(E::Dir),
}

impl<E: Storage> Handle<E> {
    pub fn as_file_mut(&mut self) -> LfsResult<&mut E::File> {
        match self {
            Self::File(file) => Ok(file),
            Self::Dir(_) => Err(LfsError::BADF),
        }
    }

    pub fn as_dir_mut(&mut self) -> LfsResult<&mut E::Dir> {
        match self {
            Self::Dir(dir) => Ok(dir),
            Self::File(_) => Err(LfsError::BADF),
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// 带代数的槽位表
#[derive(Debug)]
pub struct SlotVec<T>(Vec<Slot<T>>);

impl<T> Default for SlotVec<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> SlotVec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 找到或预留一个空槽位并返回其索引
    ///
    /// 内存不足时失败，已有的槽位不受影响。
    pub fn reserve(&mut self) -> Result<usize, TryReserveError> {
        if let Some(index) = self.0.iter().position(|slot| slot.value.is_none()) {
            return Ok(index);
        }

        self.0.try_reserve(1)?;
        self.0.push(Slot {
            generation: 0,
            value: None,
        });
        Ok(self.0.len() - 1)
    }

    /// 把元素放入[`SlotVec::reserve`]得到的槽位
    pub fn fill(&mut self, index: usize, value: T) -> FileCtx {
        let slot = &mut self.0[index];
        debug_assert!(slot.value.is_none());
        slot.value = Some(value);
        encode(index, slot.generation)
    }

    pub fn get_mut(&mut self, ctx: FileCtx) -> Option<&mut T> {
        let (index, generation) = decode(ctx);
        self.0
            .get_mut(index)
            .filter(|slot| slot.generation == generation)?
            .value
            .as_mut()
    }

    pub fn remove(&mut self, ctx: FileCtx) -> Option<T> {
        let (index, generation) = decode(ctx);
        let slot = self
            .0
            .get_mut(index)
            .filter(|slot| slot.generation == generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(value)
    }

    /// 被占用的槽位个数
    pub fn len(&self) -> usize {
        self.0.iter().filter(|slot| slot.value.is_some()).count()
    }
}

fn encode(index: usize, generation: u32) -> FileCtx {
    FileCtx::from_raw(((generation as u64) << 32) | index as u64)
}

fn decode(ctx: FileCtx) -> (usize, u32) {
    let raw = ctx.into_raw();
    ((raw & u32::MAX as u64) as usize, (raw >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_vacant_slot() {
        let mut slots = SlotVec::new();
        let a = slots.reserve().map(|i| slots.fill(i, 'a')).unwrap();
        let b = slots.reserve().map(|i| slots.fill(i, 'b')).unwrap();
        assert_ne!(a, b);
        assert_eq!(slots.len(), 2);

        assert_eq!(slots.remove(a), Some('a'));
        let index = slots.reserve().unwrap();
        assert_eq!(decode(a).0, index);
        let c = slots.fill(index, 'c');

        // 旧令牌已过期
        assert_ne!(a, c);
        assert_eq!(slots.get_mut(a), None);
        assert_eq!(slots.remove(a), None);
        assert_eq!(slots.get_mut(c), Some(&mut 'c'));
        assert_eq!(slots.get_mut(b), Some(&mut 'b'));
    }

    #[test]
    fn reserved_but_unfilled_slot_is_vacant() {
        let mut slots: SlotVec<u8> = SlotVec::new();
        let index = slots.reserve().unwrap();
        assert_eq!(slots.len(), 0);
        assert_eq!(slots.reserve().unwrap(), index);
    }

    #[test]
    fn unknown_ctx() {
        let mut slots: SlotVec<u8> = SlotVec::new();
        assert_eq!(slots.get_mut(FileCtx::from_raw(7)), None);
        assert_eq!(slots.remove(FileCtx::from_raw(u64::MAX)), None);
    }
}
