//! 提交的目录树及其序列化
//!
//! 每个条目依次是：类型（1字节）、路径长度（2字节）、路径、
//! 普通文件再跟内容长度（4字节）与内容。整数均为小端序。

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use littlefs::{TYPE_DIR, TYPE_REG};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Dir,
    File(Vec<u8>),
}

impl Entry {
    #[inline]
    pub fn ty(&self) -> u8 {
        match self {
            Self::Dir => TYPE_DIR,
            Self::File(_) => TYPE_REG,
        }
    }
}

/// 规范路径 → 条目，根目录`/`总是存在
pub type Tree = BTreeMap<String, Entry>;

pub fn empty() -> Tree {
    let mut tree = Tree::new();
    tree.insert(String::from("/"), Entry::Dir);
    tree
}

pub fn encode(tree: &Tree) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (path, entry) in tree {
        bytes.push(entry.ty());
        bytes.extend_from_slice(&(path.len() as u16).to_le_bytes());
        bytes.extend_from_slice(path.as_bytes());
        if let Entry::File(data) = entry {
            bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
            bytes.extend_from_slice(data);
        }
    }
    bytes
}

/// 截断或无法识别的镜像返回`None`
pub fn decode(mut bytes: &[u8]) -> Option<Tree> {
    let mut tree = Tree::new();
    while let Some((&ty, rest)) = bytes.split_first() {
        bytes = rest;
        let len = u16::from_le_bytes(take(&mut bytes)?) as usize;
        let path = String::from(core::str::from_utf8(take_slice(&mut bytes, len)?).ok()?);
        let entry = match ty {
            TYPE_DIR => Entry::Dir,
            TYPE_REG => {
                let len = u32::from_le_bytes(take(&mut bytes)?) as usize;
                Entry::File(take_slice(&mut bytes, len)?.to_vec())
            }
            _ => return None,
        };
        tree.insert(path, entry);
    }

    matches!(tree.get("/"), Some(Entry::Dir)).then_some(tree)
}

fn take<const N: usize>(bytes: &mut &[u8]) -> Option<[u8; N]> {
    let mut array = [0; N];
    array.copy_from_slice(take_slice(bytes, N)?);
    Some(array)
}

fn take_slice<'a>(bytes: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if bytes.len() < n {
        return None;
    }
    let (head, rest) = bytes.split_at(n);
    *bytes = rest;
    Some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_survives_encoding() {
        let mut tree = empty();
        tree.insert("/etc".into(), Entry::Dir);
        tree.insert("/etc/hosts".into(), Entry::File(b"127.0.0.1".to_vec()));
        tree.insert("/empty".into(), Entry::File(Vec::new()));

        assert_eq!(decode(&encode(&tree)), Some(tree));
    }

    #[test]
    fn reject_truncated_image() {
        let mut tree = empty();
        tree.insert("/a".into(), Entry::File(b"abc".to_vec()));
        let bytes = encode(&tree);

        assert_eq!(decode(&bytes[..bytes.len() - 1]), None);
        // 没有根目录
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[9, 1, 0, b'/']), None);
    }
}
