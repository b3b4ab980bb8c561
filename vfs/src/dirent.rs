use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    #[default]
    Unknown,
    Block,
    Char,
    Directory,
    Fifo,
    SymLink,
    Regular,
}

/// `readdir`交换的目录项
///
/// 名字存放在定长缓冲区内：超长的名字被截断，且总以NUL结尾。
#[derive(Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ty: DirEntryType,
    name: [u8; DirEntry::NAME_CAP + 1],
}

impl DirEntry {
    pub const NAME_CAP: usize = 255;

    pub fn new(ty: DirEntryType, name: &str) -> Self {
        let mut dirent = Self {
            ty,
            name: [0; Self::NAME_CAP + 1],
        };
        dirent.set_name(name);
        dirent
    }

    /// 复制名字，最多[`DirEntry::NAME_CAP`]字节，返回实际复制的长度
    pub fn set_name(&mut self, name: &str) -> usize {
        let len = name.len().min(Self::NAME_CAP);
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.name[len..].fill(0);
        len
    }

    /// 不含结尾NUL的名字字节
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::NAME_CAP);
        &self.name[..len]
    }

    /// 截断可能切开多字节字符，此时只返回完整的部分
    pub fn name(&self) -> &str {
        let bytes = self.name_bytes();
        match core::str::from_utf8(bytes) {
            Ok(name) => name,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntry")
            .field("ty", &self.ty)
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_truncated_and_terminated() {
        let long = "x".repeat(DirEntry::NAME_CAP + 10);
        let mut dirent = DirEntry::new(DirEntryType::Regular, &long);
        assert_eq!(dirent.name().len(), DirEntry::NAME_CAP);
        assert_eq!(dirent.name[DirEntry::NAME_CAP], 0);

        dirent.set_name("ab");
        assert_eq!(dirent.name(), "ab");
        assert!(dirent.name[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn truncated_multibyte_name() {
        let mut name = "a".repeat(DirEntry::NAME_CAP - 1);
        name.push('é');
        let dirent = DirEntry::new(DirEntryType::Regular, &name);
        assert_eq!(dirent.name_bytes().len(), DirEntry::NAME_CAP);
        assert_eq!(dirent.name(), &name[..DirEntry::NAME_CAP - 1]);
    }
}
