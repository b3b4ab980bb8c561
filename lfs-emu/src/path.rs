//! 规范路径：以`/`开头，不以`/`结尾，没有空段、`.`与`..`

use alloc::string::String;

use littlefs::config::NAME_MAX;
use littlefs::{LfsError, LfsResult};

pub fn normalize(path: &str) -> LfsResult<String> {
    let mut normalized = String::new();
    for name in path.split('/') {
        match name {
            "" | "." => {}
            ".." => {
                let parent = normalized.rfind('/').unwrap_or(0);
                normalized.truncate(parent);
            }
            name if name.len() > NAME_MAX => return Err(LfsError::NAMETOOLONG),
            name => {
                normalized.push('/');
                normalized.push_str(name);
            }
        }
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    Ok(normalized)
}

/// 根目录的父目录是它自己
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

pub fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize("").unwrap(), "/");
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("a//b/").unwrap(), "/a/b");
        assert_eq!(normalize("/a/./b/../c").unwrap(), "/a/c");
        assert_eq!(normalize("/../a").unwrap(), "/a");
    }

    #[test]
    fn name_too_long() {
        let name = "x".repeat(NAME_MAX + 1);
        assert_eq!(normalize(&name), Err(LfsError::NAMETOOLONG));
        assert!(normalize(&name[1..]).is_ok());
    }

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent("/"), "/");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/a/b"), "/a");
        assert_eq!(basename("/a/b"), "b");
        assert_eq!(basename("/"), "");
    }
}
