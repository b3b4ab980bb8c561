//! # 仿真引擎
//!
//! 提交的状态是一棵完整的目录树，每次提交都整体写到块2以后，
//! 最后写超级块，修订号交替落在块0与块1。
//! 打开的文件在自己的缓冲区里修改，同步或关闭时才提交。
//!
//! 打开对象按打开的先后登记，[`Storage::mlist`]也按这个顺序给出。

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::{BlockDevice, Geometry};
use enumflags2::BitFlags;
use littlefs::config::FILE_MAX;
use littlefs::{
    Info, LfsError, LfsResult, Node, NodeId, OpenFlag, Storage, Whence, TYPE_DIR, TYPE_REG,
};

use crate::fault::{FaultPoint, Faults};
use crate::image::{self, Entry, Tree};
use crate::superblock::{self, SuperBlock};
use crate::path;

/// 设备的配置块
pub struct EmuConfig {
    pub geometry: Geometry,
    pub device: Arc<dyn BlockDevice>,
    pub faults: Arc<Faults>,
}

impl EmuConfig {
    pub fn new(geometry: Geometry, device: Arc<dyn BlockDevice>) -> Self {
        Self {
            geometry,
            device,
            faults: Arc::new(Faults::new()),
        }
    }
}

impl AsRef<Geometry> for EmuConfig {
    fn as_ref(&self) -> &Geometry {
        &self.geometry
    }
}

/// 打开的文件，`epoch`是打开时的挂载代数
#[derive(Debug)]
pub struct EmuFile {
    id: u64,
    epoch: u64,
}

#[derive(Debug)]
pub struct EmuDir {
    id: u64,
    epoch: u64,
}

#[derive(Default)]
pub struct EmuLfs {
    disk: Option<Disk>,
    /// 每次挂载加一，旧代数的打开对象一律无效
    epoch: u64,
    next_id: u64,
}

struct Disk {
    geometry: Geometry,
    device: Arc<dyn BlockDevice>,
    faults: Arc<Faults>,
    revision: u32,
    tree: Tree,
    opened: Vec<(u64, Opened)>,
}

enum Opened {
    File(FileState),
    Dir(DirState),
}

impl Opened {
    fn ty(&self) -> u8 {
        match self {
            Self::File(_) => TYPE_REG,
            Self::Dir(_) => TYPE_DIR,
        }
    }

    fn path_mut(&mut self) -> &mut String {
        match self {
            Self::File(file) => &mut file.path,
            Self::Dir(dir) => &mut dir.path,
        }
    }
}

struct FileState {
    path: String,
    flags: BitFlags<OpenFlag>,
    pos: u64,
    /// 包含尚未提交的写入
    data: Vec<u8>,
    dirty: bool,
}

struct DirState {
    path: String,
    /// 0与1分别是`.`与`..`
    pos: u64,
}

#[inline]
fn blocks(len: usize, block_size: u32) -> u32 {
    len.div_ceil(block_size as usize) as u32
}

/// 超级块对占2块，每个目录占2块，文件按内容占整块
fn usage(tree: &Tree, block_size: u32) -> u32 {
    2 + tree
        .values()
        .map(|entry| match entry {
            Entry::Dir => 2,
            Entry::File(data) => blocks(data.len(), block_size),
        })
        .sum::<u32>()
}

fn info(path: &str, entry: &Entry) -> Info {
    Info {
        ty: entry.ty(),
        size: match entry {
            Entry::File(data) => data.len() as u32,
            Entry::Dir => 0,
        },
        name: String::from(path::basename(path)),
    }
}

fn dot(name: &str) -> Info {
    Info {
        ty: TYPE_DIR,
        size: 0,
        name: String::from(name),
    }
}

/// 目录的直接子项，按名字排序
fn children<'a>(tree: &'a Tree, dir: &'a str) -> impl Iterator<Item = (&'a String, &'a Entry)> {
    tree.iter()
        .filter(move |(path, _)| path.as_str() != "/" && path::parent(path) == dir)
}

impl Disk {
    fn format(cfg: &EmuConfig) -> LfsResult<()> {
        let geometry = cfg.geometry;
        if (geometry.block_size as usize) < superblock::SIZE || geometry.block_count < 4 {
            return Err(LfsError::INVAL);
        }

        // 旧的超级块可能带着更大的修订号
        let zeros = vec![0; geometry.block_size as usize];
        cfg.device.write_block(0, &zeros);
        cfg.device.write_block(1, &zeros);

        let mut disk = Self {
            geometry,
            device: cfg.device.clone(),
            faults: cfg.faults.clone(),
            revision: 0,
            tree: Tree::new(),
            opened: Vec::new(),
        };
        disk.commit(image::empty())?;
        log::debug!("lfs-emu: formatted {} blocks", geometry.block_count);
        Ok(())
    }

    fn load(cfg: &EmuConfig) -> LfsResult<Self> {
        let geometry = cfg.geometry;
        let block_size = geometry.block_size as usize;
        if block_size < superblock::SIZE || geometry.block_count < 4 {
            return Err(LfsError::INVAL);
        }

        let mut buf = vec![0; block_size];
        let mut newest: Option<SuperBlock> = None;
        for block_id in 0..2 {
            cfg.device.read_block(block_id, &mut buf);
            if let Some(sb) = SuperBlock::decode(&buf) {
                if newest.is_none_or(|newest| sb.revision > newest.revision) {
                    newest = Some(sb);
                }
            }
        }

        let sb = newest.ok_or(LfsError::CORRUPT)?;
        if sb.major() != (superblock::VERSION >> 16) as u16 || !sb.fits(&geometry) {
            return Err(LfsError::INVAL);
        }

        let image_len = sb.image_len as usize;
        let image_blocks = blocks(image_len, geometry.block_size);
        if 2 + image_blocks > geometry.block_count {
            return Err(LfsError::CORRUPT);
        }
        let mut bytes = Vec::with_capacity(image_blocks as usize * block_size);
        for block_id in 2..2 + image_blocks as usize {
            cfg.device.read_block(block_id, &mut buf);
            bytes.extend_from_slice(&buf);
        }
        let tree = image::decode(&bytes[..image_len]).ok_or(LfsError::CORRUPT)?;

        Ok(Self {
            geometry,
            device: cfg.device.clone(),
            faults: cfg.faults.clone(),
            revision: sb.revision,
            tree,
            opened: Vec::new(),
        })
    }

    /// 写入新的目录树，成功后才替换内存中的树
    fn commit(&mut self, tree: Tree) -> LfsResult<()> {
        let block_size = self.geometry.block_size as usize;
        let block_count = self.geometry.block_count;
        let bytes = image::encode(&tree);
        let image_blocks = blocks(bytes.len(), self.geometry.block_size);
        if usage(&tree, self.geometry.block_size) > block_count || 2 + image_blocks > block_count {
            return Err(LfsError::NOSPC);
        }

        let mut buf = vec![0; block_size];
        for (i, chunk) in bytes.chunks(block_size).enumerate() {
            buf[..chunk.len()].copy_from_slice(chunk);
            buf[chunk.len()..].fill(0);
            self.device.write_block(2 + i, &buf);
        }

        let revision = self.revision.wrapping_add(1);
        buf.fill(0);
        SuperBlock::new(&self.geometry, revision, bytes.len() as u32).encode(&mut buf);
        self.device.write_block(revision as usize % 2, &buf);

        log::trace!("lfs-emu: commit rev {revision}, {} bytes", bytes.len());
        self.revision = revision;
        self.tree = tree;
        Ok(())
    }

    fn check_parent(&self, path: &str) -> LfsResult<()> {
        match self.tree.get(path::parent(path)) {
            Some(Entry::Dir) => Ok(()),
            Some(Entry::File(_)) => Err(LfsError::NOTDIR),
            None => Err(LfsError::NOENT),
        }
    }

    /// 把`path`的长度改为`len`后仍放得下
    fn reserve(&self, path: &str, len: u64) -> LfsResult<()> {
        let block_size = self.geometry.block_size;
        let current = match self.tree.get(path) {
            Some(Entry::File(data)) => blocks(data.len(), block_size),
            _ => 0,
        };
        let total = usage(&self.tree, block_size) - current + blocks(len as usize, block_size);
        if total > self.geometry.block_count {
            Err(LfsError::NOSPC)
        } else {
            Ok(())
        }
    }

    fn opened_mut(&mut self, id: u64) -> LfsResult<&mut Opened> {
        self.opened
            .iter_mut()
            .find(|(i, _)| *i == id)
            .map(|(_, opened)| opened)
            .ok_or(LfsError::BADF)
    }

    fn file_mut(&mut self, id: u64) -> LfsResult<&mut FileState> {
        match self.opened_mut(id)? {
            Opened::File(file) => Ok(file),
            Opened::Dir(_) => Err(LfsError::BADF),
        }
    }

    fn dir_mut(&mut self, id: u64) -> LfsResult<&mut DirState> {
        match self.opened_mut(id)? {
            Opened::Dir(dir) => Ok(dir),
            Opened::File(_) => Err(LfsError::BADF),
        }
    }

    fn release(&mut self, id: u64) {
        self.opened.retain(|(i, _)| *i != id);
    }

    fn open_file(&mut self, id: u64, path: &str, flags: BitFlags<OpenFlag>) -> LfsResult<()> {
        let path = path::normalize(path)?;
        if !flags.intersects(OpenFlag::RDWR) {
            return Err(LfsError::INVAL);
        }

        let data = match self.tree.get(&path) {
            Some(Entry::Dir) => return Err(LfsError::ISDIR),
            Some(Entry::File(_)) if flags.contains(OpenFlag::CREAT | OpenFlag::EXCL) => {
                return Err(LfsError::EXIST);
            }
            Some(Entry::File(data)) => data.clone(),
            None if !flags.contains(OpenFlag::CREAT) => return Err(LfsError::NOENT),
            None => {
                self.check_parent(&path)?;
                let mut tree = self.tree.clone();
                tree.insert(path.clone(), Entry::File(Vec::new()));
                self.commit(tree)?;
                Vec::new()
            }
        };

        let dirty = flags.contains(OpenFlag::TRUNC) && !data.is_empty();
        let data = if dirty { Vec::new() } else { data };
        self.opened.push((
            id,
            Opened::File(FileState {
                path,
                flags,
                pos: 0,
                data,
                dirty,
            }),
        ));
        Ok(())
    }

    fn sync_file(&mut self, id: u64) -> LfsResult<()> {
        let file = self.file_mut(id)?;
        let path = file.path.clone();
        if self.faults.fire(&FaultPoint::Sync(path.clone())) {
            return Err(LfsError::IO);
        }

        let file = self.file_mut(id)?;
        if !file.dirty {
            return Ok(());
        }
        let data = file.data.clone();

        // 打开期间被删除的文件不再落盘
        if let Some(Entry::File(_)) = self.tree.get(&path) {
            let mut tree = self.tree.clone();
            tree.insert(path, Entry::File(data));
            self.commit(tree)?;
        }
        self.file_mut(id)?.dirty = false;
        Ok(())
    }

    fn read(&mut self, id: u64, buf: &mut [u8]) -> LfsResult<usize> {
        let file = self.file_mut(id)?;
        if !file.flags.contains(OpenFlag::RDONLY) {
            return Err(LfsError::BADF);
        }

        let len = file.data.len();
        let pos = (file.pos as usize).min(len);
        let n = buf.len().min(len - pos);
        buf[..n].copy_from_slice(&file.data[pos..pos + n]);
        file.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, id: u64, buf: &[u8]) -> LfsResult<usize> {
        let (path, len) = {
            let file = self.file_mut(id)?;
            if !file.flags.contains(OpenFlag::WRONLY) {
                return Err(LfsError::BADF);
            }
            if file.flags.contains(OpenFlag::APPEND) {
                file.pos = file.data.len() as u64;
            }
            let end = file.pos + buf.len() as u64;
            if end > FILE_MAX {
                return Err(LfsError::FBIG);
            }
            (file.path.clone(), end.max(file.data.len() as u64))
        };
        self.reserve(&path, len)?;

        let file = self.file_mut(id)?;
        let pos = file.pos as usize;
        let end = pos + buf.len();
        if file.data.len() < end {
            file.data.resize(end, 0);
        }
        file.data[pos..end].copy_from_slice(buf);
        file.pos = end as u64;
        file.dirty = true;
        Ok(buf.len())
    }

    fn seek(&mut self, id: u64, off: i64, whence: Whence) -> LfsResult<u64> {
        let file = self.file_mut(id)?;
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => file.pos as i64,
            Whence::End => file.data.len() as i64,
        };
        let pos = base
            .checked_add(off)
            .filter(|pos| (0..=FILE_MAX as i64).contains(pos))
            .ok_or(LfsError::INVAL)?;
        file.pos = pos as u64;
        Ok(file.pos)
    }

    fn truncate(&mut self, id: u64, size: u64) -> LfsResult<()> {
        let file = self.file_mut(id)?;
        if !file.flags.contains(OpenFlag::WRONLY) {
            return Err(LfsError::BADF);
        }
        if size > FILE_MAX {
            return Err(LfsError::INVAL);
        }
        let path = file.path.clone();
        self.reserve(&path, size)?;

        let file = self.file_mut(id)?;
        file.data.resize(size as usize, 0);
        file.dirty = true;
        Ok(())
    }

    fn open_dir(&mut self, id: u64, path: &str) -> LfsResult<()> {
        let path = path::normalize(path)?;
        match self.tree.get(&path) {
            Some(Entry::Dir) => {}
            Some(Entry::File(_)) => return Err(LfsError::NOTDIR),
            None => return Err(LfsError::NOENT),
        }
        self.opened.push((id, Opened::Dir(DirState { path, pos: 0 })));
        Ok(())
    }

    fn read_dir(&mut self, id: u64) -> LfsResult<Option<Info>> {
        let dir = self.dir_mut(id)?;
        let (path, pos) = (dir.path.clone(), dir.pos);
        let info = match pos {
            0 => Some(dot(".")),
            1 => Some(dot("..")),
            n => children(&self.tree, &path)
                .nth(n as usize - 2)
                .map(|(path, entry)| info(path, entry)),
        };
        if info.is_some() {
            self.dir_mut(id)?.pos += 1;
        }
        Ok(info)
    }

    fn stat(&self, path: &str) -> LfsResult<Info> {
        let path = path::normalize(path)?;
        match self.tree.get(&path) {
            Some(_) if path == "/" => Ok(dot("/")),
            Some(entry) => Ok(info(&path, entry)),
            None => Err(LfsError::NOENT),
        }
    }

    fn remove(&mut self, path: &str) -> LfsResult<()> {
        let path = path::normalize(path)?;
        if path == "/" {
            return Err(LfsError::INVAL);
        }
        match self.tree.get(&path) {
            None => return Err(LfsError::NOENT),
            Some(Entry::Dir) if children(&self.tree, &path).next().is_some() => {
                return Err(LfsError::NOTEMPTY);
            }
            Some(_) => {}
        }

        let mut tree = self.tree.clone();
        tree.remove(&path);
        self.commit(tree)
    }

    fn mkdir(&mut self, path: &str) -> LfsResult<()> {
        let path = path::normalize(path)?;
        if self.tree.contains_key(&path) {
            return Err(LfsError::EXIST);
        }
        self.check_parent(&path)?;

        let mut tree = self.tree.clone();
        tree.insert(path, Entry::Dir);
        self.commit(tree)
    }

    fn rename(&mut self, old: &str, new: &str) -> LfsResult<()> {
        let old = path::normalize(old)?;
        let new = path::normalize(new)?;
        let entry = self.tree.get(&old).ok_or(LfsError::NOENT)?;
        if old == new {
            return Ok(());
        }
        let prefix = format!("{old}/");
        if old == "/" || new.starts_with(&prefix) {
            return Err(LfsError::INVAL);
        }
        self.check_parent(&new)?;
        match (entry, self.tree.get(&new)) {
            (Entry::Dir, Some(Entry::File(_))) => return Err(LfsError::NOTDIR),
            (Entry::File(_), Some(Entry::Dir)) => return Err(LfsError::ISDIR),
            (Entry::Dir, Some(Entry::Dir)) if children(&self.tree, &new).next().is_some() => {
                return Err(LfsError::NOTEMPTY);
            }
            _ => {}
        }

        let mut tree = self.tree.clone();
        tree.remove(&new);
        let moved: Vec<String> = tree
            .keys()
            .filter(|path| **path == old || path.starts_with(&prefix))
            .cloned()
            .collect();
        for path in moved {
            if let Some(entry) = tree.remove(&path) {
                tree.insert(format!("{new}{}", &path[old.len()..]), entry);
            }
        }
        self.commit(tree)?;

        // 打开的对象跟着改名
        for (_, opened) in &mut self.opened {
            let path = opened.path_mut();
            if *path == old || path.starts_with(&prefix) {
                *path = format!("{new}{}", &path[old.len()..]);
            }
        }
        Ok(())
    }
}

impl EmuLfs {
    fn disk(&mut self) -> LfsResult<&mut Disk> {
        self.disk.as_mut().ok_or(LfsError::INVAL)
    }

    /// 打开对象所属的挂载必须还在
    fn disk_of(&mut self, epoch: u64) -> LfsResult<&mut Disk> {
        if epoch != self.epoch {
            return Err(LfsError::BADF);
        }
        self.disk.as_mut().ok_or(LfsError::BADF)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn is_mounted(&self) -> bool {
        self.disk.is_some()
    }
}

impl Storage for EmuLfs {
    type Config = EmuConfig;
    type File = EmuFile;
    type Dir = EmuDir;

    fn mount(&mut self, cfg: &EmuConfig) -> LfsResult<()> {
        if cfg.faults.fire(&FaultPoint::Mount) {
            return Err(LfsError::IO);
        }
        self.disk = Some(Disk::load(cfg)?);
        self.epoch += 1;
        Ok(())
    }

    fn unmount(&mut self) -> LfsResult<()> {
        let Some(disk) = &self.disk else {
            return Ok(());
        };
        if disk.faults.fire(&FaultPoint::Unmount) {
            return Err(LfsError::IO);
        }
        self.disk = None;
        Ok(())
    }

    fn format(&mut self, cfg: &EmuConfig) -> LfsResult<()> {
        if cfg.faults.fire(&FaultPoint::Format) {
            return Err(LfsError::IO);
        }
        self.disk = None;
        Disk::format(cfg)
    }

    fn file_open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> LfsResult<EmuFile> {
        let id = self.next_id();
        let epoch = self.epoch;
        self.disk()?.open_file(id, path, flags)?;
        Ok(EmuFile { id, epoch })
    }

    fn file_close(&mut self, file: &mut EmuFile) -> LfsResult<()> {
        let disk = self.disk_of(file.epoch)?;
        disk.sync_file(file.id)?;
        disk.release(file.id);
        Ok(())
    }

    fn file_read(&mut self, file: &mut EmuFile, buf: &mut [u8]) -> LfsResult<usize> {
        self.disk_of(file.epoch)?.read(file.id, buf)
    }

    fn file_write(&mut self, file: &mut EmuFile, buf: &[u8]) -> LfsResult<usize> {
        self.disk_of(file.epoch)?.write(file.id, buf)
    }

    fn file_seek(&mut self, file: &mut EmuFile, off: i64, whence: Whence) -> LfsResult<u64> {
        self.disk_of(file.epoch)?.seek(file.id, off, whence)
    }

    fn file_truncate(&mut self, file: &mut EmuFile, size: u64) -> LfsResult<()> {
        self.disk_of(file.epoch)?.truncate(file.id, size)
    }

    fn file_sync(&mut self, file: &mut EmuFile) -> LfsResult<()> {
        self.disk_of(file.epoch)?.sync_file(file.id)
    }

    fn file_size(&mut self, file: &mut EmuFile) -> LfsResult<u64> {
        Ok(self.disk_of(file.epoch)?.file_mut(file.id)?.data.len() as u64)
    }

    fn dir_open(&mut self, path: &str) -> LfsResult<EmuDir> {
        let id = self.next_id();
        let epoch = self.epoch;
        self.disk()?.open_dir(id, path)?;
        Ok(EmuDir { id, epoch })
    }

    fn dir_close(&mut self, dir: &mut EmuDir) -> LfsResult<()> {
        let disk = self.disk_of(dir.epoch)?;
        disk.dir_mut(dir.id)?;
        disk.release(dir.id);
        Ok(())
    }

    fn dir_read(&mut self, dir: &mut EmuDir) -> LfsResult<Option<Info>> {
        self.disk_of(dir.epoch)?.read_dir(dir.id)
    }

    fn dir_rewind(&mut self, dir: &mut EmuDir) -> LfsResult<()> {
        self.dir_seek(dir, 0)
    }

    fn dir_seek(&mut self, dir: &mut EmuDir, off: u64) -> LfsResult<()> {
        self.disk_of(dir.epoch)?.dir_mut(dir.id)?.pos = off;
        Ok(())
    }

    fn dir_tell(&mut self, dir: &mut EmuDir) -> LfsResult<u64> {
        Ok(self.disk_of(dir.epoch)?.dir_mut(dir.id)?.pos)
    }

    fn stat(&mut self, path: &str) -> LfsResult<Info> {
        self.disk()?.stat(path)
    }

    fn fs_size(&mut self) -> LfsResult<u32> {
        let disk = self.disk()?;
        Ok(usage(&disk.tree, disk.geometry.block_size))
    }

    fn remove(&mut self, path: &str) -> LfsResult<()> {
        self.disk()?.remove(path)
    }

    fn mkdir(&mut self, path: &str) -> LfsResult<()> {
        self.disk()?.mkdir(path)
    }

    fn rename(&mut self, old: &str, new: &str) -> LfsResult<()> {
        self.disk()?.rename(old, new)
    }

    fn mlist(&self) -> Vec<Node> {
        self.disk
            .iter()
            .flat_map(|disk| &disk.opened)
            .map(|(id, opened)| Node {
                id: NodeId::from(*id),
                ty: opened.ty(),
            })
            .collect()
    }

    fn node_sync(&mut self, node: NodeId) -> LfsResult<()> {
        self.disk()?.sync_file(node.into())
    }
}
