mod common;

use std::thread;

use common::{Fixture, O_APPEND, O_CREAT, O_EXCL, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY};
use lfs_emu::FaultPoint;
use vfs::{fcntl, mode, whence, Error, FileFlag, FileSystem};

#[test]
fn hello() {
    let fx = Fixture::mounted();
    let mut file = fx.open("/f", O_WRONLY | O_CREAT).unwrap();
    assert_eq!(fx.fs.write(&fx.mnt, &file, b"hello"), Ok(5));
    fx.fs.close(&fx.mnt, &mut file).unwrap();
    assert!(file.ctx.is_none());

    let mut file = fx.open("/f", O_RDONLY).unwrap();
    let mut buf = [0; 16];
    assert_eq!(fx.fs.read(&fx.mnt, &file, &mut buf), Ok(5));
    assert_eq!(&buf[..5], b"hello");
    assert_eq!(fx.fs.read(&fx.mnt, &file, &mut buf), Ok(0));
    fx.fs.close(&fx.mnt, &mut file).unwrap();

    let st = fx.fs.stat(&fx.mnt, "/f").unwrap();
    assert!(st.is_file());
    assert_eq!(st.size, 5);
    assert_eq!(st.mode & 0o777, 0o777);
}

#[test]
fn write_then_read_back() {
    let fx = Fixture::mounted();
    for len in [0, 1, 15, 255, 256, 257, 1000] {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut file = fx.open("/data.bin", O_RDWR | O_CREAT | O_TRUNC).unwrap();
        assert_eq!(fx.fs.write(&fx.mnt, &file, &data), Ok(len));
        assert_eq!(fx.fs.lseek(&fx.mnt, &file, 0, whence::SEEK_SET), Ok(0));

        let mut buf = vec![0; len + 16];
        assert_eq!(fx.fs.read(&fx.mnt, &file, &mut buf), Ok(len));
        assert_eq!(&buf[..len], &data[..]);
        fx.fs.close(&fx.mnt, &mut file).unwrap();

        assert_eq!(fx.get("/data.bin"), data);
    }
}

#[test]
fn fstat_includes_unsynced_writes() {
    let fx = Fixture::mounted();
    let file = fx.open("/f", O_WRONLY | O_CREAT).unwrap();
    fx.fs.write(&fx.mnt, &file, &[7; 40]).unwrap();

    let st = fx.fs.fstat(&fx.mnt, &file).unwrap();
    assert_eq!(st.size, 40);
    assert_eq!(st.mode, mode::S_IFREG | 0o777);
    assert_eq!(fx.size("/f"), 0);

    fx.fs.fsync(&fx.mnt, &file).unwrap();
    assert_eq!(fx.size("/f"), 40);
    fx.fs.write(&fx.mnt, &file, &[7; 2]).unwrap();
    fx.fs.fdatasync(&fx.mnt, &file).unwrap();
    assert_eq!(fx.size("/f"), 42);
}

#[test]
fn lseek_origins() {
    let fx = Fixture::mounted();
    let file = fx.open("/f", O_RDWR | O_CREAT).unwrap();
    fx.fs.write(&fx.mnt, &file, b"0123456789").unwrap();

    assert_eq!(fx.fs.lseek(&fx.mnt, &file, 2, whence::SEEK_SET), Ok(2));
    assert_eq!(fx.fs.lseek(&fx.mnt, &file, 3, whence::SEEK_CUR), Ok(5));
    assert_eq!(fx.fs.lseek(&fx.mnt, &file, -1, whence::SEEK_END), Ok(9));
    assert_eq!(fx.fs.lseek(&fx.mnt, &file, -20, whence::SEEK_END), Err(Error::InvalidArgument));

    // 无法识别的起点不会移动位置
    assert_eq!(fx.fs.lseek(&fx.mnt, &file, 0, 3), Err(Error::InvalidArgument));
    assert_eq!(fx.fs.lseek(&fx.mnt, &file, 0, whence::SEEK_CUR), Ok(9));
}

#[test]
fn append_mode() {
    let fx = Fixture::mounted();
    fx.put("/log", b"one ");
    let mut file = fx.open("/log", O_WRONLY | O_APPEND).unwrap();
    fx.fs.lseek(&fx.mnt, &file, 0, whence::SEEK_SET).unwrap();
    fx.fs.write(&fx.mnt, &file, b"two").unwrap();
    fx.fs.close(&fx.mnt, &mut file).unwrap();
    assert_eq!(fx.get("/log"), b"one two");
}

#[test]
fn open_errors() {
    let fx = Fixture::mounted();
    fx.fs.mkdir(&fx.mnt, "/dir", 0o755).unwrap();
    fx.put("/f", b"");

    assert_eq!(fx.open("/missing", O_RDONLY).err(), Some(Error::NotFound));
    assert_eq!(fx.open("/dir", O_RDONLY).err(), Some(Error::IsADirectory));
    assert_eq!(fx.open("/f", O_WRONLY | O_CREAT | O_EXCL).err(), Some(Error::AlreadyExists));
    assert_eq!(fx.open("/f/g", O_WRONLY | O_CREAT).err(), Some(Error::NotADirectory));

    let long = format!("/{}", "n".repeat(littlefs::config::NAME_MAX + 1));
    assert_eq!(fx.open(&long, O_WRONLY | O_CREAT).err(), Some(Error::NameTooLong));
}

#[test]
fn access_mode_is_enforced() {
    let fx = Fixture::mounted();
    fx.put("/f", b"abc");

    let file = fx.open("/f", O_RDONLY).unwrap();
    assert_eq!(fx.fs.write(&fx.mnt, &file, b"x"), Err(Error::BadFileDescriptor));
    assert_eq!(fx.fs.ftruncate(&fx.mnt, &file, 0), Err(Error::BadFileDescriptor));

    let file = fx.open("/f", O_WRONLY).unwrap();
    let mut buf = [0; 3];
    assert_eq!(fx.fs.read(&fx.mnt, &file, &mut buf), Err(Error::BadFileDescriptor));
}

#[test]
fn failed_close_keeps_handle() {
    let fx = Fixture::mounted();
    let mut file = fx.open("/f", O_WRONLY | O_CREAT).unwrap();
    fx.fs.write(&fx.mnt, &file, b"abc").unwrap();

    fx.arm(FaultPoint::Sync("/f".into()));
    assert_eq!(fx.fs.close(&fx.mnt, &mut file), Err(Error::Io));
    assert!(file.ctx.is_some());

    // 句柄仍然可用，可以重试
    fx.fs.write(&fx.mnt, &file, b"d").unwrap();
    fx.fs.close(&fx.mnt, &mut file).unwrap();
    assert!(file.ctx.is_none());
    assert_eq!(fx.get("/f"), b"abcd");

    assert_eq!(fx.fs.close(&fx.mnt, &mut file), Err(Error::BadFileDescriptor));
}

#[test]
fn stale_token_after_close() {
    let fx = Fixture::mounted();
    let mut file = fx.open("/f", O_WRONLY | O_CREAT).unwrap();
    let stale = file.ctx;
    fx.fs.close(&fx.mnt, &mut file).unwrap();

    // 新句柄复用了同一个槽位
    let other = fx.open("/f", O_WRONLY).unwrap();
    assert_ne!(other.ctx, stale);
    file.ctx = stale;
    assert_eq!(fx.fs.write(&fx.mnt, &file, b"x"), Err(Error::BadFileDescriptor));
}

#[test]
fn truncate_by_path() {
    let fx = Fixture::mounted();
    fx.put("/f", b"0123456789");

    fx.fs.truncate(&fx.mnt, "/f", 3).unwrap();
    assert_eq!(fx.get("/f"), b"012");
    fx.fs.truncate(&fx.mnt, "/f", 5).unwrap();
    assert_eq!(fx.get("/f"), b"012\0\0");

    assert_eq!(fx.fs.truncate(&fx.mnt, "/nope", 0), Err(Error::NotFound));
    assert_eq!(
        fx.fs.truncate(&fx.mnt, "/f", littlefs::config::FILE_MAX + 1),
        Err(Error::InvalidArgument)
    );
    assert_eq!(fx.size("/f"), 5);
}

#[test]
fn ftruncate_shrinks_and_grows() {
    let fx = Fixture::mounted();
    let mut file = fx.open("/f", O_RDWR | O_CREAT).unwrap();
    fx.fs.write(&fx.mnt, &file, b"abcdef").unwrap();
    fx.fs.ftruncate(&fx.mnt, &file, 2).unwrap();
    assert_eq!(fx.fs.fstat(&fx.mnt, &file).unwrap().size, 2);
    fx.fs.ftruncate(&fx.mnt, &file, 4).unwrap();
    fx.fs.close(&fx.mnt, &mut file).unwrap();
    assert_eq!(fx.get("/f"), b"ab\0\0");
}

#[test]
fn capacity_limits() {
    let fx = Fixture::mounted();
    let file = fx.open("/big", O_WRONLY | O_CREAT).unwrap();
    let offset = littlefs::config::FILE_MAX as i64;
    fx.fs.lseek(&fx.mnt, &file, offset, whence::SEEK_SET).unwrap();
    assert_eq!(fx.fs.write(&fx.mnt, &file, b"x"), Err(Error::FileTooLarge));

    fx.fs.lseek(&fx.mnt, &file, 0, whence::SEEK_SET).unwrap();
    let block = [0; 256];
    let err = loop {
        if let Err(err) = fx.fs.write(&fx.mnt, &file, &block) {
            break err;
        }
    };
    assert_eq!(err, Error::NoSpace);
    assert_eq!(err.errno(), 28);
}

#[test]
fn concurrent_writes_serialize() {
    let fx = Fixture::mounted();
    let mut file = fx.open("/shared", O_WRONLY | O_CREAT).unwrap();
    let a = [b'a'; 300];
    let b = [b'b'; 300];

    thread::scope(|s| {
        s.spawn(|| fx.fs.write(&fx.mnt, &file, &a).unwrap());
        s.spawn(|| fx.fs.write(&fx.mnt, &file, &b).unwrap());
    });
    fx.fs.close(&fx.mnt, &mut file).unwrap();

    let data = fx.get("/shared");
    let ab = [&a[..], &b[..]].concat();
    let ba = [&b[..], &a[..]].concat();
    assert!(data == ab || data == ba);
}

#[test]
fn mount_wide_sync_stops_at_first_failure() {
    let fx = Fixture::mounted();
    let first = fx.open("/1", O_WRONLY | O_CREAT).unwrap();
    let dir = fx.opendir("/").unwrap();
    let second = fx.open("/2", O_WRONLY | O_CREAT).unwrap();
    let third = fx.open("/3", O_WRONLY | O_CREAT).unwrap();
    for file in [&first, &second, &third] {
        fx.fs.write(&fx.mnt, file, b"x").unwrap();
    }

    fx.arm(FaultPoint::Sync("/2".into()));
    assert_eq!(fx.fs.sync(&fx.mnt), Err(Error::Io));
    assert_eq!(fx.size("/1"), 1);
    assert_eq!(fx.size("/2"), 0);
    assert_eq!(fx.size("/3"), 0);

    fx.fs.sync(&fx.mnt).unwrap();
    assert_eq!((fx.size("/2"), fx.size("/3")), (1, 1));
    assert!(dir.ctx.is_some());
}

#[test]
fn file_status_flags() {
    let fx = Fixture::mounted();
    fx.put("/f", b"");
    let mut file = fx.open("/f", O_RDONLY).unwrap();
    let read = FileFlag::READ as u32;
    let write = FileFlag::WRITE as u32;

    assert_eq!(fx.fs.fcntl(&fx.mnt, &mut file, fcntl::F_GETFL, 0), Ok(read));
    assert_eq!(
        fx.fs.fcntl(&fx.mnt, &mut file, fcntl::F_SETFL, read | write),
        Err(Error::PermissionDenied)
    );
    let nonblock = read | FileFlag::NONBLOCK as u32;
    assert_eq!(fx.fs.fcntl(&fx.mnt, &mut file, fcntl::F_SETFL, nonblock), Ok(0));
    assert_eq!(fx.fs.fcntl(&fx.mnt, &mut file, fcntl::F_GETFL, 0), Ok(nonblock));
    assert_eq!(
        fx.fs.fcntl(&fx.mnt, &mut file, 99, 0),
        Err(Error::InvalidArgument)
    );

    assert!(!fx.fs.isatty(&fx.mnt, &file));
    assert_eq!(fx.fs.ioctl(&fx.mnt, &file, 0, 0), Err(Error::Unsupported));
    assert_eq!(fx.fs.poll(&fx.mnt, &file), Err(Error::Unsupported));
}
