use anyhow::anyhow;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, info};

use crate::storage::StorageClient;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Virtual root of every stored upload path.
pub const UPLOAD_PREFIX: &str = "uploads";

/// A file part of a submitted form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub body: Bytes,
}

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Lowercased extension if it is one of the allowed image types.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn is_allowed(file_name: &str) -> bool {
    allowed_extension(file_name).is_some()
}

/// ASCII-only filename with no path components, safe to put on disk.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(char::is_ascii).collect();
    let spaced = ascii.replace(|c: char| c == '/' || c == '\\', " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

fn stored_name(file_name: &str, ext: &str) -> String {
    let name = secure_filename(file_name);
    let keeps_ext = name
        .rsplit_once('.')
        .map(|(stem, e)| !stem.is_empty() && e.eq_ignore_ascii_case(ext))
        .unwrap_or(false);
    if keeps_ext {
        name
    } else if name.is_empty() {
        format!("upload.{ext}")
    } else {
        format!("{name}.{ext}")
    }
}

fn object_key(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Storage key behind a stored web path, rejecting anything that is not a
/// plain path below `uploads/`.
pub fn object_key_for(web_path: &str) -> Option<&str> {
    let key = web_path.strip_prefix(UPLOAD_PREFIX)?.strip_prefix('/')?;
    let clean = !key.is_empty() && key.split('/').all(|s| !s.is_empty() && s != "." && s != "..");
    clean.then_some(key)
}

async fn unique_key(
    storage: &dyn StorageClient,
    folder: &str,
    prefix: &str,
    name: &str,
) -> anyhow::Result<String> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut key = object_key(folder, &format!("{prefix}{name}"));
    let mut n = 1;
    while storage.exists(&key).await? {
        key = object_key(folder, &format!("{prefix}{stem}_{n}.{ext}"));
        n += 1;
    }
    Ok(key)
}

/// Stores `file` under `folder` and returns its web path
/// (`uploads/<folder>/<yyyyMMdd_HHmmss>_<name>`), or `None` when the file is
/// not an allowed image.
pub async fn save_upload(
    storage: &dyn StorageClient,
    file: &UploadedFile,
    folder: &str,
) -> anyhow::Result<Option<String>> {
    let Some(ext) = allowed_extension(&file.file_name) else {
        debug!(file_name = %file.file_name, "upload skipped: not an allowed image type");
        return Ok(None);
    };

    let prefix = OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]_[hour][minute][second]_"))?;
    let name = stored_name(&file.file_name, &ext);
    let key = unique_key(storage, folder, &prefix, &name).await?;

    storage.put_object(&key, file.body.clone()).await?;
    info!(%key, bytes = file.body.len(), "upload saved");
    Ok(Some(format!("{UPLOAD_PREFIX}/{key}")))
}

pub async fn delete_upload(storage: &dyn StorageClient, web_path: &str) -> anyhow::Result<()> {
    let key = object_key_for(web_path).ok_or_else(|| anyhow!("not an upload path: {web_path}"))?;
    storage.delete_object(key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            body: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn allow_list_is_case_insensitive_and_uses_last_extension() {
        for ok in ["a.png", "a.JPG", "a.jpeg", "b.tar.gif"] {
            assert!(is_allowed(ok), "{ok}");
        }
        for bad in ["", "png", "a.bmp", "a.png.exe", "a.", "a.svg"] {
            assert!(!is_allowed(bad), "{bad}");
        }
    }

    #[test]
    fn secure_filename_strips_paths_and_unsafe_chars() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\windows\\x.png"), "windows_x.png");
        assert_eq!(secure_filename("i contain cool \u{fc}ml\u{e4}uts.txt"), "i_contain_cool_mluts.txt");
        assert_eq!(secure_filename("a<b>c?.png"), "abc.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn stored_name_keeps_or_restores_the_extension() {
        assert_eq!(stored_name("shot.PNG", "png"), "shot.PNG");
        assert_eq!(stored_name("\u{444}\u{43e}\u{442}\u{43e}.png", "png"), "png.png");
        assert_eq!(stored_name("....gif", "gif"), "gif.gif");
    }

    #[test]
    fn object_key_for_only_accepts_paths_under_uploads() {
        assert_eq!(object_key_for("uploads/projects/a.png"), Some("projects/a.png"));
        assert_eq!(object_key_for("uploads/a.png"), Some("a.png"));
        assert_eq!(object_key_for("uploads/../secret"), None);
        assert_eq!(object_key_for("uploads//a.png"), None);
        assert_eq!(object_key_for("static/a.png"), None);
        assert_eq!(object_key_for("uploadsx/a.png"), None);
        assert_eq!(object_key_for("uploads/"), None);
    }

    #[tokio::test]
    async fn save_upload_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let path = save_upload(&storage, &file("cover image.png"), "projects")
            .await
            .unwrap()
            .expect("png is allowed");

        let name = path.strip_prefix("uploads/projects/").expect("web path under uploads/");
        assert!(!path.contains('\\'));
        // yyyyMMdd_HHmmss_ prefix
        let (stamp, rest) = name.split_at(16);
        assert!(stamp[..8].chars().all(|c| c.is_ascii_digit()), "{stamp}");
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp[9..15].chars().all(|c| c.is_ascii_digit()), "{stamp}");
        assert_eq!(&stamp[15..], "_");
        assert_eq!(rest, "cover_image.png");

        let on_disk = dir.path().join("projects").join(name);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn save_upload_rejects_disallowed_types() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(save_upload(&storage, &file("notes.txt"), "projects")
            .await
            .unwrap()
            .is_none());
        assert!(save_upload(&storage, &file(""), "projects").await.unwrap().is_none());
        assert!(!dir.path().join("projects").exists());
    }

    #[tokio::test]
    async fn same_name_in_the_same_second_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let mut paths = Vec::new();
        for _ in 0..3 {
            paths.push(
                save_upload(&storage, &file("a.png"), "projects")
                    .await
                    .unwrap()
                    .unwrap(),
            );
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 3);
    }

    #[tokio::test]
    async fn delete_upload_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = save_upload(&storage, &file("a.gif"), "projects")
            .await
            .unwrap()
            .unwrap();

        delete_upload(&storage, &path).await.unwrap();
        let key = object_key_for(&path).unwrap();
        assert!(!storage.exists(key).await.unwrap());
        assert!(delete_upload(&storage, "../outside.png").await.is_err());
    }
}
