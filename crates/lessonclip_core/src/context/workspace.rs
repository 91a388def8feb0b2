//! Job-scoped temporary directory.
//!
//! Every intermediate file of a job lives here. Outputs are rendered to a
//! [`TempPath`] inside the workspace and only moved to the caller's path
//! once they pass validation; a dropped `TempPath` deletes its file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir, TempPath};

pub struct JobWorkspace {
    dir: TempDir,
    keep: bool,
}

impl JobWorkspace {
    /// Create `<temp_root>/<job_id>-XXXXXX`.
    pub fn create(temp_root: &Path, job_id: &str, keep: bool) -> io::Result<Self> {
        fs::create_dir_all(temp_root)?;
        let dir = Builder::new()
            .prefix(&format!("{}-", job_id.replace(['/', '\\', ' '], "_")))
            .tempdir_in(temp_root)?;
        Ok(Self { dir, keep })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Reserve a file for tool output; `extension` decides the container.
    pub fn temp_output(&self, label: &str, extension: &str) -> io::Result<TempPath> {
        let file = Builder::new()
            .prefix(&format!("{}-", label))
            .suffix(&format!(".{}", extension))
            .tempfile_in(self.path())?;
        Ok(file.into_temp_path())
    }

    /// Reserve a file with the same extension as `output` (mp4 if none).
    pub fn temp_output_like(&self, label: &str, output: &Path) -> io::Result<TempPath> {
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.temp_output(label, extension)
    }

    /// Write a text file (concat lists, realigned subtitles).
    pub fn temp_text(&self, label: &str, extension: &str, content: &str) -> io::Result<TempPath> {
        let mut file = Builder::new()
            .prefix(&format!("{}-", label))
            .suffix(&format!(".{}", extension))
            .tempfile_in(self.path())?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file.into_temp_path())
    }

    /// Stable path inside the workspace for intermediates kept across steps.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Move a staged file to `dest`, copying when a rename is not possible
    /// (e.g. across filesystems). `dest` is either complete or untouched.
    pub fn promote(&self, staged: TempPath, dest: &Path) -> io::Result<()> {
        let parent = destination_dir(dest);
        fs::create_dir_all(parent)?;
        match staged.persist(dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!("Rename to {} failed ({}), copying", dest.display(), e.error);
                copy_into_place(&e.path, dest)
            }
        }
    }

    /// Move a finished workspace file to `dest` with the same guarantee as
    /// [`promote`](Self::promote).
    pub fn deliver(&self, rendered: &Path, dest: &Path) -> io::Result<()> {
        fs::create_dir_all(destination_dir(dest))?;
        if let Err(e) = fs::rename(rendered, dest) {
            tracing::debug!("Rename to {} failed ({}), copying", dest.display(), e);
            copy_into_place(rendered, dest)?;
        }
        Ok(())
    }

    /// Remove the directory, or leave it in place when `keep_temp` is set.
    pub fn close(self) -> io::Result<PathBuf> {
        if self.keep {
            let path = self.dir.keep();
            tracing::info!("Keeping job workspace {}", path.display());
            Ok(path)
        } else {
            let path = self.dir.path().to_path_buf();
            self.dir.close()?;
            Ok(path)
        }
    }
}

fn destination_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Copy `src` next to `dest` first, then rename over it.
fn copy_into_place(src: &Path, dest: &Path) -> io::Result<()> {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut sibling = Builder::new()
        .prefix(&format!(".{}-", name))
        .suffix(".partial")
        .tempfile_in(destination_dir(dest))?;
    io::copy(&mut fs::File::open(src)?, sibling.as_file_mut())?;
    sibling.as_file().sync_all()?;
    sibling.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_outputs_vanish_unless_promoted() {
        let root = tempdir().unwrap();
        let ws = JobWorkspace::create(root.path(), "job/1", false).unwrap();
        assert!(ws.path().starts_with(root.path()));
        assert!(ws
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("job_1-"));

        let dropped = ws.temp_output("concat", "mp4").unwrap();
        let dropped_path = dropped.to_path_buf();
        assert!(dropped_path.to_string_lossy().ends_with(".mp4"));
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = ws.temp_text("list", "txt", "file 'a.mp4'\n").unwrap();
        let dest = root.path().join("out").join("final.txt");
        ws.promote(kept, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "file 'a.mp4'\n");
    }

    #[test]
    fn temp_output_follows_destination_extension() {
        let root = tempdir().unwrap();
        let ws = JobWorkspace::create(root.path(), "job", false).unwrap();
        let staged = ws.temp_output_like("timeline", Path::new("/out/speech.m4a")).unwrap();
        assert!(staged.to_string_lossy().ends_with(".m4a"));
    }

    #[test]
    fn copy_into_place_replaces_destination_whole() {
        let root = tempdir().unwrap();
        let src = root.path().join("staged.mp4");
        fs::write(&src, b"rendered").unwrap();
        let out = root.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let dest = out.join("final.mp4");
        fs::write(&dest, b"old").unwrap();

        copy_into_place(&src, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"rendered");
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn failed_copy_leaves_destination_untouched() {
        let root = tempdir().unwrap();
        let out = root.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let dest = out.join("final.mp4");

        assert!(copy_into_place(&root.path().join("missing.mp4"), &dest).is_err());
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);

        fs::write(&dest, b"previous").unwrap();
        assert!(copy_into_place(&root.path().join("missing.mp4"), &dest).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"previous");
    }

    #[test]
    fn deliver_moves_workspace_file_out() {
        let root = tempdir().unwrap();
        let ws = JobWorkspace::create(root.path(), "job", false).unwrap();
        let rendered = ws.file("final.mp4");
        fs::write(&rendered, b"rendered").unwrap();
        let dest = root.path().join("out").join("nested").join("expr.mp4");

        ws.deliver(&rendered, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"rendered");
        assert!(!rendered.exists());
        assert!(ws.deliver(&ws.file("missing.mp4"), &dest).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"rendered");
    }

    #[test]
    fn close_removes_or_keeps() {
        let root = tempdir().unwrap();

        let ws = JobWorkspace::create(root.path(), "a", false).unwrap();
        let path = ws.close().unwrap();
        assert!(!path.exists());

        let ws = JobWorkspace::create(root.path(), "b", true).unwrap();
        let path = ws.close().unwrap();
        assert!(path.exists());
    }
}
