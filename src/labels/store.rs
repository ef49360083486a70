use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::grasp::GraspRect;

use super::{JacquardRecord, LabelError, cornell, cornell_dir, jacquard_path};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Labels(#[from] LabelError),
}

fn io_err<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> StoreError + 'a {
    move |source| StoreError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug)]
struct WrittenGrasp {
    index: usize,
    jacquard_offset: u64,
    cornell_path: PathBuf,
}

/// Label files of one image, open for the duration of that image's session.
///
/// Each appended grasp remembers the aggregate file length before its line was
/// written, so undo truncates back to that offset instead of scanning for the
/// previous newline. Only grasps written through this store can be undone.
#[derive(Debug)]
pub struct ImageLabelStore {
    stem: String,
    cornell_dir: PathBuf,
    jacquard_path: PathBuf,
    jacquard: Option<File>,
    next_index: usize,
    written: Vec<WrittenGrasp>,
}

impl ImageLabelStore {
    /// Creates the image's Cornell folder and opens its aggregate file for appending.
    pub fn open(save_dir: &Path, stem: &str) -> Result<Self, StoreError> {
        let cornell_dir = cornell_dir(save_dir, stem);
        fs::create_dir_all(&cornell_dir).map_err(io_err("create", &cornell_dir))?;

        let jacquard_path = jacquard_path(save_dir, stem);
        let jacquard = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&jacquard_path)
            .map_err(io_err("open", &jacquard_path))?;

        // Continue numbering after earlier sessions instead of overwriting them.
        let next_index = cornell::list_grasp_files(&cornell_dir)?
            .iter()
            .filter_map(|p| p.file_name()?.to_str().and_then(cornell::grasp_index))
            .max()
            .map_or(0, |max| max + 1);

        tracing::debug!(
            stem,
            next_index,
            path = %jacquard_path.display(),
            "opened label store"
        );

        Ok(Self {
            stem: stem.to_string(),
            cornell_dir,
            jacquard_path,
            jacquard: Some(jacquard),
            next_index,
            written: Vec::new(),
        })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn cornell_dir(&self) -> &Path {
        &self.cornell_dir
    }

    pub fn jacquard_path(&self) -> &Path {
        &self.jacquard_path
    }

    /// Index the next appended grasp will get.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Number of grasps written in this session.
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Writes one grasp in both formats and returns its index.
    pub fn append(&mut self, rect: &GraspRect) -> Result<usize, StoreError> {
        let index = self.next_index;
        let cornell_path = self.cornell_dir.join(format!("grasp_{index:03}.txt"));
        let jacquard_path = &self.jacquard_path;

        let file = self.jacquard.as_mut().ok_or_else(|| StoreError::Io {
            action: "append to",
            path: jacquard_path.clone(),
            source: io::Error::other("label store already closed"),
        })?;

        let jacquard_offset = file
            .metadata()
            .map_err(io_err("stat", jacquard_path))?
            .len();
        file.write_all(JacquardRecord::from(rect).to_line().as_bytes())
            .and_then(|()| file.flush())
            .map_err(io_err("write", jacquard_path))?;

        fs::write(&cornell_path, cornell::format_corners(&rect.corners()))
            .map_err(io_err("write", &cornell_path))?;

        self.written.push(WrittenGrasp {
            index,
            jacquard_offset,
            cornell_path,
        });
        self.next_index += 1;
        Ok(index)
    }

    /// Removes the most recent grasp from both formats.
    ///
    /// Returns the removed index, or `None` when nothing was written in this session.
    /// On error the grasp stays recorded so the undo can be retried.
    pub fn undo(&mut self) -> Result<Option<usize>, StoreError> {
        let Some(last) = self.written.last() else {
            return Ok(None);
        };

        match fs::remove_file(&last.cornell_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %last.cornell_path.display(), "cornell file already gone");
            }
            Err(e) => return Err(io_err("remove", &last.cornell_path)(e)),
        }

        if let Some(file) = self.jacquard.as_mut() {
            file.set_len(last.jacquard_offset)
                .and_then(|()| file.flush())
                .map_err(io_err("truncate", &self.jacquard_path))?;
        }

        let index = last.index;
        self.written.pop();
        self.next_index = index;
        Ok(Some(index))
    }

    /// Flushes and releases the aggregate file.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), StoreError> {
        if let Some(mut file) = self.jacquard.take() {
            file.flush().map_err(io_err("flush", &self.jacquard_path))?;
        }
        Ok(())
    }
}

impl Drop for ImageLabelStore {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!("{e}");
        }
    }
}
