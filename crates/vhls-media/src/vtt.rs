//! WebVTT chapter/subtitle file writing.

use std::path::Path;
use tokio::fs;

use vhls_models::Chapter;

use crate::error::MediaResult;

/// Write chapters as a WebVTT file: `WEBVTT` header, blank line, then one
/// `<start> --> <end>` cue block per chapter.
pub async fn write_vtt(chapters: &[Chapter], path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut content = String::from("WEBVTT\n\n");
    for chapter in chapters {
        content.push_str(&format!(
            "{} --> {}\n{}\n\n",
            chapter.start, chapter.end, chapter.text
        ));
    }

    fs::write(path, content).await?;
    Ok(())
}
