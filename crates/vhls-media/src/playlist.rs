//! Playlist rewriting and master manifest assembly.
//!
//! Generated playlists reference segments by nested path; delivery flattens
//! them into query-addressed URLs, so references are rewritten in place
//! after generation: nested paths get their separators percent-encoded and
//! every segment reference gains a delivery query suffix.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use vhls_models::encoding::DELIVERY_SUFFIX;
use vhls_models::Resolution;

use crate::error::MediaResult;

/// Rules applied to each playlist line.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    /// Local path prefix stripped from reference lines before matching;
    /// the encoder writes segment references exactly as it was invoked,
    /// root and all
    pub local_root: Option<String>,
    /// Lines beginning with this prefix get `/` encoded to `%2F`
    pub nested_prefix: String,
    /// Query suffix appended to `.ts` references
    pub delivery_suffix: String,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            local_root: None,
            nested_prefix: "segments/".to_string(),
            delivery_suffix: DELIVERY_SUFFIX.to_string(),
        }
    }
}

impl RewriteRules {
    pub fn new(nested_prefix: impl Into<String>, delivery_suffix: impl Into<String>) -> Self {
        Self {
            local_root: None,
            nested_prefix: nested_prefix.into(),
            delivery_suffix: delivery_suffix.into(),
        }
    }

    /// Strip `root` (with a trailing `/` ensured) from reference lines
    /// before the nested-prefix match, so playlists written under an
    /// artifact root still rewrite to root-free delivery references.
    pub fn with_local_root(mut self, root: impl Into<String>) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        self.local_root = Some(root);
        self
    }
}

/// Apply both rewrite transforms to a single line.
///
/// The suffix append recognizes already-rewritten references, so the
/// rewrite is idempotent (the original substring replace was not, and
/// doubled the suffix on every pass).
pub fn rewrite_line(line: &str, rules: &RewriteRules) -> String {
    let line = match &rules.local_root {
        Some(root) => line.strip_prefix(root.as_str()).unwrap_or(line),
        None => line,
    };

    let line = if line.starts_with(&rules.nested_prefix) {
        line.replace('/', "%2F")
    } else {
        line.to_string()
    };

    append_delivery_suffix(&line, &rules.delivery_suffix)
}

/// Append `suffix` after every `.ts` occurrence not already carrying it.
fn append_delivery_suffix(line: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(line.len() + suffix.len());
    let mut rest = line;

    while let Some(pos) = rest.find(".ts") {
        let end = pos + ".ts".len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];
        if !rest.starts_with(suffix) {
            out.push_str(suffix);
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite a playlist file in place.
///
/// The transformed content goes to a sibling temp file which then atomically
/// replaces the original, so a crash mid-rewrite never leaves a half-written
/// playlist.
pub async fn rewrite_playlist(path: impl AsRef<Path>, rules: &RewriteRules) -> MediaResult<()> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).await?;
    let mut rewritten = String::with_capacity(content.len());
    for line in content.lines() {
        rewritten.push_str(&rewrite_line(line, rules));
        rewritten.push('\n');
    }

    let tmp = sibling_temp_path(path);
    fs::write(&tmp, rewritten).await?;
    fs::rename(&tmp, path).await?;

    Ok(())
}

/// Write the master manifest: a fixed header, then per entry one
/// stream-info line with the nominal bandwidth and resolution token,
/// followed by the playlist reference line (1 + 2K lines for K entries).
///
/// Entries are an ordered sequence; manifest line order is an observable
/// contract and follows the submission order of the resolutions. The file
/// is written to a temp sibling and renamed, then run through the
/// rewriter.
pub async fn write_master_manifest(
    path: impl AsRef<Path>,
    entries: &[(Resolution, String)],
    bandwidth: u64,
    rules: &RewriteRules,
) -> MediaResult<()> {
    let path = path.as_ref();

    let mut manifest = String::from("#EXTM3U\n");
    for (resolution, playlist_ref) in entries {
        manifest.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n",
            bandwidth, resolution
        ));
        manifest.push_str(playlist_ref);
        manifest.push('\n');
    }

    let tmp = sibling_temp_path(path);
    fs::write(&tmp, manifest).await?;
    fs::rename(&tmp, path).await?;

    info!("Master manifest written: {}", path.display());

    rewrite_playlist(path, rules).await
}

/// `<path>.tmp`, guaranteed to live on the same filesystem as `path`.
fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rules() -> RewriteRules {
        RewriteRules::default()
    }

    #[test]
    fn test_rewrite_nested_segment_line() {
        assert_eq!(
            rewrite_line("segments/out_001.ts", &rules()),
            "segments%2Fout_001.ts?alt=media"
        );
    }

    #[test]
    fn test_rewrite_plain_segment_line() {
        assert_eq!(
            rewrite_line("abc_720_0_000.ts", &rules()),
            "abc_720_0_000.ts?alt=media"
        );
    }

    #[test]
    fn test_rewrite_leaves_directives_alone() {
        assert_eq!(rewrite_line("#EXTM3U", &rules()), "#EXTM3U");
        assert_eq!(rewrite_line("#EXTINF:30.000000,", &rules()), "#EXTINF:30.000000,");
    }

    #[test]
    fn test_rewrite_strips_local_root() {
        // the encoder was invoked with a root-qualified prefix, so that is
        // what the playlist lines carry
        let rules = RewriteRules::default().with_local_root("/data");
        assert_eq!(
            rewrite_line("/data/segments/abc/abc_720_0_000.ts", &rules),
            "segments%2Fabc%2Fabc_720_0_000.ts?alt=media"
        );

        let rules = RewriteRules::default().with_local_root(".");
        assert_eq!(
            rewrite_line("./segments/out_001.ts", &rules),
            "segments%2Fout_001.ts?alt=media"
        );
    }

    #[test]
    fn test_rewrite_with_local_root_is_idempotent() {
        let rules = RewriteRules::default().with_local_root("/data");
        let once = rewrite_line("/data/segments/out_001.ts", &rules);
        assert_eq!(rewrite_line(&once, &rules), once);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_line("segments/out_001.ts", &rules());
        let twice = rewrite_line(&once, &rules());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_legacy_substring_replace_doubles_suffix() {
        // Documents the defect the idempotent rewrite replaces: a naive
        // substring replace re-matches ".ts" inside an already-rewritten
        // reference and appends the suffix again.
        let rewritten = "out_001.ts?alt=media";
        let naive = rewritten.replace(".ts", ".ts?alt=media");
        assert_eq!(naive, "out_001.ts?alt=media?alt=media");
        assert_eq!(append_delivery_suffix(rewritten, "?alt=media"), rewritten);
    }

    #[tokio::test]
    async fn test_rewrite_playlist_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.m3u8");
        let content = "#EXTM3U\n#EXT-X-TARGETDURATION:30\n#EXTINF:30.000000,\nout_0_000.ts\n#EXTINF:12.500000,\nout_0_001.ts\n#EXT-X-ENDLIST\n";
        fs::write(&path, content).await.unwrap();

        rewrite_playlist(&path, &rules()).await.unwrap();

        let rewritten = fs::read_to_string(&path).await.unwrap();
        // exactly one suffix per segment reference, line count preserved
        assert_eq!(rewritten.matches("?alt=media").count(), 2);
        assert_eq!(rewritten.lines().count(), content.lines().count());
        assert!(rewritten.contains("out_0_000.ts?alt=media"));

        // second pass must not change the file
        rewrite_playlist(&path, &rules()).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), rewritten);
    }

    #[tokio::test]
    async fn test_master_manifest_line_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.m3u8");
        let entries = vec![
            (Resolution::new(1920, 1080), "segments/abc/abc_1080_.m3u8?alt=media".to_string()),
            (Resolution::new(1280, 720), "segments/abc/abc_720_.m3u8?alt=media".to_string()),
            (Resolution::new(640, 480), "segments/abc/abc_480_.m3u8?alt=media".to_string()),
        ];

        write_master_manifest(&path, &entries, 2_000_000, &rules())
            .await
            .unwrap();

        let manifest = fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * entries.len());
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(
            lines[1],
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1920x1080"
        );
        // nested references flattened, suffix not doubled
        assert_eq!(lines[2], "segments%2Fabc%2Fabc_1080_.m3u8?alt=media");
    }

    #[tokio::test]
    async fn test_master_manifest_preserves_entry_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.m3u8");
        // deliberately not sorted by size
        let entries = vec![
            (Resolution::new(640, 480), "a.m3u8".to_string()),
            (Resolution::new(1920, 1080), "b.m3u8".to_string()),
            (Resolution::new(1280, 720), "c.m3u8".to_string()),
        ];

        write_master_manifest(&path, &entries, 2_000_000, &rules())
            .await
            .unwrap();

        let manifest = fs::read_to_string(&path).await.unwrap();
        let streams: Vec<&str> = manifest
            .lines()
            .filter(|l| l.starts_with("#EXT-X-STREAM-INF"))
            .collect();
        assert!(streams[0].ends_with("RESOLUTION=640x480"));
        assert!(streams[1].ends_with("RESOLUTION=1920x1080"));
        assert!(streams[2].ends_with("RESOLUTION=1280x720"));
    }
}
