use std::path::Path;

use crate::download::segment::Segment;
use crate::error::DownloadError;

pub const MANIFEST_FILE: &str = "_files_to_concat.txt";

/// One `file '<absolute path>'` line per segment, in the order given.
///
/// The order of the lines is the order of the output video, so callers must
/// pass segments sorted by index.
pub fn build_manifest(segments: &[Segment]) -> std::io::Result<String> {
    debug_assert!(segments.windows(2).all(|w| w[0].index < w[1].index));

    let mut manifest = String::new();
    for segment in segments {
        let path = std::path::absolute(&segment.local_path)?;
        manifest.push_str(&format!("file {}\n", quote(&path)));
    }

    Ok(manifest)
}

/// Write the manifest to `destination`, creating parent directories.
pub async fn write_manifest(segments: &[Segment], destination: &Path) -> Result<(), DownloadError> {
    let manifest =
        build_manifest(segments).map_err(|e| DownloadError::filesystem(destination, e))?;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::filesystem(parent, e))?;
    }

    tokio::fs::write(destination, manifest)
        .await
        .map_err(|e| DownloadError::filesystem(destination, e))
}

/// Single-quote a path for the concat demuxer, which has no escape inside
/// quotes: a quote is closed, escaped, and reopened.
fn quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::download::segment::SegmentResolver;
    use std::num::NonZeroU64;
    use std::path::PathBuf;

    fn segments(cache: &Path) -> Vec<Segment> {
        let clip = Clip::from_url("https://clips.pump.fun/coin/ABC?clip=XY:tag_mystery").unwrap();
        SegmentResolver::new("https://clips.pump.fun", cache, "_segments", NonZeroU64::new(2).unwrap())
            .resolve(&clip, 8..=11)
            .unwrap()
    }

    #[test]
    fn lists_absolute_paths_in_index_order() {
        let manifest = build_manifest(&segments(Path::new("cache"))).unwrap();
        let lines = manifest.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        for (line, index) in lines.iter().zip(8..) {
            assert!(line.starts_with("file '"), "{line}");
            assert!(line.ends_with(&format!("seg_{:05}.ts'", index)), "{line}");

            let path = PathBuf::from(&line["file '".len()..line.len() - 1]);
            assert!(path.is_absolute(), "{line}");
        }
        assert!(manifest.ends_with('\n'));
    }

    #[test]
    fn quotes_single_quotes() {
        assert_eq!(quote(Path::new("/tmp/it's.ts")), r"'/tmp/it'\''s.ts'");
    }

    #[test]
    fn empty_input_gives_empty_manifest() {
        assert_eq!(build_manifest(&[]).unwrap(), "");
    }

    #[tokio::test]
    async fn writes_to_nested_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("a").join("b").join(MANIFEST_FILE);
        let segments = segments(dir.path());

        write_manifest(&segments, &destination).await.unwrap();

        let written = std::fs::read_to_string(&destination).unwrap();
        assert_eq!(written, build_manifest(&segments).unwrap());
    }
}
