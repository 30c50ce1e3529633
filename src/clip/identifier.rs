use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::InputError;

/// A recording on the clip host, addressed by its coin page and clip query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clip {
    collection_id: String,
    clip_id: String,
}

impl Clip {
    #[cfg(test)]
    pub fn new(collection_id: impl Into<String>, clip_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            clip_id: clip_id.into(),
        }
    }

    /// Parse `https://<host>/coin/<collection>?clip=<clip>`.
    ///
    /// The whole URL is percent-decoded first so pasted links that were
    /// encoded once more than needed still resolve.
    pub fn from_url(url: &str) -> Result<Self, InputError> {
        let raw = url.trim();
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| InputError::malformed_identifier(raw, "not valid UTF-8"))?;

        let parsed = Url::parse(&decoded)
            .map_err(|_| InputError::malformed_identifier(raw, "not a URL"))?;

        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| InputError::malformed_identifier(raw, "URL has no path"))?;

        if segments.next() != Some("coin") {
            return Err(InputError::malformed_identifier(raw, "path must start with /coin/"));
        }

        let collection_id = match segments.next() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(InputError::malformed_identifier(raw, "missing coin id")),
        };

        let clip_id = parsed
            .query_pairs()
            .find(|(key, _)| key == "clip")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InputError::malformed_identifier(raw, "missing clip parameter"))?;

        Ok(Self {
            collection_id,
            clip_id,
        })
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    #[cfg(test)]
    pub fn clip_id(&self) -> &str {
        &self.clip_id
    }

    /// Directory name for everything stored about this clip. Colons are not
    /// portable in file names.
    pub fn download_dir_name(&self) -> String {
        self.clip_id.replace(':', "-")
    }

    /// The clip id split once on its first `:`.
    pub fn compound_parts(&self) -> Result<(&str, &str), InputError> {
        self.clip_id
            .split_once(':')
            .ok_or_else(|| InputError::malformed_identifier(&self.clip_id, "clip id has no `:`"))
    }

    /// The token after the first `_` of the second compound part. The remote
    /// host embeds it in every segment file name.
    pub fn remote_tag(&self) -> Result<&str, InputError> {
        let (_, second) = self.compound_parts()?;

        second
            .split_once('_')
            .map(|(_, mystery)| mystery)
            .ok_or_else(|| InputError::malformed_identifier(&self.clip_id, "clip id has no `_` tag"))
    }

    /// Check that segment URLs can be built for this clip.
    pub fn ensure_resolvable(&self) -> Result<(), InputError> {
        self.remote_tag().map(|_| ())
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Clip:{}-{}>", self.collection_id, self.clip_id)
    }
}
