//! Content-Disposition parsing for download checks.

/// The parts of a Content-Disposition header that download checks use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition: String,
    parameter: Option<(String, String)>,
}

impl ContentDisposition {
    /// Splits a header on `;`.
    ///
    /// Only the disposition type and the first parameter are kept. The
    /// parameter value is trimmed of spaces and quotes.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut segments = header.split(';');
        let disposition = segments.next().unwrap_or_default().trim().to_string();
        let parameter = segments.next().map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (
                key.trim().to_string(),
                value.trim_matches(|c| matches!(c, ' ' | '"' | '\'')).to_string(),
            )
        });
        Self {
            disposition,
            parameter,
        }
    }

    /// The disposition type, e.g. `attachment` or `inline`.
    #[must_use]
    pub fn disposition(&self) -> &str {
        &self.disposition
    }

    /// Returns true if the response offers a file download.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    /// Name of the first parameter, if any.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        self.parameter.as_ref().map(|(key, _)| key.as_str())
    }

    /// The file name, when the first parameter is `filename`.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match &self.parameter {
            Some((key, value)) if key == "filename" => Some(value.as_str()),
            _ => None,
        }
    }
}
