use crate::domain::delivery::MessagePart;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SegmenterError {
    #[error("Maximum part length must be positive")]
    ZeroLength,
    #[error("Maximum part length {0} exceeds the transport limit of {1}")]
    AboveTransportLimit(usize, usize),
    #[error("Newline threshold must be between 1 and 100 percent, got {0}")]
    InvalidThreshold(u8),
}

/// Splits oversized text into parts that fit the transport, preferring to cut on a newline.
///
/// Lengths are measured in UTF-16 code units, the unit Telegram counts its message limit in,
/// so a character outside the Basic Multilingual Plane costs two. Every cut still lands on
/// a `char` boundary: the parts are valid UTF-8 and concatenate back to the input byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    max_length: usize,
    newline_threshold_percent: u8,
}

impl Segmenter {
    /// Creates a segmenter for parts of at most `max_length` UTF-16 code units.
    ///
    /// A newline is used as the cut point only when the part ending there is longer
    /// than `newline_threshold_percent` of `max_length`.
    ///
    /// # Errors
    /// Returns `SegmenterError` if `max_length` is zero or above `transport_limit`, or the
    /// threshold is outside `1..=100`.
    pub const fn new(
        max_length: usize,
        newline_threshold_percent: u8,
        transport_limit: usize,
    ) -> Result<Self, SegmenterError> {
        if max_length == 0 {
            return Err(SegmenterError::ZeroLength);
        }
        if max_length > transport_limit {
            return Err(SegmenterError::AboveTransportLimit(max_length, transport_limit));
        }
        if newline_threshold_percent == 0 || newline_threshold_percent > 100 {
            return Err(SegmenterError::InvalidThreshold(newline_threshold_percent));
        }
        Ok(Self { max_length, newline_threshold_percent })
    }

    /// Splits `message` into ordered parts. An empty message yields no parts.
    #[must_use]
    pub fn segment<'a>(&self, message: &'a str) -> Vec<MessagePart<'a>> {
        let texts = self.split(message);
        let total = texts.len();
        texts.into_iter().enumerate().map(|(i, text)| MessagePart { index: i + 1, total, text }).collect()
    }

    fn split<'a>(&self, message: &'a str) -> Vec<&'a str> {
        if message.is_empty() {
            return Vec::new();
        }

        // Per char boundary: its byte offset and the UTF-16 length of everything before it.
        let mut offsets = Vec::with_capacity(message.len() + 1);
        let mut units = Vec::with_capacity(message.len() + 1);
        let mut total_units = 0;
        for (offset, ch) in message.char_indices() {
            offsets.push(offset);
            units.push(total_units);
            total_units += ch.len_utf16();
        }
        offsets.push(message.len());
        units.push(total_units);
        let len = offsets.len() - 1;

        if total_units <= self.max_length {
            return vec![message];
        }

        let bytes = message.as_bytes();
        let mut parts = Vec::with_capacity(total_units / self.max_length + 1);
        let mut start = 0;

        while start < len {
            let end = if total_units - units[start] <= self.max_length {
                len
            } else {
                let hard_end = self.hard_end(&units, start);
                self.newline_break(bytes, &offsets, &units, start, hard_end).unwrap_or(hard_end)
            };
            debug_assert!(end > start);

            parts.push(&message[offsets[start]..offsets[end]]);
            start = end;
        }

        parts
    }

    /// Furthest boundary whose part from `start` fits the budget. A lone surrogate pair
    /// wider than a one-unit budget still advances by one char.
    fn hard_end(&self, units: &[usize], start: usize) -> usize {
        let fitting = units[start..].partition_point(|&u| u - units[start] <= self.max_length);
        (start + fitting - 1).max(start + 1)
    }

    /// Finds the nearest newline at or before `hard_end` that still keeps the part above
    /// the threshold. The cut goes before the newline, so it opens the next part.
    fn newline_break(
        &self,
        bytes: &[u8],
        offsets: &[usize],
        units: &[usize],
        start: usize,
        hard_end: usize,
    ) -> Option<usize> {
        let threshold = self.max_length * usize::from(self.newline_threshold_percent);
        (start + 1..=hard_end)
            .rev()
            .take_while(|&p| (units[p] - units[start]) * 100 > threshold)
            .find(|&p| bytes[offsets[p]] == b'\n')
    }
}
